//! Connection handling: buffered stream and per-client session.

mod session;
mod stream;

pub use session::Session;
pub use stream::SmtpStream;
