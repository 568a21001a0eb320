//! Low-level SMTP stream handling.

use crate::error::{Error, Result};
use crate::types::Reply;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Read size used when skipping the rest of an oversized line.
const SKIP_CHUNK: usize = 8192;

/// Buffered SMTP stream over any async transport.
#[derive(Debug)]
pub struct SmtpStream<S> {
    reader: BufReader<S>,
    max_line_length: usize,
}

impl<S> SmtpStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps a transport, limiting command lines to `max_line_length` bytes
    /// including the line ending.
    #[must_use]
    pub fn new(stream: S, max_line_length: usize) -> Self {
        Self {
            reader: BufReader::new(stream),
            max_line_length,
        }
    }

    /// Reads a command line without its line ending.
    ///
    /// Returns `None` when the peer has closed the connection. Invalid UTF-8
    /// is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LineTooLong`] after discarding the rest of an
    /// oversized line, or an I/O error.
    pub async fn read_line(&mut self) -> Result<Option<String>> {
        let limit = self.max_line_length;
        let mut buf = Vec::new();
        let n = self.read_chunk(&mut buf, limit).await?;
        if n == 0 {
            return Ok(None);
        }

        if n == limit && !buf.ends_with(b"\n") {
            self.skip_line().await?;
            return Err(Error::LineTooLong(limit));
        }

        Ok(Some(String::from_utf8_lossy(trim_line_ending(&buf)).into_owned()))
    }

    /// Appends bytes up to and including the next LF, reading at most
    /// `limit` bytes.
    ///
    /// Returns the number of bytes read; 0 means end of stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub async fn read_chunk(&mut self, buf: &mut Vec<u8>, limit: usize) -> Result<usize> {
        let limit = u64::try_from(limit).unwrap_or(u64::MAX);
        let n = (&mut self.reader).take(limit).read_until(b'\n', buf).await?;
        Ok(n)
    }

    /// Writes a reply and flushes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn write_reply(&mut self, reply: &Reply) -> Result<()> {
        self.write_all(reply.to_string().as_bytes()).await
    }

    /// Writes data to the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let writer = self.reader.get_mut();
        writer.write_all(data).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Returns the underlying transport.
    pub fn into_inner(self) -> S {
        self.reader.into_inner()
    }

    async fn skip_line(&mut self) -> Result<()> {
        let mut scratch = Vec::with_capacity(SKIP_CHUNK);
        loop {
            scratch.clear();
            let n = self.read_chunk(&mut scratch, SKIP_CHUNK).await?;
            if n == 0 || scratch.ends_with(b"\n") {
                return Ok(());
            }
        }
    }
}

/// Strips a trailing CRLF or bare LF.
pub(crate) fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
