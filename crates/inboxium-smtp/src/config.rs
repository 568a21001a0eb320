//! Server configuration types.

use std::time::Duration;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 8025;

/// Default maximum message size (32 MiB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 32 * 1024 * 1024;

/// Default maximum command line length, CRLF included.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 1000;

/// Default idle timeout (5 minutes).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Smallest command line length RFC 5321 requires a server to accept.
pub const MIN_LINE_LENGTH: usize = 512;

/// SMTP receiver configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Name announced in the greeting and EHLO response.
    pub hostname: String,
    /// Address to bind (IP or resolvable host name).
    pub address: String,
    /// Port to bind.
    pub port: u16,
    /// Largest accepted message, in bytes.
    pub max_message_size: usize,
    /// Longest accepted command line, in bytes.
    pub max_line_length: usize,
    /// Idle time allowed between client lines.
    pub timeout: Duration,
}

impl ServerConfig {
    /// Creates a configuration listening on `address` with default limits.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self::builder(address).build()
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(address: impl Into<String>) -> ServerConfigBuilder {
        ServerConfigBuilder::new(address)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new("127.0.0.1")
    }
}

/// Builder for server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfigBuilder {
    hostname: String,
    address: String,
    port: u16,
    max_message_size: usize,
    max_line_length: usize,
    timeout: Duration,
}

impl ServerConfigBuilder {
    /// Creates a new builder for the given bind address.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            hostname: "localhost".to_string(),
            address: address.into(),
            port: DEFAULT_PORT,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the announced hostname.
    #[must_use]
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    /// Sets the port. Port 0 picks a free port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the maximum message size.
    #[must_use]
    pub const fn max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Sets the maximum command line length.
    ///
    /// Values below 512 are raised to 512.
    #[must_use]
    pub const fn max_line_length(mut self, length: usize) -> Self {
        self.max_line_length = length;
        self
    }

    /// Sets the idle timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> ServerConfig {
        ServerConfig {
            hostname: self.hostname,
            address: self.address,
            port: self.port,
            max_message_size: self.max_message_size,
            max_line_length: self.max_line_length.max(MIN_LINE_LENGTH),
            timeout: self.timeout,
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_config_new() {
        let config = ServerConfig::new("0.0.0.0");
        assert_eq!(config.address, "0.0.0.0");
        assert_eq!(config.port, 8025);
        assert_eq!(config.hostname, "localhost");
        assert_eq!(config.max_message_size, 33_554_432);
        assert_eq!(config.max_line_length, 1000);
        assert_eq!(config.timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_config_builder() {
        let config = ServerConfig::builder("127.0.0.1")
            .hostname("mx.example.com")
            .port(2525)
            .max_message_size(1024)
            .timeout(Duration::from_secs(5))
            .build();

        assert_eq!(config.hostname, "mx.example.com");
        assert_eq!(config.port, 2525);
        assert_eq!(config.max_message_size, 1024);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_line_length_floor() {
        let config = ServerConfig::builder("127.0.0.1").max_line_length(10).build();
        assert_eq!(config.max_line_length, MIN_LINE_LENGTH);
    }

    #[test]
    fn test_default() {
        let config = ServerConfig::default();
        assert_eq!(config.address, "127.0.0.1");
    }
}
