use thiserror::Error;

/// bizdash error types
#[derive(Error, Debug)]
pub enum BizdashError {
    /// Failed to parse JSON or a CLI value
    #[error("parse error: {0}")]
    Parse(String),

    /// File I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Cache operation failed
    #[error("cache error: {0}")]
    Cache(String),

    /// Network fetch failed
    #[error("network error: {0}")]
    Network(String),

    /// Configuration error
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
}

/// Result type alias for bizdash
pub type Result<T> = std::result::Result<T, BizdashError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BizdashError::Parse("invalid json".into());
        assert_eq!(err.to_string(), "parse error: invalid json");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: BizdashError = io_err.into();
        assert!(err.to_string().contains("io error"));
    }

    #[test]
    fn test_network_error_display() {
        let err = BizdashError::Network("connection refused".into());
        assert_eq!(err.to_string(), "network error: connection refused");
    }
}
