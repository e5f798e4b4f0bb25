//! Error handling for the iqprep library
//!
//! The signal path itself never fails: an incomplete block pair is skipped and
//! a weak spectrum simply withholds a verdict. Errors only come from the layers
//! around it, such as threshold validation and sample stream I/O.

use std::io;

use thiserror::Error;

/// A specialized Result type for iqprep operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for iqprep operations
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (file operations, pipes, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid detector configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed sample stream
    #[error("Format error: {0}")]
    Format(String),
}

impl Error {
    /// Create a configuration error with a custom message
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Create a format error with a custom message
    pub fn format<S: Into<String>>(msg: S) -> Self {
        Error::Format(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("I/O error"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_config_error_constructor() {
        let err = Error::config("guard width out of range");
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(
            err.to_string(),
            "Configuration error: guard width out of range"
        );
    }

    #[test]
    fn test_format_error_constructor() {
        let err = Error::format("partial frame");
        assert!(matches!(err, Error::Format(_)));
        assert!(err.to_string().contains("Format error"));
        assert!(err.source().is_none());
    }
}
