//! Custom error types for mytv.
//!
//! Every fallible operation in the crate returns [`Result`], so fetch failures,
//! malformed payloads and player problems all surface through one enum.

use std::error::Error;
use std::fmt;
use std::io;

/// Application error types.
#[derive(Debug)]
pub enum AppError {
    /// Transport-level failures (connection refused, timeouts, ...)
    Network(String),
    /// The server answered with a non-success status
    Http { status: u16, url: String },
    /// Response or playlist parsing errors
    Parse(String),
    /// Configuration errors
    Config(String),
    /// File and process I/O errors
    Io(io::Error),
    /// Invalid input from the user or the location
    InvalidInput(String),
    /// Player not found or failed to start
    Player(String),
    /// No playback path exists in this runtime
    Unsupported(String),
}

impl AppError {
    /// True for errors the HLS retry policy may try again.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Network(_) => true,
            AppError::Http { status, .. } => *status >= 500 || *status == 404,
            _ => false,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Network(msg) => write!(f, "Network error: {}", msg),
            AppError::Http { status, url } => write!(f, "HTTP error {} for {}", status, url),
            AppError::Parse(msg) => write!(f, "Parse error: {}", msg),
            AppError::Config(msg) => write!(f, "Config error: {}", msg),
            AppError::Io(err) => write!(f, "I/O error: {}", err),
            AppError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AppError::Player(msg) => write!(f, "Player error: {}", msg),
            AppError::Unsupported(msg) => write!(f, "Unsupported: {}", msg),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Io(err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        match (err.status(), err.url()) {
            (Some(status), Some(url)) => AppError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            },
            _ if err.is_decode() => AppError::Parse(err.to_string()),
            _ => AppError::Network(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Parse(err.to_string())
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for AppError {
    fn from(err: toml::ser::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AppError::Network("connection refused".to_string());
        assert_eq!(err.to_string(), "Network error: connection refused");
    }

    #[test]
    fn test_http_error_display() {
        let err = AppError::Http {
            status: 500,
            url: "http://localhost:8080/catalog".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "HTTP error 500 for http://localhost:8080/catalog"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
        assert!(app_err.source().is_some());
    }

    #[test]
    fn test_retryable_classification() {
        assert!(AppError::Network("reset".into()).is_retryable());
        assert!(
            AppError::Http {
                status: 503,
                url: String::new()
            }
            .is_retryable()
        );
        assert!(
            !AppError::Http {
                status: 403,
                url: String::new()
            }
            .is_retryable()
        );
        assert!(!AppError::Parse("bad".into()).is_retryable());
    }

    #[test]
    fn test_url_parse_error_is_invalid_input() {
        let err: AppError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
