use std::path::PathBuf;

/// Result type alias for the discovery and loading stages
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the application
#[derive(Debug)]
pub enum Error {
    IoError(std::io::Error),
    PatternError { pattern: String, message: String },
    ParseError { file: PathBuf, message: String },
    InvalidArgument(String),
    SerializationError(String),
}

impl Error {
    /// Attach the offending file to a parse failure
    pub fn parse(file: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        Error::ParseError {
            file: file.into(),
            message: message.to_string(),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::IoError(e) => write!(f, "IO error: {}", e),
            Error::PatternError { pattern, message } => {
                write!(f, "invalid pattern '{}': {}", pattern, message)
            }
            Error::ParseError { file, message } => {
                write!(f, "failed to parse {}: {}", file.display(), message)
            }
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            Error::SerializationError(msg) => write!(f, "serialization error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        let message = err.to_string();
        match err.into_io_error() {
            Some(io) => Error::IoError(io),
            None => Error::IoError(std::io::Error::new(std::io::ErrorKind::Other, message)),
        }
    }
}

impl From<globset::Error> for Error {
    fn from(err: globset::Error) -> Self {
        Error::PatternError {
            pattern: err.glob().unwrap_or("<unknown>").to_string(),
            message: err.kind().to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::SerializationError(format!("YAML error: {}", err))
    }
}

impl From<syn::Error> for Error {
    fn from(err: syn::Error) -> Self {
        Error::ParseError {
            file: PathBuf::from("<unknown>"),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_pattern_error() {
        let err = Error::PatternError {
            pattern: "src/[".to_string(),
            message: "unclosed character class".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid pattern 'src/[': unclosed character class"
        );
    }

    #[test]
    fn test_parse_helper_keeps_file() {
        let err = Error::parse("schemas/pet.yaml", "bad indentation");
        match err {
            Error::ParseError { file, message } => {
                assert_eq!(file, PathBuf::from("schemas/pet.yaml"));
                assert_eq!(message, "bad indentation");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_io_error_has_source() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(std::error::Error::source(&err).is_some());
    }
}
