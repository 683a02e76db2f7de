/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the library
#[derive(Debug)]
pub enum Error {
    /// A field was declared with a request source outside `args|form|json|path`
    InvalidSource(String),
    /// A request value failed field resolution; the message names the field
    Validation(String),
    /// A schema declares a field kind that has no Swagger counterpart
    UnsupportedField(String),
    /// The structured fragment embedded in a docstring is malformed
    Fragment(String),
    IoError(std::io::Error),
    SerializationError(String),
}

impl Error {
    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Error::Validation(message.into())
    }

    /// Whether this error was raised while resolving request fields
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::InvalidSource(source) => write!(f, "request source {} is not valid", source),
            Error::Validation(msg) => write!(f, "{}", msg),
            Error::UnsupportedField(field) => write!(f, "type for {} is not supported", field),
            Error::Fragment(msg) => write!(f, "文档片段错误: {}", msg),
            Error::IoError(e) => write!(f, "IO 错误: {}", e),
            Error::SerializationError(msg) => write!(f, "序列化错误: {}", msg),
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

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(format!("JSON 序列化错误: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::SerializationError(format!("YAML 序列化错误: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            Error::InvalidSource("cookies".to_string()).to_string(),
            "request source cookies is not valid"
        );
        assert_eq!(
            Error::validation("FIELD page is required").to_string(),
            "FIELD page is required"
        );
        assert_eq!(
            Error::UnsupportedField("Url(avatar)".to_string()).to_string(),
            "type for Url(avatar) is not supported"
        );
    }

    #[test]
    fn test_is_validation() {
        assert!(Error::validation("x").is_validation());
        assert!(!Error::Fragment("x".to_string()).is_validation());
    }
}
