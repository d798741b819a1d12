use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageError {
    #[error("Page not found: {path}")]
    NotFound { path: String },

    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("Layout pairing error: {message}")]
    LayoutPairing { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}': {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

impl PageError {
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    /// HTTP status code this error maps to at the server boundary.
    pub fn http_status(&self) -> u16 {
        match self {
            PageError::NotFound { .. } => 404,
            PageError::PermissionDenied { .. } => 403,
            PageError::LayoutPairing { .. } => 409,
            PageError::ValidationError { .. } | PageError::InvalidConfigValueError { .. } => 422,
            PageError::SerializationError(_) => 400,
            PageError::IoError(_) | PageError::TomlError(_) | PageError::ConfigError { .. } => 500,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            PageError::NotFound { path } => format!("No page lives at '{}'", path),
            PageError::PermissionDenied { message } => message.clone(),
            PageError::LayoutPairing { message } => {
                format!("The layout is not paired with exactly one page: {}", message)
            }
            PageError::IoError(e) => format!("Could not read a file: {}", e),
            PageError::TomlError(e) => format!("The configuration file is not valid TOML: {}", e),
            PageError::SerializationError(e) => format!("Malformed JSON: {}", e),
            PageError::ConfigError { message } => format!("Configuration problem: {}", message),
            PageError::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            PageError::ValidationError { message } => message.clone(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(PageError::not_found("about/team").http_status(), 404);
        assert_eq!(PageError::permission_denied("nope").http_status(), 403);
        assert_eq!(PageError::validation("bad slug").http_status(), 422);
        assert_eq!(
            PageError::LayoutPairing {
                message: "none".to_string()
            }
            .http_status(),
            409
        );
    }

    #[test]
    fn test_user_friendly_message_mentions_path() {
        let err = PageError::not_found("x/y/contact");
        assert!(err.user_friendly_message().contains("x/y/contact"));
    }
}
