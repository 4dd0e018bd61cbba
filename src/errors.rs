use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrderError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error:\n{0}")]
    ValidationError(ValidationErrors),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("API error (HTTP {status}): {body}")]
    ApiError { status: u16, body: String },

    #[error("Order rejected by exchange (code {code}): {msg}")]
    OrderRejected { code: i64, msg: String },

    #[error("Invalid response from server: {0}")]
    ResponseParseError(String),

    #[error("Cannot connect to exchange API at {0}")]
    ConnectionError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<ValidationErrors> for OrderError {
    fn from(errors: ValidationErrors) -> Self {
        OrderError::ValidationError(errors)
    }
}

/// Every constraint an order input violated, in the order they were checked.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    violations: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, violation: impl Into<String>) {
        self.violations.push(violation.into());
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    #[cfg(test)]
    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    #[cfg(test)]
    pub fn contains(&self, needle: &str) -> bool {
        self.violations.iter().any(|v| v.contains(needle))
    }

    /// `Ok(value)` when nothing was recorded, otherwise all violations at once.
    pub fn into_result<T>(self, value: T) -> std::result::Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.violations.join("\n"))
    }
}

pub type Result<T> = std::result::Result<T, OrderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_join_all_violations() {
        let mut errors = ValidationErrors::new();
        errors.push("Quantity must be greater than 0");
        errors.push("Price is required for LIMIT orders");

        let err = OrderError::from(errors);
        let message = err.to_string();
        assert!(message.starts_with("Validation error:"));
        assert!(message.contains("Quantity must be greater than 0\nPrice is required"));
    }

    #[test]
    fn test_into_result() {
        assert_eq!(ValidationErrors::new().into_result(7), Ok(7));

        let mut errors = ValidationErrors::new();
        errors.push("bad");
        assert_eq!(errors.clone().into_result(7), Err(errors));
    }

    #[test]
    fn test_api_error_display_carries_status() {
        let err = OrderError::ApiError {
            status: 418,
            body: "teapot".to_string(),
        };
        assert_eq!(err.to_string(), "API error (HTTP 418): teapot");
    }
}
