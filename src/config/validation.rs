use url::Url;

use crate::config::models::GatewayConfig;

/// Validation result type alias
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error types
#[derive(Debug, thiserror::Error, Clone)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid URL in '{field}': {value}")]
    InvalidUrl { field: String, value: String },

    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// Gateway configuration validator.
///
/// Collects every problem found rather than stopping at the first one, so a
/// broken config file can be fixed in a single pass.
pub struct GatewayConfigValidator;

impl GatewayConfigValidator {
    /// Validate the entire gateway configuration.
    pub fn validate(config: &GatewayConfig) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if config.auth.url.is_empty() {
            errors.push(ValidationError::MissingField {
                field: "auth.url".to_string(),
            });
        } else if !Self::is_absolute_url(&config.auth.url) {
            errors.push(ValidationError::InvalidUrl {
                field: "auth.url".to_string(),
                value: config.auth.url.clone(),
            });
        }

        if config.mappings.is_empty() {
            errors.push(ValidationError::MissingField {
                field: "mappings".to_string(),
            });
        }

        for (index, mapping) in config.mappings.iter().enumerate() {
            if mapping.forward.is_empty() {
                errors.push(ValidationError::MissingField {
                    field: format!("mappings[{index}].forward"),
                });
            } else if !Self::is_absolute_url(&mapping.forward) {
                errors.push(ValidationError::InvalidUrl {
                    field: format!("mappings[{index}].forward"),
                    value: mapping.forward.clone(),
                });
            }

            if mapping.prefix.is_empty() {
                errors.push(ValidationError::MissingField {
                    field: format!("mappings[{index}].prefix"),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::ValidationFailed {
                message: Self::format_multiple_errors(errors),
            })
        }
    }

    /// An absolute URL needs both a scheme and a host.
    fn is_absolute_url(value: &str) -> bool {
        match Url::parse(value) {
            Ok(url) => url.has_host(),
            Err(_) => false,
        }
    }

    /// Format multiple validation errors into a single message
    fn format_multiple_errors(errors: Vec<ValidationError>) -> String {
        let messages: Vec<String> = errors.iter().map(|e| format!("  • {e}")).collect();
        format!(
            "Found {} validation error(s):\n{}",
            errors.len(),
            messages.join("\n")
        )
    }
}
