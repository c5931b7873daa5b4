//! Configuration validation for deploy configs and options.
//!
//! Validation happens at orchestrator construction, before any remote
//! call, so misconfiguration fails fast instead of surfacing as a
//! pipeline error event.

use crate::error::{AirliftError, ConfigError, Result};
use tracing::debug;

use super::spec::{DeployConfig, DeployOptions};

/// Validator for deploy configurations and runtime options.
#[derive(Debug, Default)]
pub struct ConfigValidator;

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Returns true if no errors were found.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a deploy configuration.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first failed check.
    pub fn validate(&self, config: &DeployConfig) -> Result<ValidationResult> {
        let mut result = ValidationResult::default();

        Self::validate_name(&config.name, &mut result);
        Self::validate_exclusions(&config.exclude, &mut result);

        Self::finish(result)
    }

    /// Validates runtime options.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is missing or the environment name
    /// is unusable.
    pub fn validate_options(&self, options: &DeployOptions) -> Result<ValidationResult> {
        if options.token.is_empty() {
            return Err(AirliftError::Config(ConfigError::MissingToken));
        }

        let mut result = ValidationResult::default();

        if options.environment.is_empty() {
            result.errors.push(ValidationError {
                field: String::from("environment"),
                message: String::from("Environment cannot be empty"),
            });
        } else if !is_valid_name(&options.environment) {
            result.errors.push(ValidationError {
                field: String::from("environment"),
                message: format!(
                    "Environment '{}' is invalid. Must be alphanumeric with hyphens.",
                    options.environment
                ),
            });
        }

        Self::finish(result)
    }

    /// Validates the application name.
    fn validate_name(name: &str, result: &mut ValidationResult) {
        if name.is_empty() {
            result.errors.push(ValidationError {
                field: String::from("name"),
                message: String::from("Application name cannot be empty"),
            });
            return;
        }

        if !is_valid_name(name) {
            result.errors.push(ValidationError {
                field: String::from("name"),
                message: format!(
                    "Application name '{name}' is invalid. Must be alphanumeric with hyphens."
                ),
            });
        }

        if name.chars().any(|c| c.is_ascii_uppercase()) {
            result.warnings.push(format!(
                "Application name '{name}' will be lower-cased on the platform"
            ));
        }
    }

    /// Validates exclusion patterns.
    fn validate_exclusions(exclude: &[String], result: &mut ValidationResult) {
        for (idx, pattern) in exclude.iter().enumerate() {
            if pattern.trim().is_empty() {
                result.errors.push(ValidationError {
                    field: format!("exclude[{idx}]"),
                    message: String::from("Exclusion pattern cannot be empty"),
                });
            } else if pattern == "**" || pattern == "/**" {
                result.warnings.push(format!(
                    "Exclusion pattern '{pattern}' excludes every file in the root"
                ));
            }
        }
    }

    /// Converts an accumulated result into the final verdict.
    fn finish(result: ValidationResult) -> Result<ValidationResult> {
        if result.errors.is_empty() {
            debug!("Configuration validation passed");
            Ok(result)
        } else {
            let first_error = &result.errors[0];
            Err(AirliftError::Config(ConfigError::ValidationError {
                message: first_error.message.clone(),
                field: Some(first_error.field.clone()),
            }))
        }
    }
}

/// Checks whether a name is alphanumeric with hyphens, starting and
/// ending with an alphanumeric character.
fn is_valid_name(name: &str) -> bool {
    if name.is_empty() || name.starts_with('-') || name.ends_with('-') {
        return false;
    }
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config_passes() {
        let validator = ConfigValidator::new();
        let config = DeployConfig::new("demo-app");
        let result = validator.validate(&config).unwrap();
        assert!(result.is_valid());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_empty_name_fails() {
        let validator = ConfigValidator::new();
        let config = DeployConfig::new("");
        assert!(validator.validate(&config).is_err());
    }

    #[test]
    fn test_invalid_name_characters_fail() {
        let validator = ConfigValidator::new();
        let config = DeployConfig::new("my app!");
        assert!(validator.validate(&config).is_err());
    }

    #[test]
    fn test_uppercase_name_warns() {
        let validator = ConfigValidator::new();
        let config = DeployConfig::new("Demo");
        let result = validator.validate(&config).unwrap();
        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_empty_exclusion_pattern_fails() {
        let validator = ConfigValidator::new();
        let mut config = DeployConfig::new("demo");
        config.exclude = vec![String::from("  ")];
        assert!(validator.validate(&config).is_err());
    }

    #[test]
    fn test_missing_token_fails_options() {
        let validator = ConfigValidator::new();
        let options = DeployOptions::new("");
        let result = validator.validate_options(&options);
        assert!(matches!(
            result,
            Err(AirliftError::Config(ConfigError::MissingToken))
        ));
    }

    #[test]
    fn test_invalid_environment_fails_options() {
        let validator = ConfigValidator::new();
        let options = DeployOptions::new("tok").with_environment("bad env");
        assert!(validator.validate_options(&options).is_err());
    }
}
