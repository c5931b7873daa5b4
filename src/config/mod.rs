//! Configuration parsing and validation.
//!
//! This module handles loading, parsing, and validating the deploy
//! configuration and the per-attempt runtime options.

mod parser;
mod spec;
mod validator;

pub use parser::{find_config_file, ConfigParser, DEFAULT_CONFIG_FILES};
pub use spec::{
    DeployConfig, DeployOptions, HostingOverrides, BUCKET_ENV_VAR, DEFAULT_API_HOST,
    DEFAULT_API_VERSION, DEFAULT_BUCKET, DEFAULT_ENVIRONMENT, DEFAULT_REGION,
    DEFAULT_TIMEOUT_SECS, PLATFORM_DOMAIN,
};
pub use validator::{ConfigValidator, ValidationError, ValidationResult};
