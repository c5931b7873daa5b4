// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Airlift
//!
//! Deploy a local application directory to the Airlift hosting platform.
//!
//! ## Overview
//!
//! A deploy attempt runs an ordered pipeline:
//!
//! 1. Validate the configuration and the application root directory
//! 2. Create a build (auto-creating the application on first use)
//! 3. Stage a filtered copy of the tree into a scoped temporary directory
//! 4. Upload the staged files through a content-addressed sync engine
//! 5. Finalize the build and release it to a named environment
//!
//! Progress is reported as a typed event stream that terminates in
//! exactly one `end` or `error` event.
//!
//! ## Modules
//!
//! - [`config`]: Configuration parsing and validation
//! - [`api`]: Hosting platform API client and service trait
//! - [`selector`]: File selection and exclusion patterns
//! - [`stage`]: Staging into scoped temporary directories
//! - [`sync`]: Content-addressed synchronization
//! - [`status`]: Status events and the channel that carries them
//! - [`deploy`]: The deploy orchestrator
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! name: demo
//! root: public
//! exclude:
//!   - node_modules
//!   - "*.log"
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod api;
pub mod cli;
pub mod config;
pub mod deploy;
pub mod error;
pub mod selector;
pub mod stage;
pub mod status;
pub mod sync;

// ============================================================================
// Re-exports
// ============================================================================

pub use api::{AppService, Application, Build, FileMap, HostingClient, StorageCredentials};
pub use cli::{Cli, Commands, OutputFormat, OutputFormatter};
pub use config::{ConfigParser, ConfigValidator, DeployConfig, DeployOptions, HostingOverrides};
pub use deploy::{push, DeployHandle, DeployOutcome, Deployer};
pub use error::{AirliftError, Result};
pub use selector::FileSelector;
pub use stage::{stage, StagedBuild};
pub use status::{StatusChannel, StatusEvent};
pub use sync::{S3SyncDelegate, SyncDelegate, SyncEvent, SyncRequest};
