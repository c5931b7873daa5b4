//! Airlift hosting API integration.
//!
//! This module provides the typed client for the platform's REST API and
//! the service trait the orchestrator consumes.

mod client;
mod service;
mod types;

pub use client::HostingClient;
pub use service::AppService;
pub use types::{Application, Build, FileMap, Loadpoint, StorageCredentials};

#[cfg(test)]
pub use service::MockAppService;
