//! Remote application service trait.
//!
//! This module defines the seam between the orchestrator and the hosting
//! platform: four request/response operations with typed success and
//! failure shapes.

use async_trait::async_trait;

use crate::config::DeployConfig;
use crate::error::Result;

use super::client::HostingClient;
use super::types::{Application, Build, FileMap};

/// Trait for the remote application service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppService: Send + Sync {
    /// Creates an application record.
    async fn create_application(&self, name: &str) -> Result<Application>;

    /// Opens a build for an application.
    async fn create_build(&self, app_name: &str, config: &DeployConfig) -> Result<Build>;

    /// Finalizes a build with its uploaded file map.
    async fn finalize_build(
        &self,
        app_name: &str,
        build_id: &str,
        file_map: &FileMap,
    ) -> Result<()>;

    /// Points a named environment at a finalized build.
    async fn create_release(
        &self,
        app_name: &str,
        environment: &str,
        build_id: &str,
    ) -> Result<()>;
}

#[async_trait]
impl AppService for HostingClient {
    async fn create_application(&self, name: &str) -> Result<Application> {
        Self::create_application(self, name).await
    }

    async fn create_build(&self, app_name: &str, config: &DeployConfig) -> Result<Build> {
        Self::create_build(self, app_name, config).await
    }

    async fn finalize_build(
        &self,
        app_name: &str,
        build_id: &str,
        file_map: &FileMap,
    ) -> Result<()> {
        Self::finalize_build(self, app_name, build_id, file_map).await
    }

    async fn create_release(
        &self,
        app_name: &str,
        environment: &str,
        build_id: &str,
    ) -> Result<()> {
        Self::create_release(self, app_name, environment, build_id).await
    }
}

#[async_trait]
impl AppService for Box<dyn AppService> {
    async fn create_application(&self, name: &str) -> Result<Application> {
        (**self).create_application(name).await
    }

    async fn create_build(&self, app_name: &str, config: &DeployConfig) -> Result<Build> {
        (**self).create_build(app_name, config).await
    }

    async fn finalize_build(
        &self,
        app_name: &str,
        build_id: &str,
        file_map: &FileMap,
    ) -> Result<()> {
        (**self).finalize_build(app_name, build_id, file_map).await
    }

    async fn create_release(
        &self,
        app_name: &str,
        environment: &str,
        build_id: &str,
    ) -> Result<()> {
        (**self).create_release(app_name, environment, build_id).await
    }
}
