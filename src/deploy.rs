//! Deploy orchestration.
//!
//! The orchestrator drives one deploy attempt through its ordered
//! states: validate the root, create the build (auto-creating the
//! application on first use), stage the selected files, hand them to
//! the sync delegate, finalize the build, and release it to the target
//! environment. Progress and the single terminal outcome are reported
//! on a [`StatusChannel`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use crate::api::{AppService, Build, HostingClient, StorageCredentials};
use crate::config::{ConfigValidator, DeployConfig, DeployOptions};
use crate::error::{AirliftError, ApiError, Result, StageError};
use crate::selector::FileSelector;
use crate::stage;
use crate::status::{StatusChannel, StatusEvent};
use crate::sync::{default_cache_dir, S3SyncDelegate, SyncDelegate, SyncEvent, SyncRequest};

/// Summary of a successful deploy attempt.
#[derive(Debug, Clone, Serialize)]
pub struct DeployOutcome {
    /// URL the application is served from.
    pub url: String,
    /// Environment that was released.
    pub environment: String,
    /// Identifier of the finalized build.
    pub build_id: String,
    /// Number of files resolved by the sync engine.
    pub files: usize,
    /// When the release completed.
    pub deployed_at: DateTime<Utc>,
}

/// Handle to a running deploy attempt.
///
/// Events arrive in completion order and are buffered, so subscribing
/// after [`Deployer::start`] misses nothing. The stream always closes
/// with exactly one terminal event.
#[derive(Debug)]
pub struct DeployHandle {
    events: mpsc::UnboundedReceiver<StatusEvent>,
    task: JoinHandle<Result<DeployOutcome>>,
}

impl DeployHandle {
    /// Receives the next status event, or `None` once the attempt is
    /// done and the stream is drained.
    pub async fn next_event(&mut self) -> Option<StatusEvent> {
        self.events.recv().await
    }

    /// Waits for the attempt to finish and returns its outcome.
    ///
    /// # Errors
    ///
    /// Returns the error that terminated the pipeline.
    pub async fn wait(self) -> Result<DeployOutcome> {
        self.task
            .await
            .map_err(|e| AirliftError::internal(format!("deploy task failed: {e}")))?
    }
}

/// Orchestrates one deploy attempt.
///
/// Each attempt constructs its own orchestrator; no state is shared
/// across attempts.
pub struct Deployer {
    /// Application configuration.
    config: DeployConfig,
    /// Runtime options.
    options: DeployOptions,
    /// Base directory the configured root resolves against.
    base_dir: PathBuf,
    /// Remote application service.
    api: Arc<dyn AppService>,
    /// Content-addressed sync engine.
    sync: Arc<dyn SyncDelegate>,
}

impl std::fmt::Debug for Deployer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deployer")
            .field("config", &self.config)
            .field("base_dir", &self.base_dir)
            .field("environment", &self.options.environment)
            .finish_non_exhaustive()
    }
}

impl Deployer {
    /// Creates an orchestrator with the default API client and S3 sync
    /// delegate.
    ///
    /// Validation happens here, before any remote call: a missing token
    /// or unusable configuration fails fast instead of surfacing as a
    /// pipeline error event.
    ///
    /// # Errors
    ///
    /// Returns a validation error for unusable config or options, or a
    /// network error if the HTTP client cannot be created.
    pub fn new(config: DeployConfig, options: DeployOptions) -> Result<Self> {
        let api = HostingClient::new(&options.token, &options.hosting, options.timeout)?;
        Self::with_services(config, options, Arc::new(api), Arc::new(S3SyncDelegate::new()))
    }

    /// Creates an orchestrator with explicit collaborators.
    ///
    /// # Errors
    ///
    /// Returns a validation error for unusable config or options.
    pub fn with_services(
        config: DeployConfig,
        options: DeployOptions,
        api: Arc<dyn AppService>,
        sync: Arc<dyn SyncDelegate>,
    ) -> Result<Self> {
        let validator = ConfigValidator::new();
        validator.validate(&config)?;
        validator.validate_options(&options)?;

        let base_dir = std::env::current_dir()?;

        Ok(Self {
            config,
            options,
            base_dir,
            api,
            sync,
        })
    }

    /// Sets the base directory the configured root resolves against.
    #[must_use]
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    /// Starts the deploy attempt.
    ///
    /// The attempt runs to a terminal event; it cannot be cancelled
    /// mid-pipeline.
    #[must_use]
    pub fn start(self) -> DeployHandle {
        let (status, events) = StatusChannel::new();
        let task = tokio::spawn(self.run(status));
        DeployHandle { events, task }
    }

    /// Runs the pipeline and publishes the single terminal event.
    async fn run(self, status: StatusChannel) -> Result<DeployOutcome> {
        let attempt = Uuid::new_v4();
        let span = info_span!(
            "deploy",
            app = %self.config.name,
            environment = %self.options.environment,
            %attempt,
        );

        let result = self.execute(&status).instrument(span).await;

        match &result {
            Ok(outcome) => {
                status.emit(StatusEvent::End {
                    url: outcome.url.clone(),
                    environment: outcome.environment.clone(),
                });
            }
            Err(e) => {
                status.emit(StatusEvent::Error {
                    message: e.surface_message(),
                });
            }
        }

        result
    }

    /// The pipeline body: every fatal error propagates out to become
    /// the terminal `error` event.
    async fn execute(&self, status: &StatusChannel) -> Result<DeployOutcome> {
        let root = self.config.resolved_root(&self.base_dir);
        if !root.is_dir() {
            return Err(AirliftError::Stage(StageError::RootMissing { path: root }));
        }

        status.emit(StatusEvent::BuildStart);
        let build = self.create_build_with_recovery(status).await?;

        if let Some(message) = build.soft_failure() {
            return Err(AirliftError::Api(ApiError::Rejected {
                message: message.to_string(),
            }));
        }

        let Some(loadpoint) = build.loadpoint.clone() else {
            let payload = serde_json::to_string_pretty(&build.raw)
                .unwrap_or_else(|_| build.raw.to_string());
            return Err(AirliftError::Api(ApiError::UnexpectedBuild { payload }));
        };

        status.emit(StatusEvent::BuildEnd {
            build_id: build.id.clone(),
        });

        // Staging: scoped temp dir, removed on every exit path.
        let selector = FileSelector::new(&root, &self.config.exclude)?;
        let files = selector.select()?;
        let staged = stage::stage(&root, &build.id, &files).await?;

        status.emit(StatusEvent::HashingStart);

        let credentials = StorageCredentials::decode(&loadpoint.authorization)?;
        let request = SyncRequest {
            directory: staged.directory().to_path_buf(),
            credentials,
            bucket: self.options.hosting.bucket(),
            key_prefix: build.application_id.clone(),
            timeout: self.options.timeout,
            cache_dir: self.config.cache_dir.clone().or_else(default_cache_dir),
        };

        let file_map = self.run_sync(request, status).await?;
        status.emit(StatusEvent::UploadEnd);

        let file_count = staged.file_count();
        drop(staged);

        let app_name = self.config.name.to_lowercase();

        status.emit(StatusEvent::FinalizeStart);
        self.api
            .finalize_build(&app_name, &build.id, &file_map)
            .await?;
        status.emit(StatusEvent::FinalizeEnd);

        status.emit(StatusEvent::ReleaseStart {
            environment: self.options.environment.clone(),
        });
        self.api
            .create_release(&app_name, &self.options.environment, &build.id)
            .await?;
        status.emit(StatusEvent::ReleaseEnd);

        info!("Deployed {} files to {}", file_count, self.options.environment);

        Ok(DeployOutcome {
            url: self.config.app_url(&self.options.environment),
            environment: self.options.environment.clone(),
            build_id: build.id,
            files: file_count,
            deployed_at: Utc::now(),
        })
    }

    /// Creates the build, auto-creating the application on a not-found
    /// failure.
    ///
    /// The recovery runs at most once per attempt: a second not-found
    /// after the application was created is a hard failure.
    async fn create_build_with_recovery(&self, status: &StatusChannel) -> Result<Build> {
        match self.api.create_build(&self.config.name, &self.config).await {
            Ok(build) => Ok(build),
            Err(err) if err.is_not_found() => {
                info!("Application does not exist yet, creating it first");
                status.emit(StatusEvent::AppCreate {
                    name: self.config.name.clone(),
                });

                let application = self
                    .api
                    .create_application(&self.config.name.to_lowercase())
                    .await?;

                status.emit(StatusEvent::AppEnd {
                    application_id: application.id,
                });

                self.api.create_build(&self.config.name, &self.config).await
            }
            Err(err) => Err(err),
        }
    }

    /// Invokes the sync delegate, relaying its progress events in
    /// arrival order.
    async fn run_sync(
        &self,
        request: SyncRequest,
        status: &StatusChannel,
    ) -> Result<crate::api::FileMap> {
        let (tx, mut rx) = mpsc::unbounded_channel();

        let relay_status = status.clone();
        let relay = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                relay_sync_event(&relay_status, &event);
            }
        });

        let result = self.sync.sync(request, tx).await;

        // The sender is consumed by the delegate, so the relay drains
        // and finishes once the sync call returns.
        if let Err(e) = relay.await {
            debug!("Sync event relay ended abnormally: {e}");
        }

        result
    }
}

/// Translates one sync-engine event onto the status channel.
fn relay_sync_event(status: &StatusChannel, event: &SyncEvent) {
    match event {
        SyncEvent::InodeCount { count } => {
            status.emit(StatusEvent::HashingEnd);
            status.emit(StatusEvent::FileCount { count: *count });
            status.emit(StatusEvent::UploadStart { count: *count });
        }
        SyncEvent::NotFound { path } => {
            status.verbose(format!("404 {path}"));
        }
        SyncEvent::Found { path, count } => {
            status.emit(StatusEvent::FileFound { count: *count });
            status.emit(StatusEvent::UploadProgress { count: 1 });
            status.verbose(format!("200 {path}"));
        }
        SyncEvent::CacheStart { path } => {
            status.emit(StatusEvent::FileCacheStart);
            status.verbose(format!("PUT {path}"));
        }
        SyncEvent::CacheSuccess { path } => {
            status.emit(StatusEvent::FileCacheSuccess);
            status.verbose(format!("201 {path}"));
        }
        SyncEvent::UploadSuccess { path } => {
            status.emit(StatusEvent::UploadSuccess);
            status.emit(StatusEvent::UploadProgress { count: 1 });
            status.verbose(format!("201 {path}"));
        }
        SyncEvent::UploadFailure { message } => {
            status.emit(StatusEvent::UploadFailure {
                message: message.clone(),
            });
        }
        SyncEvent::Retry { message } => {
            status.emit(StatusEvent::Retry {
                message: message.clone(),
            });
        }
    }
}

/// Starts a deploy with the default collaborators.
///
/// Convenience wrapper over [`Deployer::new`] + [`Deployer::start`].
///
/// # Errors
///
/// Returns a validation error for unusable config or options.
pub fn push(config: DeployConfig, options: DeployOptions) -> Result<DeployHandle> {
    Ok(Deployer::new(config, options)?.start())
}
