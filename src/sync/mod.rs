//! Content-addressed file synchronization.
//!
//! The orchestrator hands a staged directory and storage credentials to
//! a sync delegate, which hashes every file, skips content the platform
//! already holds, uploads the rest, and reports granular progress. The
//! delegate owns its retry behavior; the orchestrator only relays the
//! events it emits.

mod s3;

pub use s3::S3SyncDelegate;

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::api::{FileMap, StorageCredentials};
use crate::error::Result;

/// Progress events emitted by a sync delegate.
///
/// Terminal success is the file map returned from [`SyncDelegate::sync`];
/// terminal failure is its error. Everything here is intermediate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Total number of files the delegate will process.
    InodeCount {
        /// File count.
        count: usize,
    },
    /// A file's content is already present remotely.
    Found {
        /// Root-relative path.
        path: String,
        /// Files resolved so far.
        count: usize,
    },
    /// A file's content is not present remotely and will be uploaded.
    NotFound {
        /// Root-relative path.
        path: String,
    },
    /// A file's hash is being recorded in the local cache.
    CacheStart {
        /// Root-relative path.
        path: String,
    },
    /// A file's hash was recorded in the local cache.
    CacheSuccess {
        /// Root-relative path.
        path: String,
    },
    /// A file finished uploading.
    UploadSuccess {
        /// Root-relative path.
        path: String,
    },
    /// A file upload failed permanently.
    UploadFailure {
        /// Description of the failure.
        message: String,
    },
    /// A transient failure was retried internally.
    Retry {
        /// Description of the transient failure.
        message: String,
    },
}

/// One sync invocation's inputs.
#[derive(Debug, Clone)]
pub struct SyncRequest {
    /// Staged directory to synchronize.
    pub directory: PathBuf,
    /// Storage credentials decoded from the build loadpoint.
    pub credentials: StorageCredentials,
    /// Target bucket.
    pub bucket: String,
    /// Key prefix, the build's application id.
    pub key_prefix: String,
    /// Network operation timeout.
    pub timeout: Duration,
    /// Local hash-cache directory, if caching is enabled.
    pub cache_dir: Option<PathBuf>,
}

/// Trait for the content-addressed synchronization engine.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SyncDelegate: Send + Sync {
    /// Synchronizes a staged directory, emitting progress on `events`.
    ///
    /// Returns the complete mapping from relative path to content hash
    /// on success.
    async fn sync(
        &self,
        request: SyncRequest,
        events: mpsc::UnboundedSender<SyncEvent>,
    ) -> Result<FileMap>;
}

/// The default local hash-cache directory, under the user cache dir.
#[must_use]
pub fn default_cache_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|base| base.join("airlift/deploy"))
}
