//! S3-backed sync delegate.
//!
//! Content-addressed synchronization against the platform's hashed
//! bucket: each file is hashed, probed with a `HeadObject` call (and a
//! local hash cache), and uploaded under `<prefix>/<hash>` only when the
//! content is not already present. Transient upload failures are retried
//! a bounded number of times.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::api::FileMap;
use crate::error::{AirliftError, Result, SyncError};

use super::{SyncDelegate, SyncEvent, SyncRequest};

/// Maximum upload attempts per file.
const MAX_RETRIES: u32 = 3;

/// Delay between upload retries in milliseconds.
const RETRY_DELAY_MS: u64 = 1000;

/// S3-backed content-addressed sync delegate.
#[derive(Debug, Default)]
pub struct S3SyncDelegate;

impl S3SyncDelegate {
    /// Creates a new S3 sync delegate.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Builds an S3 client from the request's single-use credentials.
    async fn build_client(request: &SyncRequest) -> Client {
        let credentials = Credentials::new(
            request.credentials.key.clone(),
            request.credentials.secret.clone(),
            Some(request.credentials.token.clone()),
            None,
            "airlift-loadpoint",
        );

        let timeout = aws_config::timeout::TimeoutConfig::builder()
            .operation_timeout(request.timeout)
            .build();

        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(request.credentials.region().to_string()))
            .credentials_provider(credentials)
            .timeout_config(timeout)
            .load()
            .await;

        Client::new(&config)
    }

    /// Checks whether a content hash already exists in the bucket.
    async fn object_exists(client: &Client, bucket: &str, key: &str) -> Result<bool> {
        let result = client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(sdk_err) => {
                let service_err = sdk_err.into_service_error();
                if service_err.is_not_found() {
                    Ok(false)
                } else {
                    Err(AirliftError::Sync(SyncError::fatal(format!(
                        "head failed for {key}: {service_err}"
                    ))))
                }
            }
        }
    }

    /// Uploads one file, retrying transient failures.
    async fn upload(
        client: &Client,
        request: &SyncRequest,
        source: &Path,
        key: &str,
        relative: &str,
        events: &mpsc::UnboundedSender<SyncEvent>,
    ) -> Result<()> {
        let mut attempt = 0;
        loop {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_millis(RETRY_DELAY_MS * u64::from(attempt)))
                    .await;
            }

            let body = ByteStream::from_path(source).await.map_err(|e| {
                AirliftError::Sync(SyncError::UploadFailed {
                    path: relative.to_string(),
                    message: e.to_string(),
                })
            })?;

            match client
                .put_object()
                .bucket(&request.bucket)
                .key(key)
                .body(body)
                .send()
                .await
            {
                Ok(_) => return Ok(()),
                Err(e) if is_transient(&e) && attempt + 1 < MAX_RETRIES => {
                    let _ = events.send(SyncEvent::Retry {
                        message: format!("{relative}: {e}"),
                    });
                    attempt += 1;
                }
                Err(e) => {
                    let message = format!("{e}");
                    let _ = events.send(SyncEvent::UploadFailure {
                        message: message.clone(),
                    });
                    return Err(AirliftError::Sync(SyncError::UploadFailed {
                        path: relative.to_string(),
                        message,
                    }));
                }
            }
        }
    }
}

#[async_trait]
impl SyncDelegate for S3SyncDelegate {
    async fn sync(
        &self,
        request: SyncRequest,
        events: mpsc::UnboundedSender<SyncEvent>,
    ) -> Result<FileMap> {
        let files = collect_files(&request.directory)?;
        let _ = events.send(SyncEvent::InodeCount { count: files.len() });

        let client = Self::build_client(&request).await;
        let cache = HashCache::new(request.cache_dir.clone());

        let mut file_map = FileMap::new();
        let mut resolved = 0_usize;

        for (relative, absolute) in files {
            let hash = hash_file(&absolute).await?;
            let key = format!("{}/{hash}", request.key_prefix);
            trace!("{relative} -> {key}");

            let cached = cache.contains(&hash);
            let exists =
                cached || Self::object_exists(&client, &request.bucket, &key).await?;

            resolved += 1;

            if exists {
                let _ = events.send(SyncEvent::Found {
                    path: relative.clone(),
                    count: resolved,
                });
            } else {
                let _ = events.send(SyncEvent::NotFound {
                    path: relative.clone(),
                });
                Self::upload(&client, &request, &absolute, &key, &relative, &events).await?;
                let _ = events.send(SyncEvent::UploadSuccess {
                    path: relative.clone(),
                });
            }

            if !cached && cache.enabled() {
                let _ = events.send(SyncEvent::CacheStart {
                    path: relative.clone(),
                });
                cache.record(&hash);
                let _ = events.send(SyncEvent::CacheSuccess {
                    path: relative.clone(),
                });
            }

            file_map.insert(relative, hash);
        }

        debug!("Synchronized {} files", file_map.len());
        Ok(file_map)
    }
}

/// Classifies an SDK failure as transient (worth retrying).
fn is_transient<E>(err: &SdkError<E>) -> bool {
    matches!(
        err,
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) | SdkError::ResponseError(_)
    )
}

/// Hashes a file's content with SHA-256, hex encoded.
async fn hash_file(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path).await?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

/// Collects every regular file under a directory as sorted
/// (relative, absolute) pairs.
fn collect_files(directory: &Path) -> Result<Vec<(String, PathBuf)>> {
    fn walk(base: &Path, dir: &Path, out: &mut Vec<(String, PathBuf)>) -> Result<()> {
        let mut entries: Vec<_> =
            std::fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;
        entries.sort_by_key(std::fs::DirEntry::path);

        for entry in entries {
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                walk(base, &path, out)?;
            } else if path.is_file() {
                let relative = path
                    .strip_prefix(base)
                    .map_err(|e| AirliftError::internal(e.to_string()))?
                    .to_string_lossy()
                    .replace('\\', "/");
                out.push((relative, path));
            }
        }
        Ok(())
    }

    let mut files = Vec::new();
    walk(directory, directory, &mut files)?;
    Ok(files)
}

/// Local cache of content hashes already confirmed remote.
///
/// One marker file per hash; absence of a cache directory disables
/// caching without affecting correctness.
#[derive(Debug)]
struct HashCache {
    directory: Option<PathBuf>,
}

impl HashCache {
    fn new(directory: Option<PathBuf>) -> Self {
        let directory = directory.filter(|dir| {
            std::fs::create_dir_all(dir)
                .map_err(|e| debug!("Hash cache disabled: {e}"))
                .is_ok()
        });
        Self { directory }
    }

    const fn enabled(&self) -> bool {
        self.directory.is_some()
    }

    fn contains(&self, hash: &str) -> bool {
        self.directory
            .as_ref()
            .is_some_and(|dir| dir.join(hash).exists())
    }

    fn record(&self, hash: &str) {
        if let Some(dir) = &self.directory {
            if let Err(e) = std::fs::write(dir.join(hash), b"") {
                debug!("Failed to record hash in cache: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_hash_file_is_deterministic_hex() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        std::fs::write(&path, b"hello").unwrap();

        let hash = hash_file(&path).await.unwrap();
        assert_eq!(
            hash,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(hash, hash_file(&path).await.unwrap());
    }

    #[test]
    fn test_collect_files_is_sorted_and_relative() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/b.txt"), b"b").unwrap();
        std::fs::write(dir.path().join("a.txt"), b"a").unwrap();

        let files = collect_files(dir.path()).unwrap();
        let relatives: Vec<_> = files.iter().map(|(r, _)| r.as_str()).collect();
        assert_eq!(relatives, vec!["a.txt", "sub/b.txt"]);
    }

    #[test]
    fn test_hash_cache_round_trip() {
        let dir = tempdir().unwrap();
        let cache = HashCache::new(Some(dir.path().join("cache")));

        assert!(cache.enabled());
        assert!(!cache.contains("abc123"));
        cache.record("abc123");
        assert!(cache.contains("abc123"));
    }

    #[test]
    fn test_hash_cache_disabled_without_directory() {
        let cache = HashCache::new(None);
        assert!(!cache.enabled());
        assert!(!cache.contains("abc123"));
        cache.record("abc123");
        assert!(!cache.contains("abc123"));
    }
}
