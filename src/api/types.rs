//! Airlift API types and data structures.
//!
//! This module defines the remote entities exchanged with the hosting
//! platform: applications, builds, loadpoints, and the storage
//! credentials a build carries for its upload window.

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::config::DEFAULT_REGION;
use crate::error::{AirliftError, Result, SyncError};

/// Mapping from relative file path to content hash, produced by the sync
/// engine and forwarded verbatim to the finalize call.
pub type FileMap = BTreeMap<String, String>;

/// A platform application record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    /// Unique application identifier.
    pub id: String,
    /// Application name, lower-cased by the platform.
    #[serde(default)]
    pub name: String,
}

/// A build record for one deploy attempt.
///
/// Terminal once finalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Build {
    /// Unique build identifier.
    pub id: String,
    /// Owning application identifier.
    pub application_id: String,
    /// Soft-failure status signalled by the remote, if any.
    #[serde(default)]
    pub status: Option<String>,
    /// Soft-failure error signalled by the remote, if any.
    #[serde(default)]
    pub error: Option<String>,
    /// Upload endpoint credentials for this build.
    #[serde(default)]
    pub loadpoint: Option<Loadpoint>,
    /// The raw response payload, retained for protocol-error diagnostics.
    #[serde(skip)]
    pub raw: serde_json::Value,
}

impl Build {
    /// Returns the soft-failure message if the remote signalled one on an
    /// otherwise successful response.
    #[must_use]
    pub fn soft_failure(&self) -> Option<&str> {
        self.error
            .as_deref()
            .or(self.status.as_deref())
            .filter(|m| !m.is_empty())
    }
}

/// The build's embedded storage-access credential bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loadpoint {
    /// Base64-encoded JSON credential payload.
    pub authorization: String,
}

/// Storage credentials decoded from a build loadpoint.
///
/// Single sync use, attached to one build; discarded afterwards and
/// never persisted.
#[derive(Clone, Deserialize)]
pub struct StorageCredentials {
    /// Access key identifier.
    pub key: String,
    /// Secret access key.
    pub secret: String,
    /// Session token.
    pub token: String,
    /// Storage region.
    #[serde(default)]
    pub region: Option<String>,
}

impl StorageCredentials {
    /// Decodes credentials from a loadpoint authorization string
    /// (base64-encoded JSON).
    ///
    /// # Errors
    ///
    /// Returns a credential-decode error if the payload is not valid
    /// base64 or does not parse as a credential document.
    pub fn decode(authorization: &str) -> Result<Self> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(authorization)
            .map_err(|e| {
                AirliftError::Sync(SyncError::CredentialDecode {
                    message: format!("invalid base64: {e}"),
                })
            })?;

        serde_json::from_slice(&bytes).map_err(|e| {
            AirliftError::Sync(SyncError::CredentialDecode {
                message: format!("invalid credential document: {e}"),
            })
        })
    }

    /// The effective storage region.
    #[must_use]
    pub fn region(&self) -> &str {
        self.region.as_deref().unwrap_or(DEFAULT_REGION)
    }
}

// Secrets stay out of logs and error output.
impl fmt::Debug for StorageCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageCredentials")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .field("token", &"<redacted>")
            .field("region", &self.region)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(json: &str) -> String {
        base64::engine::general_purpose::STANDARD.encode(json)
    }

    #[test]
    fn test_decode_credentials() {
        let authorization =
            encode(r#"{"key":"AKIA","secret":"s3cr3t","token":"sess","region":"eu-west-1"}"#);
        let creds = StorageCredentials::decode(&authorization).unwrap();
        assert_eq!(creds.key, "AKIA");
        assert_eq!(creds.secret, "s3cr3t");
        assert_eq!(creds.token, "sess");
        assert_eq!(creds.region(), "eu-west-1");
    }

    #[test]
    fn test_decode_credentials_default_region() {
        let authorization = encode(r#"{"key":"AKIA","secret":"s3cr3t","token":"sess"}"#);
        let creds = StorageCredentials::decode(&authorization).unwrap();
        assert_eq!(creds.region(), DEFAULT_REGION);
    }

    #[test]
    fn test_decode_invalid_base64_fails() {
        let result = StorageCredentials::decode("not@base64!");
        assert!(matches!(
            result,
            Err(AirliftError::Sync(SyncError::CredentialDecode { .. }))
        ));
    }

    #[test]
    fn test_decode_invalid_json_fails() {
        let authorization = encode(r#"{"key":"only-a-key"}"#);
        let result = StorageCredentials::decode(&authorization);
        assert!(matches!(
            result,
            Err(AirliftError::Sync(SyncError::CredentialDecode { .. }))
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = StorageCredentials {
            key: String::from("AKIA"),
            secret: String::from("s3cr3t"),
            token: String::from("sess"),
            region: None,
        };
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("s3cr3t"));
        assert!(!rendered.contains("sess"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_build_soft_failure_prefers_error() {
        let build = Build {
            id: String::from("b1"),
            application_id: String::from("a1"),
            status: Some(String::from("quota-exceeded")),
            error: Some(String::from("Build quota exceeded")),
            loadpoint: None,
            raw: serde_json::Value::Null,
        };
        assert_eq!(build.soft_failure(), Some("Build quota exceeded"));
    }

    #[test]
    fn test_build_soft_failure_none_when_clean() {
        let build = Build {
            id: String::from("b1"),
            application_id: String::from("a1"),
            status: None,
            error: None,
            loadpoint: None,
            raw: serde_json::Value::Null,
        };
        assert!(build.soft_failure().is_none());
    }
}
