//! Airlift API client implementation.
//!
//! This module provides the HTTP client for the hosting platform's REST
//! API. Every non-2xx response is classified here, once, into the error
//! taxonomy the orchestrator branches on.

use reqwest::{header, Client, Method, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, trace};

use crate::config::{DeployConfig, HostingOverrides};
use crate::error::{AirliftError, ApiError, Result};

use super::types::{Application, Build, FileMap};

/// Airlift API client.
///
/// Carries the bearer token and the `Accept-Version` protocol header,
/// supplied once at construction.
#[derive(Debug, Clone)]
pub struct HostingClient {
    /// HTTP client.
    client: Client,
    /// API origin.
    origin: String,
    /// Bearer token.
    token: String,
    /// Protocol version, sent as `Accept-Version`.
    api_version: String,
}

/// Error body shape returned by the API.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

impl HostingClient {
    /// Creates a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(token: &str, hosting: &HostingOverrides, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            origin: hosting.api_host().trim_end_matches('/').to_string(),
            token: token.to_string(),
            api_version: hosting.api_version().to_string(),
        })
    }

    /// Executes a request and classifies the response.
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<serde_json::Value> {
        let url = format!("{}/{path}", self.origin);
        trace!("{method} {url}");

        let mut request = self
            .client
            .request(method, &url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
            .header("Accept-Version", &self.api_version);

        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|e| {
            AirliftError::Api(ApiError::network(format!("Request failed: {e}")))
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            AirliftError::Api(ApiError::InvalidResponse {
                message: format!("Failed to read response body: {e}"),
            })
        })?;

        if status.is_success() {
            if text.is_empty() {
                return Ok(serde_json::Value::Null);
            }
            return serde_json::from_str(&text).map_err(|e| {
                AirliftError::Api(ApiError::InvalidResponse {
                    message: format!("Failed to parse response: {e}"),
                })
            });
        }

        Err(AirliftError::Api(Self::classify(status, &text)))
    }

    /// Classifies a non-2xx response into the error taxonomy.
    ///
    /// The remote's structured error message is surfaced when present,
    /// otherwise the raw body stands in.
    fn classify(status: StatusCode, body: &str) -> ApiError {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.error)
            .unwrap_or_else(|| body.to_string());

        match status.as_u16() {
            404 => ApiError::NotFound { message },
            401 | 403 => ApiError::Unauthorized { message },
            _ => ApiError::request_failed(status.as_u16(), message),
        }
    }

    /// Deserializes a value, mapping failures to invalid-response errors.
    fn parse<T: for<'de> Deserialize<'de>>(value: serde_json::Value) -> Result<T> {
        serde_json::from_value(value).map_err(|e| {
            AirliftError::Api(ApiError::InvalidResponse {
                message: format!("Failed to decode response: {e}"),
            })
        })
    }

    /// Creates an application.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    pub async fn create_application(&self, name: &str) -> Result<Application> {
        debug!("Creating application: {name}");

        let value = self
            .request(
                Method::POST,
                "apps",
                Some(serde_json::json!({ "name": name })),
            )
            .await?;

        Self::parse(value)
    }

    /// Creates a build for an application.
    ///
    /// The raw response payload is retained on the returned build for
    /// protocol-error diagnostics.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    pub async fn create_build(&self, app_name: &str, config: &DeployConfig) -> Result<Build> {
        debug!("Creating build for application: {app_name}");

        let value = self
            .request(
                Method::POST,
                &format!("apps/{app_name}/builds"),
                Some(serde_json::json!({ "config": config })),
            )
            .await?;

        let mut build: Build = Self::parse(value.clone())?;
        build.raw = value;
        Ok(build)
    }

    /// Finalizes a build, committing its uploaded file map.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    pub async fn finalize_build(
        &self,
        app_name: &str,
        build_id: &str,
        file_map: &FileMap,
    ) -> Result<()> {
        debug!("Finalizing build {build_id} for application: {app_name}");

        self.request(
            Method::PUT,
            &format!("apps/{app_name}/builds/{build_id}/finalize"),
            Some(serde_json::json!({ "file_map": file_map })),
        )
        .await?;

        Ok(())
    }

    /// Points a named environment at a finalized build.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    pub async fn create_release(
        &self,
        app_name: &str,
        environment: &str,
        build_id: &str,
    ) -> Result<()> {
        debug!("Releasing build {build_id} to environment: {environment}");

        self.request(
            Method::POST,
            &format!("apps/{app_name}/releases/{environment}"),
            Some(serde_json::json!({ "build": build_id })),
        )
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> HostingClient {
        let hosting = HostingOverrides {
            api_host: Some(server.uri()),
            ..Default::default()
        };
        HostingClient::new("test-token", &hosting, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_create_build_parses_loadpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/apps/demo/builds"))
            .and(header("Authorization", "Bearer test-token"))
            .and(header("Accept-Version", "0.5.0"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": "b-1",
                "application_id": "a-1",
                "loadpoint": { "authorization": "ZGF0YQ==" }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let build = client
            .create_build("demo", &DeployConfig::new("demo"))
            .await
            .unwrap();

        assert_eq!(build.id, "b-1");
        assert_eq!(build.application_id, "a-1");
        assert!(build.loadpoint.is_some());
        assert!(build.soft_failure().is_none());
        assert_eq!(build.raw["id"], "b-1");
    }

    #[tokio::test]
    async fn test_create_build_404_classifies_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/apps/demo/builds"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({ "error": "app not found" })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .create_build("demo", &DeployConfig::new("demo"))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_401_classifies_unauthorized_with_body_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/apps"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({ "error": "invalid access token" })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.create_application("demo").await.unwrap_err();

        assert!(err.is_unauthorized());
        assert!(err.to_string().contains("invalid access token"));
    }

    #[tokio::test]
    async fn test_other_failure_surfaces_raw_body() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/apps/demo/builds/b-1/finalize"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .finalize_build("demo", "b-1", &FileMap::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AirliftError::Api(ApiError::RequestFailed { status: 500, .. })
        ));
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn test_release_accepts_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/apps/demo/releases/staging"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert!(client.create_release("demo", "staging", "b-1").await.is_ok());
    }
}
