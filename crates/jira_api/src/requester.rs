//! Executes request descriptors with HTTP Basic authentication.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client as HttpClient, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::JiraConfig;
use crate::error::{JiraError, Result};
use crate::request::{BodyFormat, RequestDescriptor};

/// Owns the transport and the credentials it authenticates with. Does not
/// retry, cache responses or remember sessions.
#[derive(Clone)]
pub struct AuthenticatedRequester {
    http: HttpClient,
    config: JiraConfig,
}

impl AuthenticatedRequester {
    pub fn new(config: JiraConfig) -> Result<Self> {
        let http = build_http_client(&config)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &JiraConfig {
        &self.config
    }

    /// Sends the request and decodes a successful JSON body into `T`.
    pub async fn execute<T>(&self, request: RequestDescriptor) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = self.send(request).await?;
        Self::parse_json(response).await
    }

    /// Sends the request and only checks the status; the body is discarded.
    pub async fn execute_expect_success(&self, request: RequestDescriptor) -> Result<()> {
        let response = self.send(request).await?;
        Self::ensure_success(response).await
    }

    async fn send(&self, request: RequestDescriptor) -> Result<Response> {
        let credentials = &self.config.credentials;
        if !credentials.is_complete() {
            return Err(JiraError::CredentialsMissing);
        }

        debug!(method = %request.method, path = %request.path, "sending jira request");
        let url = self.config.url_for(&request.path);
        let mut builder = self
            .http
            .request(request.method, url)
            .basic_auth(&credentials.username, Some(&credentials.api_token));
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let (BodyFormat::Json, Some(body)) = (request.format, request.body.as_ref()) {
            builder = builder.json(body);
        }
        Ok(builder.send().await?)
    }

    async fn parse_json<T>(response: Response) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let status = response.status();
        if status.is_success() {
            response.json::<T>().await.map_err(JiraError::from)
        } else {
            Err(Self::status_error(status, response).await)
        }
    }

    async fn ensure_success(response: Response) -> Result<()> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::status_error(status, response).await)
        }
    }

    async fn status_error(status: StatusCode, response: Response) -> JiraError {
        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            JiraError::RequestDenied(format!("Access denied ({}) - {}", status, body))
        } else {
            JiraError::http(status, body)
        }
    }
}

fn build_http_client(config: &JiraConfig) -> Result<HttpClient> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&config.user_agent).map_err(|err| JiraError::Other(err.to_string()))?,
    );

    HttpClient::builder()
        .default_headers(headers)
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .build()
        .map_err(|err| JiraError::Other(err.to_string()))
}
