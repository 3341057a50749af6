//! HTTP client for the API under test
//!
//! One method per endpoint. Each call sends exactly one request, with no
//! retries and no caching, and hands back the whole response so the
//! assertion layer can judge it.

use reqwest::{Client, IntoUrl, Method, RequestBuilder, StatusCode, Url};
use serde::Deserialize;

use crate::config::HarnessConfig;
use crate::error::{HarnessError, Result, LOGIN_OPERATION};
use crate::models::{LoginRequest, NewSubject, PredictionRequest, SubjectId};

/// A fully read response
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// Which harness operation produced it, for failure messages
    pub operation: &'static str,
    pub status: StatusCode,
    pub body: String,
}

/// Unauthenticated entry point: holds the HTTP client and the config
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    config: HarnessConfig,
}

impl ApiClient {
    pub fn new(config: HarnessConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|e| {
            HarnessError::Configuration(format!("failed to build HTTP client: {}", e))
        })?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Log in with the configured credentials.
    ///
    /// Anything other than 200 with a non-empty `access_token` string is a
    /// setup failure, since no later call can be made without the token.
    pub async fn login(&self) -> Result<Session> {
        #[derive(Deserialize)]
        struct LoginResponse {
            access_token: Option<serde_json::Value>,
        }

        let payload = LoginRequest {
            username: self.config.username.clone(),
            password: self.config.password.clone(),
        };
        let request = self.http.post(self.config.url("/login")).json(&payload);
        let response = execute(LOGIN_OPERATION, request).await?;

        if response.status != StatusCode::OK {
            tracing::error!(status = %response.status, "Login rejected");
            return Err(HarnessError::Setup {
                status: response.status,
                body: response.body,
            });
        }

        let parsed: LoginResponse =
            serde_json::from_str(&response.body).map_err(|e| HarnessError::Shape {
                operation: LOGIN_OPERATION,
                message: format!("response is not a JSON object: {}", e),
                body: response.body.clone(),
            })?;

        let token = match parsed.access_token {
            Some(serde_json::Value::String(token)) if !token.is_empty() => token,
            Some(serde_json::Value::String(_)) => {
                return Err(HarnessError::Shape {
                    operation: LOGIN_OPERATION,
                    message: "'access_token' is an empty string".to_string(),
                    body: response.body,
                })
            }
            Some(_) => {
                return Err(HarnessError::Shape {
                    operation: LOGIN_OPERATION,
                    message: "'access_token' is not a string".to_string(),
                    body: response.body,
                })
            }
            None => {
                return Err(HarnessError::Shape {
                    operation: LOGIN_OPERATION,
                    message: "response has no 'access_token' key".to_string(),
                    body: response.body,
                })
            }
        };

        tracing::info!(base_url = %self.config.base_url, "Logged in");
        Ok(Session {
            http: self.http.clone(),
            config: self.config.clone(),
            token,
        })
    }
}

/// An authenticated session; every call carries the bearer token.
///
/// Read-only once built, so stages share it by reference.
#[derive(Clone)]
pub struct Session {
    http: Client,
    config: HarnessConfig,
    token: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.config.base_url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl Session {
    pub fn token(&self) -> &str {
        &self.token
    }

    fn request(&self, method: Method, url: impl IntoUrl) -> RequestBuilder {
        self.http.request(method, url).bearer_auth(&self.token)
    }

    /// `/users/{id}`, with the id percent-encoded as a single path segment
    fn subject_url(&self, id: &SubjectId) -> Result<Url> {
        let mut url = Url::parse(&self.config.url("/users")).map_err(|e| {
            HarnessError::Configuration(format!(
                "invalid base URL '{}': {}",
                self.config.base_url, e
            ))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                HarnessError::Configuration(format!(
                    "base URL '{}' cannot carry a path",
                    self.config.base_url
                ))
            })?
            .push(&id.path_segment());
        Ok(url)
    }

    pub async fn create_subject(&self, subject: &NewSubject) -> Result<ApiResponse> {
        let request = self
            .request(Method::POST, self.config.url("/users"))
            .json(subject);
        execute("create subject", request).await
    }

    pub async fn get_subject(&self, id: &SubjectId) -> Result<ApiResponse> {
        let request = self.request(Method::GET, self.subject_url(id)?);
        execute("retrieve subject", request).await
    }

    pub async fn update_subject(&self, id: &SubjectId, subject: &NewSubject) -> Result<ApiResponse> {
        let request = self
            .request(Method::PUT, self.subject_url(id)?)
            .json(subject);
        execute("update subject", request).await
    }

    pub async fn list_subjects(&self) -> Result<ApiResponse> {
        let request = self.request(Method::GET, self.config.url("/users"));
        execute("list subjects", request).await
    }

    pub async fn delete_subject(&self, id: &SubjectId) -> Result<ApiResponse> {
        let request = self.request(Method::DELETE, self.subject_url(id)?);
        execute("delete subject", request).await
    }

    pub async fn predict(&self, input: &PredictionRequest) -> Result<ApiResponse> {
        let request = self
            .request(Method::POST, self.config.url("/predict"))
            .json(input);
        execute("prediction", request).await
    }
}

async fn execute(operation: &'static str, request: RequestBuilder) -> Result<ApiResponse> {
    let response = request
        .send()
        .await
        .map_err(|source| HarnessError::Transport { operation, source })?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|source| HarnessError::Transport { operation, source })?;

    tracing::debug!(operation, status = %status, body_len = body.len(), "Response received");
    Ok(ApiResponse {
        operation,
        status,
        body,
    })
}
