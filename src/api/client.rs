//! HTTP client adapter.
//!
//! Wraps every outbound call: injects the bearer token read from durable
//! storage at request time, normalizes failures into [`ClientError`] and
//! ends the session when the server rejects the credentials.

use reqwest::{multipart::Form, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::error::{ClientError, ServerError};
use crate::config::ApiConfig;
use crate::navigation::Navigator;
use crate::routes::paths;
use crate::session::SessionStore;

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    pub fn new(
        config: &ApiConfig,
        session: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("univault/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Request(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
            navigator,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ClientError> {
        let response = self.send(self.http.get(self.url(path)).query(query)).await?;
        read_json(response).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Value, ClientError> {
        let response = self.send(self.http.post(self.url(path)).json(body)).await?;
        read_json(response).await
    }

    pub async fn post_multipart(&self, path: &str, form: Form) -> Result<Value, ClientError> {
        let response = self
            .send(self.http.post(self.url(path)).multipart(form))
            .await?;
        read_json(response).await
    }

    pub async fn get_bytes(&self, path: &str) -> Result<Vec<u8>, ClientError> {
        let response = self.send(self.http.get(self.url(path))).await?;
        let bytes = response.bytes().await.map_err(ClientError::Network)?;
        Ok(bytes.to_vec())
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ClientError> {
        // Storage, not memory: the store may not be rehydrated yet
        let builder = match self.session.persisted_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };

        let request = builder.build().map_err(|e| {
            warn!(error = %e, "Failed to build request");
            ClientError::Request(e.to_string())
        })?;

        let method = request.method().clone();
        let path = request.url().path().to_string();
        debug!(%method, %path, "Sending request");

        let response = self.http.execute(request).await.map_err(|e| {
            warn!(%method, %path, error = %e, "No response from server");
            ClientError::Network(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let error = ServerError::from_body(status, &text);

        if status == StatusCode::UNAUTHORIZED {
            warn!(%method, %path, "Credentials rejected, ending session");
            self.session.logout();
            self.navigator.navigate(paths::LOGIN);
            return Err(ClientError::AuthExpired {
                message: error.message,
            });
        }

        debug!(%method, %path, status = status.as_u16(), message = %error.message, "Server rejected request");
        Err(ClientError::Server(error))
    }
}

async fn read_json(response: Response) -> Result<Value, ClientError> {
    let text = response.text().await.map_err(ClientError::Network)?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|e| ClientError::Decode(e.to_string()))
}
