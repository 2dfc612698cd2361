#[cfg(test)]
#[path = "client_test.rs"]
mod tests;

use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use super::ChatStream;
use super::CredentialStore;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Document;
use crate::domain::models::Message;
use crate::domain::models::Session;
use crate::domain::models::User;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request could not be sent or the stream could not open.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// A 401 outside the auth endpoints. The stored credential has already
    /// been cleared by the time the caller sees this.
    #[error("session expired, please log in again")]
    CredentialExpired,
    #[error("credential store: {0}")]
    Storage(#[from] std::io::Error),
    /// Any other non-success response, carrying the backend's `detail`
    /// message when one was provided.
    #[error("{0}")]
    Api(String),
}

#[derive(Serialize)]
pub struct StreamRequest {
    pub message: String,
    pub session_id: Option<i64>,
    pub provider: Option<String>,
    pub model: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Serialize)]
struct RegisterPayload {
    email: String,
    password: String,
}

#[derive(Serialize)]
struct TitlePayload {
    title: Option<String>,
}

#[derive(Serialize)]
struct FilenamePayload {
    filename: String,
}

/// Typed wrapper over the backend's REST/SSE surface. Every request attaches
/// the stored bearer credential when one exists.
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    credentials: Arc<CredentialStore>,
}

impl ApiClient {
    pub fn new(base_url: &str, credentials: Arc<CredentialStore>) -> ApiClient {
        return ApiClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            credentials,
        };
    }

    pub fn from_config(credentials: Arc<CredentialStore>) -> ApiClient {
        return ApiClient::new(&Config::get(ConfigKey::ApiURL), credentials);
    }

    pub fn credentials(&self) -> &CredentialStore {
        return &self.credentials;
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .http
            .request(method, format!("{}{path}", self.base_url));

        if let Some(token) = self.credentials.get() {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }

        return builder;
    }

    /// Converts non-success responses into the error taxonomy. A 401 clears
    /// the stored credential, except on the auth endpoints themselves where
    /// a bad password is an ordinary error and must not recurse into the
    /// expiry path.
    async fn check(
        &self,
        res: reqwest::Response,
        auth_endpoint: bool,
    ) -> Result<reqwest::Response, ApiError> {
        let status = res.status();
        if status == reqwest::StatusCode::UNAUTHORIZED && !auth_endpoint {
            if let Err(err) = self.credentials.clear().await {
                tracing::warn!(error = %err, "failed to remove stored credential");
            }
            tracing::info!("credential rejected by backend, cleared");
            return Err(ApiError::CredentialExpired);
        }

        if !status.is_success() {
            let detail = match res.json::<ErrorBody>().await {
                Ok(body) => body.detail,
                Err(_) => format!("request failed with status {}", status.as_u16()),
            };
            return Err(ApiError::Api(detail));
        }

        return Ok(res);
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let res = self
            .request(reqwest::Method::POST, "/auth/register")
            .json(&RegisterPayload {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;

        let user = self.check(res, true).await?.json::<User>().await?;
        return Ok(user);
    }

    /// OAuth2 password flow: form-encoded `username`/`password`. The
    /// returned token is persisted before this resolves.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), ApiError> {
        let res = self
            .request(reqwest::Method::POST, "/auth/login")
            .form(&[("username", email), ("password", password)])
            .send()
            .await?;

        let token = self.check(res, true).await?.json::<TokenResponse>().await?;
        self.credentials.set(&token.access_token).await?;

        return Ok(());
    }

    pub async fn me(&self) -> Result<User, ApiError> {
        let res = self.request(reqwest::Method::GET, "/auth/me").send().await?;
        let user = self.check(res, false).await?.json::<User>().await?;
        return Ok(user);
    }

    pub async fn upload(&self, file_name: &str, payload: Vec<u8>) -> Result<Document, ApiError> {
        let part = reqwest::multipart::Part::bytes(payload).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let res = self
            .request(reqwest::Method::POST, "/upload")
            .multipart(form)
            .send()
            .await?;

        let document = self.check(res, false).await?.json::<Document>().await?;
        return Ok(document);
    }

    pub async fn list_documents(&self) -> Result<Vec<Document>, ApiError> {
        let res = self.request(reqwest::Method::GET, "/docs").send().await?;
        let documents = self.check(res, false).await?.json::<Vec<Document>>().await?;
        return Ok(documents);
    }

    pub async fn rename_document(&self, id: i64, filename: &str) -> Result<Document, ApiError> {
        let res = self
            .request(reqwest::Method::PATCH, &format!("/docs/{id}"))
            .json(&FilenamePayload {
                filename: filename.to_string(),
            })
            .send()
            .await?;

        let document = self.check(res, false).await?.json::<Document>().await?;
        return Ok(document);
    }

    pub async fn delete_document(&self, id: i64) -> Result<(), ApiError> {
        let res = self
            .request(reqwest::Method::DELETE, &format!("/docs/{id}"))
            .send()
            .await?;

        self.check(res, false).await?;
        return Ok(());
    }

    /// Provider name to ordered model list, in the order the backend
    /// reports them. First provider / first model is the default selection.
    pub async fn providers(&self) -> Result<Vec<(String, Vec<String>)>, ApiError> {
        let res = self
            .request(reqwest::Method::GET, "/chat/providers")
            .send()
            .await?;

        let map = self
            .check(res, false)
            .await?
            .json::<serde_json::Map<String, serde_json::Value>>()
            .await?;

        let providers = map
            .into_iter()
            .map(|(name, models)| {
                let models = models
                    .as_array()
                    .map(|entries| {
                        return entries
                            .iter()
                            .filter_map(|entry| return entry.as_str().map(str::to_string))
                            .collect::<Vec<String>>();
                    })
                    .unwrap_or_default();

                return (name, models);
            })
            .collect::<Vec<(String, Vec<String>)>>();

        return Ok(providers);
    }

    pub async fn create_session(&self, title: Option<&str>) -> Result<Session, ApiError> {
        let res = self
            .request(reqwest::Method::POST, "/chat/sessions")
            .json(&TitlePayload {
                title: title.map(str::to_string),
            })
            .send()
            .await?;

        let session = self.check(res, false).await?.json::<Session>().await?;
        return Ok(session);
    }

    pub async fn list_sessions(&self) -> Result<Vec<Session>, ApiError> {
        let res = self
            .request(reqwest::Method::GET, "/chat/sessions")
            .send()
            .await?;

        let sessions = self.check(res, false).await?.json::<Vec<Session>>().await?;
        return Ok(sessions);
    }

    pub async fn rename_session(&self, id: i64, title: &str) -> Result<Session, ApiError> {
        let res = self
            .request(reqwest::Method::PATCH, &format!("/chat/sessions/{id}"))
            .json(&TitlePayload {
                title: Some(title.to_string()),
            })
            .send()
            .await?;

        let session = self.check(res, false).await?.json::<Session>().await?;
        return Ok(session);
    }

    pub async fn delete_session(&self, id: i64) -> Result<(), ApiError> {
        let res = self
            .request(reqwest::Method::DELETE, &format!("/chat/sessions/{id}"))
            .send()
            .await?;

        self.check(res, false).await?;
        return Ok(());
    }

    pub async fn session_messages(&self, id: i64) -> Result<Vec<Message>, ApiError> {
        let res = self
            .request(reqwest::Method::GET, &format!("/chat/sessions/{id}/messages"))
            .send()
            .await?;

        let messages = self.check(res, false).await?.json::<Vec<Message>>().await?;
        return Ok(messages);
    }

    /// Opens the per-message event stream. The response body is handed to a
    /// ChatStream; terminal handling is the controller's job.
    pub async fn open_stream(&self, request: &StreamRequest) -> Result<ChatStream, ApiError> {
        let res = self
            .request(reqwest::Method::POST, "/chat/stream")
            .json(request)
            .send()
            .await?;

        let res = self.check(res, false).await?;
        return Ok(ChatStream::new(res.bytes_stream()));
    }
}
