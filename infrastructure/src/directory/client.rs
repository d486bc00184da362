//! reqwest client for the Directory Service.

use super::error::{ApiError, check_success, http_error_message};
use async_trait::async_trait;
use live_application::ports::directory::{
    ConversationSummary, DirectoryError, DirectoryPort, UserIdentity,
};
use live_application::ports::file_uploader::{
    FileUploader, UploadError, UploadRequest, UploadedFile,
};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Uploads of large files go through the service to the file store.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Client for the Directory Service JSON API.
#[derive(Clone)]
pub struct DirectoryClient {
    http: reqwest::Client,
    base_url: String,
}

impl DirectoryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// Send a prepared request and return the checked JSON body.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        token: Option<&str>,
    ) -> Result<Value, ApiError> {
        let request = match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => return Err(ApiError::Network(e.to_string())),
        };

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        debug!("Directory response: HTTP {} ({} bytes)", status.as_u16(), body.len());

        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
                message: http_error_message(status.as_u16(), &body),
            });
        }

        let json: Value = serde_json::from_str(&body)
            .map_err(|e| ApiError::InvalidResponse(format!("not JSON: {e}")))?;
        check_success(json)
    }

    async fn post_json(&self, endpoint: &str, body: &Value) -> Result<Value, ApiError> {
        let request = self
            .http
            .post(self.url(endpoint))
            .timeout(REQUEST_TIMEOUT)
            .json(body);
        self.send(request, None).await
    }

    async fn authenticate(&self, endpoint: &str, body: Value) -> Result<UserIdentity, ApiError> {
        let response = self.post_json(endpoint, &body).await?;
        parse_auth(&response)
    }
}

#[derive(Debug, Deserialize)]
struct AuthData {
    user: WireUser,
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUser {
    #[serde(alias = "_id", alias = "userId")]
    id: String,
    #[serde(default, alias = "displayName")]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default, alias = "isGuest")]
    guest: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireConversation {
    conversation_id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireUploadedFile {
    file_id: String,
    #[serde(default)]
    original_name: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    uri: Option<String>,
}

fn data_field(body: &Value) -> Result<&Value, ApiError> {
    body.get("data")
        .ok_or_else(|| ApiError::InvalidResponse("missing \"data\"".to_string()))
}

fn register_body(full_name: &str, email: &str, password: &str) -> Value {
    json!({
        "fullName": full_name,
        "email": email,
        "password": password,
        "acceptTerms": true,
    })
}

/// The `message` of an acknowledgement body, or `fallback`.
fn parse_message(body: &Value, fallback: &str) -> String {
    body.get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

fn parse_auth(body: &Value) -> Result<UserIdentity, ApiError> {
    let data: AuthData = serde_json::from_value(data_field(body)?.clone())
        .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
    let guest = data.user.guest.unwrap_or(false) || data.user.role.as_deref() == Some("guest");
    Ok(UserIdentity {
        user_id: data.user.id,
        display_name: data.user.name,
        email: data.user.email,
        token: data.token,
        guest,
    })
}

fn parse_conversations(body: &Value) -> Result<Vec<ConversationSummary>, ApiError> {
    let rows: Vec<WireConversation> = serde_json::from_value(data_field(body)?.clone())
        .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
    Ok(rows
        .into_iter()
        .map(|row| ConversationSummary {
            conversation_id: row.conversation_id,
            title: row.title.unwrap_or_default(),
            updated_at: row.updated_at,
        })
        .collect())
}

fn parse_created_conversation(body: &Value, title: &str) -> Result<ConversationSummary, ApiError> {
    let row: WireConversation = serde_json::from_value(data_field(body)?.clone())
        .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
    Ok(ConversationSummary {
        conversation_id: row.conversation_id,
        title: row.title.unwrap_or_else(|| title.to_string()),
        updated_at: row.updated_at,
    })
}

fn parse_upload(body: &Value, request: &UploadRequest) -> Result<UploadedFile, ApiError> {
    let first = body
        .get("files")
        .and_then(Value::as_array)
        .and_then(|files| files.first())
        .ok_or_else(|| ApiError::InvalidResponse("no files in upload response".to_string()))?;
    let file: WireUploadedFile = serde_json::from_value(first.clone())
        .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
    Ok(UploadedFile {
        file_id: file.file_id,
        original_name: file
            .original_name
            .unwrap_or_else(|| request.display_name.clone()),
        mime_type: file.mime_type.unwrap_or_else(|| request.mime_type.clone()),
        size: file.size.unwrap_or(0),
        uri: file.uri.filter(|uri| !uri.is_empty()),
    })
}

#[async_trait]
impl DirectoryPort for DirectoryClient {
    async fn register(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> Result<String, DirectoryError> {
        let body = self
            .post_json("users/register", &register_body(full_name, email, password))
            .await?;
        info!("Registration started for {}", email);
        Ok(parse_message(&body, "Verification code sent"))
    }

    async fn verify_email(&self, email: &str, otp: &str) -> Result<String, DirectoryError> {
        let body = self
            .post_json("users/verify-email", &json!({ "email": email, "otp": otp }))
            .await?;
        info!("Email verified for {}", email);
        Ok(parse_message(&body, "Email verified"))
    }

    async fn login(&self, email: &str, password: &str) -> Result<UserIdentity, DirectoryError> {
        let user = self
            .authenticate("users/login", json!({ "email": email, "password": password }))
            .await?;
        info!("Signed in as {}", user.label());
        Ok(user)
    }

    async fn guest_login(&self) -> Result<UserIdentity, DirectoryError> {
        let mut user = self.authenticate("users/guest-login", json!({})).await?;
        user.guest = true;
        info!("Signed in as guest {}", user.user_id);
        Ok(user)
    }

    async fn list_conversations(
        &self,
        user: &UserIdentity,
        limit: usize,
    ) -> Result<Vec<ConversationSummary>, DirectoryError> {
        let request = self
            .http
            .get(self.url(&format!("conversations/{}", user.user_id)))
            .query(&[("limit", limit)])
            .timeout(REQUEST_TIMEOUT);
        let body = self.send(request, user.token.as_deref()).await?;
        Ok(parse_conversations(&body)?)
    }

    async fn create_conversation(
        &self,
        user: &UserIdentity,
        title: &str,
        model: &str,
    ) -> Result<ConversationSummary, DirectoryError> {
        let request = self
            .http
            .post(self.url("conversations"))
            .timeout(REQUEST_TIMEOUT)
            .json(&json!({
                "userId": user.user_id,
                "title": title,
                "config": { "model": model },
            }));
        let body = self.send(request, user.token.as_deref()).await?;
        let conversation = parse_created_conversation(&body, title)?;
        info!("Created conversation {}", conversation.conversation_id);
        Ok(conversation)
    }
}

#[async_trait]
impl FileUploader for DirectoryClient {
    async fn upload(&self, request: &UploadRequest) -> Result<UploadedFile, UploadError> {
        let bytes = tokio::fs::read(&request.path)
            .await
            .map_err(|e| UploadError::Io(format!("{}: {}", request.path.display(), e)))?;
        debug!(
            "Uploading {} ({} bytes, {})",
            request.display_name,
            bytes.len(),
            request.mime_type
        );

        let part = Part::bytes(bytes)
            .file_name(request.display_name.clone())
            .mime_str(&request.mime_type)
            .map_err(|e| UploadError::Io(format!("invalid media type: {e}")))?;

        let mut form = Form::new()
            .part("files", part)
            .text("storageMethod", request.storage_method.clone())
            .text("userId", request.owner.user_id.clone())
            .text("displayName", request.display_name.clone());
        if let Some(conversation_id) = &request.conversation_id {
            form = form.text("conversationId", conversation_id.clone());
        }

        let builder = self
            .http
            .post(self.url("files/upload"))
            .timeout(UPLOAD_TIMEOUT)
            .multipart(form);
        let body = self
            .send(builder, request.owner.token.as_deref())
            .await
            .inspect_err(|e| warn!("Upload of {} failed: {}", request.display_name, e))?;

        Ok(parse_upload(&body, request)?)
    }
}
