//! Directory Service port
//!
//! Users and conversations live in an external HTTP service; this client
//! only needs to register and sign in, and to pick or create the
//! conversation a session is linked to.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from Directory Service calls
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    /// 2xx response reporting `success: false`.
    #[error("{0}")]
    Rejected(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// The signed-in (or anonymous) user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub user_id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    /// Bearer token for authenticated requests.
    pub token: Option<String>,
    pub guest: bool,
}

impl UserIdentity {
    /// A user known only by id, e.g. from `--user-id`.
    pub fn anonymous(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: None,
            email: None,
            token: None,
            guest: false,
        }
    }

    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.user_id)
    }
}

/// One row of the conversation list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSummary {
    pub conversation_id: String,
    pub title: String,
    pub updated_at: Option<String>,
}

#[async_trait]
pub trait DirectoryPort: Send + Sync {
    /// Create an account. The service mails a one-time code to `email`;
    /// returns the service's confirmation message.
    async fn register(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> Result<String, DirectoryError>;

    /// Confirm a registration with the mailed one-time code.
    async fn verify_email(&self, email: &str, otp: &str) -> Result<String, DirectoryError>;

    async fn login(&self, email: &str, password: &str) -> Result<UserIdentity, DirectoryError>;

    async fn guest_login(&self) -> Result<UserIdentity, DirectoryError>;

    async fn list_conversations(
        &self,
        user: &UserIdentity,
        limit: usize,
    ) -> Result<Vec<ConversationSummary>, DirectoryError>;

    async fn create_conversation(
        &self,
        user: &UserIdentity,
        title: &str,
        model: &str,
    ) -> Result<ConversationSummary, DirectoryError>;
}
