//! Turns and the parts they carry.

use crate::core::error::DomainError;

/// Who authored a turn. Only user turns are sent by this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
        }
    }
}

/// A unit of turn content. Each variant carries exactly one payload kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    /// Inline text.
    Text(String),
    /// Inline binary payload, already base64-encoded.
    InlineData { mime_type: String, data: String },
    /// Reference to a file hosted by the Directory Service.
    FileData { mime_type: String, file_uri: String },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(text.into())
    }

    pub fn inline(mime_type: impl Into<String>, base64_data: impl Into<String>) -> Self {
        Part::InlineData {
            mime_type: mime_type.into(),
            data: base64_data.into(),
        }
    }

    pub fn file(mime_type: impl Into<String>, file_uri: impl Into<String>) -> Self {
        Part::FileData {
            mime_type: mime_type.into(),
            file_uri: file_uri.into(),
        }
    }

    /// Short label used in logs, never the payload itself.
    pub fn kind(&self) -> &'static str {
        match self {
            Part::Text(_) => "text",
            Part::InlineData { .. } => "inline_data",
            Part::FileData { .. } => "file_data",
        }
    }
}

/// One logical user-to-model exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    role: Role,
    parts: Vec<Part>,
    complete: bool,
}

impl Turn {
    /// Builds a complete user turn. Fails when `parts` is empty.
    pub fn user(parts: Vec<Part>) -> Result<Self, DomainError> {
        if parts.is_empty() {
            return Err(DomainError::EmptyTurn);
        }
        Ok(Self {
            role: Role::User,
            parts,
            complete: true,
        })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// "No more parts follow in this turn."
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn attachment_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|p| !matches!(p, Part::Text(_)))
            .count()
    }
}
