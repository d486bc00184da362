//! The active context a turn runs in.

use crate::config::{AttachmentSettings, LiveTimeouts};
use crate::ports::directory::UserIdentity;
use live_domain::SessionConfig;
use std::path::PathBuf;

/// Who is talking, in which conversation, with which session settings.
///
/// Immutable: reconfiguring (sign-in, switching conversation, reconnect with
/// other settings) produces a new value that replaces the old one wholesale.
#[derive(Debug, Clone)]
pub struct LiveContext {
    user: Option<UserIdentity>,
    session: SessionConfig,
    timeouts: LiveTimeouts,
    attachments: AttachmentSettings,
    /// Relative attachment paths resolve against this directory.
    working_dir: PathBuf,
}

impl LiveContext {
    pub fn new(session: SessionConfig, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            user: None,
            session,
            timeouts: LiveTimeouts::default(),
            attachments: AttachmentSettings::default(),
            working_dir: working_dir.into(),
        }
    }

    /// Replace the user; the session config's user id follows.
    pub fn with_user(self, user: Option<UserIdentity>) -> Self {
        let user_id = user.as_ref().map(|u| u.user_id.clone());
        Self {
            session: self.session.with_user(user_id),
            user,
            ..self
        }
    }

    pub fn with_session(self, session: SessionConfig) -> Self {
        Self { session, ..self }
    }

    pub fn with_timeouts(self, timeouts: LiveTimeouts) -> Self {
        Self { timeouts, ..self }
    }

    pub fn with_attachments(self, attachments: AttachmentSettings) -> Self {
        Self {
            attachments,
            ..self
        }
    }

    pub fn user(&self) -> Option<&UserIdentity> {
        self.user.as_ref()
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.session.conversation_id.as_deref()
    }

    pub fn session(&self) -> &SessionConfig {
        &self.session
    }

    pub fn timeouts(&self) -> &LiveTimeouts {
        &self.timeouts
    }

    pub fn attachments(&self) -> &AttachmentSettings {
        &self.attachments
    }

    pub fn working_dir(&self) -> &std::path::Path {
        &self.working_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_change_updates_session_user_id() {
        let ctx = LiveContext::new(SessionConfig::default(), "/tmp");
        assert!(ctx.session().user_id.is_none());

        let ctx = ctx.with_user(Some(UserIdentity::anonymous("u-42")));
        assert_eq!(ctx.session().user_id.as_deref(), Some("u-42"));
        assert_eq!(ctx.user().map(|u| u.label()), Some("u-42"));

        let ctx = ctx.with_user(None);
        assert!(ctx.session().user_id.is_none());
    }
}
