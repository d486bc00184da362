//! Append-only log of inbound protocol events for one connection.
//!
//! The reader task is the only writer. Waiters subscribe to an append
//! counter and rescan from the start after every append, so a wait can
//! never miss an event that arrived between the scan and the sleep.
//!
//! Correlation is by event type only: the first entry (from connection
//! start) whose type is in the requested set wins. This is sound because a
//! connection carries exactly one session and requests carry no ids.

use crate::live::error::{LiveError, Result};
use crate::live::protocol::InboundMessage;
use chrono::{DateTime, Utc};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;

/// One received event.
#[derive(Debug, Clone)]
pub struct MailboxEntry {
    pub kind: String,
    pub received_at: DateTime<Utc>,
    pub message: InboundMessage,
}

#[derive(Debug)]
pub struct Mailbox {
    entries: Mutex<Vec<MailboxEntry>>,
    /// Number of appends so far; `None` once the connection is gone.
    appended: watch::Sender<Option<usize>>,
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Mailbox {
    pub fn new() -> Self {
        let (appended, _) = watch::channel(Some(0));
        Self {
            entries: Mutex::new(Vec::new()),
            appended,
        }
    }

    pub fn append(&self, kind: impl Into<String>, message: InboundMessage) {
        let len = {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            entries.push(MailboxEntry {
                kind: kind.into(),
                received_at: Utc::now(),
                message,
            });
            entries.len()
        };
        self.appended.send_replace(Some(len));
    }

    /// Mark the connection closed; pending and future waits stop waiting.
    pub fn close(&self) {
        self.appended.send_replace(None);
    }

    pub fn is_closed(&self) -> bool {
        self.appended.borrow().is_none()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of every entry, oldest first.
    pub fn entries(&self) -> Vec<MailboxEntry> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// First entry, scanning from connection start, whose kind is in `kinds`.
    pub fn find_first(&self, kinds: &[&str]) -> Option<MailboxEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .find(|entry| kinds.contains(&entry.kind.as_str()))
            .cloned()
    }

    /// Wait until an entry of one of `kinds` is present.
    ///
    /// Returns [`LiveError::Timeout`] after `timeout` and
    /// [`LiveError::TransportClosed`] if the connection closes first.
    pub async fn wait_for_any(
        &self,
        kinds: &[&str],
        what: &'static str,
        timeout: Duration,
    ) -> Result<MailboxEntry> {
        let mut rx = self.appended.subscribe();
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            if let Some(entry) = self.find_first(kinds) {
                return Ok(entry);
            }
            if rx.borrow_and_update().is_none() {
                return Err(LiveError::TransportClosed);
            }
            match tokio::time::timeout_at(deadline, rx.changed()).await {
                Ok(Ok(())) => continue,
                Ok(Err(_)) => return Err(LiveError::TransportClosed),
                Err(_) => {
                    return Err(LiveError::Timeout {
                        what,
                        after: timeout,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn created(id: &str) -> InboundMessage {
        InboundMessage::SessionCreated {
            session_id: id.into(),
            upstream_session_id: None,
        }
    }

    #[test]
    fn first_match_wins() {
        let mailbox = Mailbox::new();
        mailbox.append("connection", InboundMessage::Connection { message: None });
        mailbox.append("session_created", created("first"));
        mailbox.append("session_created", created("second"));

        let entry = mailbox.find_first(&["session_created", "session_error"]).unwrap();
        assert!(matches!(
            entry.message,
            InboundMessage::SessionCreated { ref session_id, .. } if session_id == "first"
        ));
        assert_eq!(mailbox.len(), 3);
    }

    #[tokio::test]
    async fn entry_already_present_returns_immediately() {
        let mailbox = Mailbox::new();
        mailbox.append("session_created", created("s"));
        let entry = mailbox
            .wait_for_any(&["session_created"], "ack", Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(entry.kind, "session_created");
    }

    #[tokio::test]
    async fn wakes_on_append() {
        let mailbox = Arc::new(Mailbox::new());
        let writer = Arc::clone(&mailbox);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            writer.append("ping", InboundMessage::Ping {});
            writer.append("session_created", created("late"));
        });

        let entry = mailbox
            .wait_for_any(&["session_created"], "ack", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(entry.kind, "session_created");
    }

    #[tokio::test]
    async fn times_out_without_match() {
        let mailbox = Mailbox::new();
        mailbox.append("ping", InboundMessage::Ping {});
        let result = mailbox
            .wait_for_any(&["session_created"], "ack", Duration::from_millis(30))
            .await;
        assert!(matches!(result, Err(LiveError::Timeout { what: "ack", .. })));
    }

    #[tokio::test]
    async fn close_ends_waits() {
        let mailbox = Arc::new(Mailbox::new());
        let closer = Arc::clone(&mailbox);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            closer.close();
        });
        let result = mailbox
            .wait_for_any(&["session_created"], "ack", Duration::from_secs(5))
            .await;
        assert!(matches!(result, Err(LiveError::TransportClosed)));
        assert!(mailbox.is_closed());
    }
}
