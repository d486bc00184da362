//! JSONL file writer for session transcripts.
//!
//! Every record carries `type`, `seq` (per-logger counter) and `timestamp`
//! next to the event payload. The file is opened in append mode so several
//! runs can share one transcript.

use live_application::ports::conversation_logger::{ConversationEvent, ConversationLogger};
use serde_json::{Map, Value};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

struct Sink {
    writer: BufWriter<File>,
    seq: u64,
}

pub struct JsonlConversationLogger {
    sink: Mutex<Sink>,
    path: PathBuf,
}

impl JsonlConversationLogger {
    /// Open `path` for appending, creating it and its parent directories.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            sink: Mutex::new(Sink {
                writer: BufWriter::new(file),
                seq: 0,
            }),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn record(event: ConversationEvent, seq: u64) -> Value {
    let mut map = match event.payload {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("data".to_string(), other);
            map
        }
    };
    map.insert("type".to_string(), Value::from(event.event_type));
    map.insert("seq".to_string(), Value::from(seq));
    map.insert(
        "timestamp".to_string(),
        Value::from(chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)),
    );
    Value::Object(map)
}

impl ConversationLogger for JsonlConversationLogger {
    fn log(&self, event: ConversationEvent) {
        let mut sink = self.sink.lock().unwrap_or_else(|e| e.into_inner());
        sink.seq += 1;
        let line = record(event, sink.seq).to_string();

        // Flushed per line; a transcript cut short by a crash stays valid JSONL
        if let Err(e) = writeln!(sink.writer, "{line}").and_then(|_| sink.writer.flush()) {
            warn!("Conversation log write to {} failed: {}", self.path.display(), e);
        }
    }
}

impl Drop for JsonlConversationLogger {
    fn drop(&mut self) {
        let sink = self.sink.get_mut().unwrap_or_else(|e| e.into_inner());
        let _ = sink.writer.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn read_lines(path: &Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn writes_one_record_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/session.jsonl");
        let logger = JsonlConversationLogger::open(&path).unwrap();

        logger.log(ConversationEvent::new(
            "turn_sent",
            json!({ "session_id": "s1", "parts": 2 }),
        ));
        logger.log(ConversationEvent::new(
            "reply_received",
            json!({ "session_id": "s1", "chars": 5 }),
        ));
        drop(logger);

        let records = read_lines(&path);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["type"], "turn_sent");
        assert_eq!(records[0]["parts"], 2);
        assert_eq!(records[0]["seq"], 1);
        assert_eq!(records[1]["type"], "reply_received");
        assert_eq!(records[1]["seq"], 2);
        assert!(records[1]["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn scalar_payload_goes_under_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.jsonl");
        let logger = JsonlConversationLogger::open(&path).unwrap();
        logger.log(ConversationEvent::new("note", json!("hello")));
        logger.log(ConversationEvent::new("empty", Value::Null));
        drop(logger);

        let records = read_lines(&path);
        assert_eq!(records[0]["data"], "hello");
        assert!(records[1].get("data").is_none());
    }

    #[test]
    fn appends_across_loggers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.jsonl");
        for _ in 0..2 {
            let logger = JsonlConversationLogger::open(&path).unwrap();
            logger.log(ConversationEvent::new("session_created", json!({})));
        }
        assert_eq!(read_lines(&path).len(), 2);
    }

    #[test]
    fn open_fails_when_parent_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        assert!(JsonlConversationLogger::open(blocker.join("t.jsonl")).is_err());
    }
}
