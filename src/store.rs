use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::config::{PersistenceBackend, PersistenceConfig, APP_DIR};
use crate::error::StoreError;
use crate::model::message::{Message, Role};

/// One persisted turn of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl TurnRecord {
    pub fn now(message: &Message) -> Self {
        Self {
            role: message.role,
            text: message.content.clone(),
            timestamp: Utc::now(),
        }
    }
}

/// Destination for per-session turn records.
///
/// Writes are best-effort: callers log failures and carry on.
pub trait TranscriptSink: Send + Sync {
    fn record(&self, session_id: Uuid, turn: &TurnRecord) -> Result<(), StoreError>;
}

pub struct NullSink;

impl TranscriptSink for NullSink {
    fn record(&self, _: Uuid, _: &TurnRecord) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Appends JSON lines to `<dir>/<session_id>.jsonl`.
pub struct JsonlFileSink {
    dir: PathBuf,
}

impl JsonlFileSink {
    pub fn new(dir: PathBuf) -> Result<Self, StoreError> {
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn session_path(&self, session_id: Uuid) -> PathBuf {
        self.dir.join(format!("{session_id}.jsonl"))
    }

    #[cfg(test)]
    pub fn read_session(&self, session_id: Uuid) -> Result<Vec<TurnRecord>, StoreError> {
        let path = self.session_path(session_id);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let data = fs::read_to_string(path)?;
        let mut records = Vec::new();
        for line in data.lines().filter(|l| !l.trim().is_empty()) {
            records.push(serde_json::from_str(line)?);
        }
        Ok(records)
    }
}

impl TranscriptSink for JsonlFileSink {
    fn record(&self, session_id: Uuid, turn: &TurnRecord) -> Result<(), StoreError> {
        let mut line = serde_json::to_string(turn)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.session_path(session_id))?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}

/// Firestore REST: `{collection}/{session_id}/messages/<auto id>`.
pub struct FirestoreSink {
    http: Client,
    documents_url: String,
    collection: String,
    access_token: String,
}

impl FirestoreSink {
    pub fn new(project_id: &str, collection: &str, access_token: &str) -> Self {
        Self {
            http: Client::new(),
            documents_url: format!(
                "https://firestore.googleapis.com/v1/projects/{project_id}/databases/(default)/documents"
            ),
            collection: collection.to_string(),
            access_token: access_token.to_string(),
        }
    }

    fn messages_url(&self, session_id: Uuid) -> String {
        format!("{}/{}/{}/messages", self.documents_url, self.collection, session_id)
    }
}

/// Firestore's typed-field document encoding of a record.
pub fn firestore_document(turn: &TurnRecord) -> serde_json::Value {
    json!({
        "fields": {
            "role": { "stringValue": turn.role.as_str() },
            "text": { "stringValue": turn.text },
            "timestamp": { "timestampValue": turn.timestamp.to_rfc3339() },
        }
    })
}

impl TranscriptSink for FirestoreSink {
    fn record(&self, session_id: Uuid, turn: &TurnRecord) -> Result<(), StoreError> {
        let resp = self
            .http
            .post(self.messages_url(session_id))
            .bearer_auth(&self.access_token)
            .json(&firestore_document(turn))
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                body: resp.text().unwrap_or_default(),
            });
        }
        Ok(())
    }
}

fn default_sessions_dir() -> PathBuf {
    let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path.push("sessions");
    path
}

/// Picks the sink named in the config. Misconfiguration falls back to
/// [`NullSink`] so the chat itself keeps working.
pub fn open_sink(config: &PersistenceConfig) -> Arc<dyn TranscriptSink> {
    match config.backend {
        PersistenceBackend::None => Arc::new(NullSink),
        PersistenceBackend::File => {
            let dir = config.dir.clone().unwrap_or_else(default_sessions_dir);
            match JsonlFileSink::new(dir.clone()) {
                Ok(sink) => {
                    tracing::info!(dir = %dir.display(), "persisting transcripts to disk");
                    Arc::new(sink)
                }
                Err(e) => {
                    tracing::error!(dir = %dir.display(), error = %e, "cannot open transcript dir, persistence disabled");
                    Arc::new(NullSink)
                }
            }
        }
        PersistenceBackend::Firestore => {
            if config.project_id.is_empty() || config.access_token.is_empty() {
                tracing::error!("firestore persistence needs project_id and FIRESTORE_ACCESS_TOKEN, persistence disabled");
                return Arc::new(NullSink);
            }
            tracing::info!(project = %config.project_id, collection = %config.collection, "persisting transcripts to firestore");
            Arc::new(FirestoreSink::new(
                &config.project_id,
                &config.collection,
                &config.access_token,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_sink_appends_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = JsonlFileSink::new(tmp.path().join("sessions")).unwrap();
        let id = Uuid::new_v4();

        sink.record(id, &TurnRecord::now(&Message::user("Blink an LED?"))).unwrap();
        sink.record(id, &TurnRecord::now(&Message::assistant("Use pin 13."))).unwrap();

        let records = sink.read_session(id).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].role, Role::User);
        assert_eq!(records[0].text, "Blink an LED?");
        assert_eq!(records[1].role, Role::Assistant);
        assert!(records[0].timestamp <= records[1].timestamp);
    }

    #[test]
    fn sessions_are_kept_apart() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = JsonlFileSink::new(tmp.path().to_path_buf()).unwrap();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        sink.record(a, &TurnRecord::now(&Message::user("first"))).unwrap();

        assert_eq!(sink.read_session(a).unwrap().len(), 1);
        assert!(sink.read_session(b).unwrap().is_empty());
    }

    #[test]
    fn firestore_document_shape() {
        let turn = TurnRecord::now(&Message::assistant("Use analogRead()."));
        let doc = firestore_document(&turn);

        assert_eq!(doc["fields"]["role"]["stringValue"], "assistant");
        assert_eq!(doc["fields"]["text"]["stringValue"], "Use analogRead().");
        assert!(doc["fields"]["timestamp"]["timestampValue"].is_string());
    }

    #[test]
    fn firestore_without_token_falls_back() {
        let config = PersistenceConfig {
            backend: PersistenceBackend::Firestore,
            project_id: "p".into(),
            ..PersistenceConfig::default()
        };
        // NullSink accepts everything without touching the network.
        let sink = open_sink(&config);
        assert!(sink.record(Uuid::new_v4(), &TurnRecord::now(&Message::user("x"))).is_ok());
    }
}
