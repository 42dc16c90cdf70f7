use async_trait::async_trait;
use reqwest::Client;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, info};

use crate::error::Error;
use crate::models::{MeetingDocument, SessionDocument};

pub const MEETINGS_INDEX: &str = "meetings";
pub const SESSIONS_INDEX: &str = "sessions";

/// Write contract for normalized documents. Meetings are upserted by
/// occurrence uuid so re-running a day is idempotent; sessions are keyed
/// when a composite id is derivable and append-only otherwise.
#[async_trait]
pub trait DocumentSink: Send {
    async fn upsert_meeting(&mut self, meeting: &MeetingDocument) -> Result<(), Error>;

    async fn append_sessions(&mut self, sessions: &[SessionDocument]) -> Result<(), Error>;

    /// Flushes and releases the destination. Dropping without calling this
    /// still releases the underlying resource, but may lose buffered
    /// output.
    async fn finish(&mut self) -> Result<(), Error>;
}

/// Indexes documents over the document store's HTTP API.
pub struct ElasticsearchSink {
    http: Client,
    base_url: String,
}

impl ElasticsearchSink {
    /// Verifies the cluster answers before any document is produced.
    pub async fn connect(base_url: &str) -> Result<Self, Error> {
        let http = Client::new();
        let base_url = base_url.trim_end_matches('/').to_string();

        let response = http
            .get(&base_url)
            .send()
            .await
            .map_err(|e| Error::Destination(format!("cannot reach {base_url}: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::Destination(format!(
                "{base_url} answered HTTP {}",
                response.status()
            )));
        }

        info!("Connected to document store at {}", base_url);
        Ok(Self { http, base_url })
    }
}

#[async_trait]
impl DocumentSink for ElasticsearchSink {
    async fn upsert_meeting(&mut self, meeting: &MeetingDocument) -> Result<(), Error> {
        // occurrence uuids are base64 and may contain '/'
        let url = format!(
            "{}/{}/_doc/{}",
            self.base_url,
            MEETINGS_INDEX,
            urlencoding::encode(&meeting.uuid)
        );

        let response = self
            .http
            .put(&url)
            .json(meeting)
            .send()
            .await
            .map_err(|e| Error::Destination(format!("meeting upsert failed: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::Destination(format!(
                "meeting upsert answered HTTP {}",
                response.status()
            )));
        }

        debug!("Indexed meeting {}", meeting.uuid);
        Ok(())
    }

    async fn append_sessions(&mut self, sessions: &[SessionDocument]) -> Result<(), Error> {
        if sessions.is_empty() {
            return Ok(());
        }

        let mut body = String::new();
        for session in sessions {
            let action = match session.document_id() {
                Some(id) => {
                    serde_json::json!({ "index": { "_index": SESSIONS_INDEX, "_id": id } })
                }
                None => serde_json::json!({ "index": { "_index": SESSIONS_INDEX } }),
            };
            body.push_str(&action.to_string());
            body.push('\n');
            let doc = serde_json::to_string(session)
                .map_err(|e| Error::Destination(format!("session not serializable: {e}")))?;
            body.push_str(&doc);
            body.push('\n');
        }

        let response = self
            .http
            .post(format!("{}/_bulk", self.base_url))
            .header("Content-Type", "application/x-ndjson")
            .body(body)
            .send()
            .await
            .map_err(|e| Error::Destination(format!("session bulk failed: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::Destination(format!(
                "session bulk answered HTTP {}",
                response.status()
            )));
        }

        let summary: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::Destination(format!("session bulk response unreadable: {e}")))?;
        if summary["errors"].as_bool().unwrap_or(false) {
            return Err(Error::Destination(
                "session bulk reported item failures".to_string(),
            ));
        }

        debug!("Indexed {} sessions", sessions.len());
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

/// Serializes the document stream as JSON lines: each meeting on one
/// line, its sessions on the lines after it.
pub struct StreamSink<W: AsyncWrite + Unpin + Send> {
    writer: BufWriter<W>,
}

impl StreamSink<tokio::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W: AsyncWrite + Unpin + Send> StreamSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }

    async fn write_line(&mut self, line: &str) -> Result<(), Error> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> DocumentSink for StreamSink<W> {
    async fn upsert_meeting(&mut self, meeting: &MeetingDocument) -> Result<(), Error> {
        let line = serde_json::to_string(meeting)
            .map_err(|e| Error::Destination(format!("meeting not serializable: {e}")))?;
        self.write_line(&line).await
    }

    async fn append_sessions(&mut self, sessions: &[SessionDocument]) -> Result<(), Error> {
        for session in sessions {
            let line = serde_json::to_string(session)
                .map_err(|e| Error::Destination(format!("session not serializable: {e}")))?;
            self.write_line(&line).await?;
        }
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), Error> {
        self.writer.flush().await?;
        Ok(())
    }
}
