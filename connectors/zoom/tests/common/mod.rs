use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use meetsync_zoom_connector::client::{ReportApi, ReportParams};
use shared::models::{MeetingDocument, SessionDocument};
use shared::sink::DocumentSink;
use shared::Error;

/// Serves canned report pages. A route is an endpoint plus its scoping
/// parameter (`host_id` or `meeting_id`); `page_number` selects within
/// the route.
pub struct FixtureApi {
    routes: HashMap<String, Vec<Value>>,
    requests: Mutex<Vec<String>>,
}

fn route_key(endpoint: &str, scope: Option<&str>) -> String {
    match scope {
        Some(scope) => format!("{endpoint}?{scope}"),
        None => endpoint.to_string(),
    }
}

impl FixtureApi {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn route(mut self, endpoint: &str, scope: Option<&str>, pages: Vec<Value>) -> Self {
        self.routes.insert(route_key(endpoint, scope), pages);
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ReportApi for FixtureApi {
    async fn fetch_page(&self, endpoint: &str, params: &ReportParams) -> Result<Value, Error> {
        let scope = params.host_id.as_deref().or(params.meeting_id.as_deref());
        let key = route_key(endpoint, scope);
        self.requests.lock().unwrap().push(key.clone());

        let pages = self
            .routes
            .get(&key)
            .ok_or_else(|| Error::Api(format!("no fixture for {key}")))?;
        let index = (params.page_number as usize).saturating_sub(1);
        pages
            .get(index)
            .cloned()
            .ok_or_else(|| Error::Api(format!("no fixture page {} for {key}", params.page_number)))
    }
}

/// Upsert-by-key store standing in for the document index.
#[derive(Default)]
pub struct MemorySink {
    pub meetings: HashMap<String, MeetingDocument>,
    pub keyed_sessions: HashMap<String, SessionDocument>,
    pub unkeyed_sessions: Vec<SessionDocument>,
    pub finished: bool,
}

#[async_trait]
impl DocumentSink for MemorySink {
    async fn upsert_meeting(&mut self, meeting: &MeetingDocument) -> Result<(), Error> {
        self.meetings.insert(meeting.uuid.clone(), meeting.clone());
        Ok(())
    }

    async fn append_sessions(&mut self, sessions: &[SessionDocument]) -> Result<(), Error> {
        for session in sessions {
            match session.document_id() {
                Some(id) => {
                    self.keyed_sessions.insert(id, session.clone());
                }
                None => self.unkeyed_sessions.push(session.clone()),
            }
        }
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), Error> {
        self.finished = true;
        Ok(())
    }
}
