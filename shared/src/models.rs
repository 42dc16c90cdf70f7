use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Host block embedded in a meeting document. `host_id` is recovered from
/// the series listing and stays empty for one-off meetings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostInfo {
    pub host_id: String,
    pub name: String,
    pub email: String,
    pub user_type: Option<i64>,
}

/// One completed or live meeting occurrence. `uuid` is the natural
/// document key: re-indexing the same occurrence overwrites in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingDocument {
    pub uuid: String,
    /// Recurring-meeting definition this occurrence belongs to.
    pub meeting_series_id: i64,
    pub topic: String,
    pub host: HostInfo,
    pub start_time: Option<DateTime<Utc>>,
    /// Absent while a live meeting is still running.
    pub end_time: Option<DateTime<Utc>>,
    /// Seconds.
    pub duration: u64,
    /// Join events, not unique attendees.
    pub participant_sessions: u32,
    pub has_pstn: bool,
    pub has_voip: bool,
    #[serde(rename = "has_3rd_party_audio")]
    pub has_third_party_audio: bool,
    pub has_video: bool,
    pub has_screen_share: bool,
    pub recording: bool,
}

/// One participant join event. A user who drops and rejoins produces one
/// document per join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDocument {
    /// Occurrence uuid of the parent meeting.
    pub meeting: String,
    /// Per-join session id, when the API supplied one.
    pub id: Option<String>,
    pub user_id: String,
    pub user_name: String,
    pub device: Option<String>,
    pub ip_address: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub network_type: Option<String>,
    pub join_time: Option<DateTime<Utc>>,
    pub leave_time: Option<DateTime<Utc>>,
    pub share_application: bool,
    pub share_desktop: bool,
    pub share_whiteboard: bool,
    pub recording: bool,
}

impl SessionDocument {
    /// Stable composite key, derivable only when the upstream record
    /// carried a per-join session id. Without one the store assigns
    /// identity and rejoin events stay append-only.
    pub fn document_id(&self) -> Option<String> {
        self.id.as_ref().map(|id| format!("{}:{}", self.meeting, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: Option<&str>) -> SessionDocument {
        SessionDocument {
            meeting: "abc".to_string(),
            id: id.map(str::to_string),
            user_id: "u-1".to_string(),
            user_name: "Ada".to_string(),
            device: None,
            ip_address: None,
            country: None,
            city: None,
            network_type: None,
            join_time: None,
            leave_time: None,
            share_application: false,
            share_desktop: false,
            share_whiteboard: false,
            recording: false,
        }
    }

    #[test]
    fn test_document_id_combines_meeting_and_session_id() {
        assert_eq!(session(Some("s-1")).document_id().as_deref(), Some("abc:s-1"));
    }

    #[test]
    fn test_document_id_is_absent_without_a_session_id() {
        assert_eq!(session(None).document_id(), None);
    }

    #[test]
    fn test_meeting_document_serializes_the_audio_flag_with_its_wire_name() {
        let doc = MeetingDocument {
            uuid: "abc".to_string(),
            meeting_series_id: 100,
            topic: "Standup".to_string(),
            host: HostInfo {
                host_id: "h-1".to_string(),
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                user_type: Some(2),
            },
            start_time: None,
            end_time: None,
            duration: 2700,
            participant_sessions: 2,
            has_pstn: false,
            has_voip: true,
            has_third_party_audio: true,
            has_video: false,
            has_screen_share: false,
            recording: false,
        };

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["has_3rd_party_audio"], serde_json::json!(true));
        assert!(value.get("has_third_party_audio").is_none());
    }
}
