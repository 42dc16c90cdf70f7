use chrono::{DateTime, Utc};
use serde::Deserialize;

use shared::models::{HostInfo, MeetingDocument, SessionDocument};
use shared::Error;

#[derive(Debug, Deserialize)]
pub struct RawHost {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RawSeries {
    pub id: i64,
    pub host_id: String,
    #[serde(default)]
    pub topic: String,
}

#[derive(Debug, Deserialize)]
pub struct RawMeeting {
    pub uuid: String,
    /// Series id, shared across occurrences of a recurring meeting.
    pub id: i64,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub user_type: Option<i64>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    pub duration: String,
    #[serde(default)]
    pub participants: u32,
    #[serde(default)]
    pub has_pstn: bool,
    #[serde(default)]
    pub has_voip: bool,
    #[serde(rename = "has_3rd_party_audio", default)]
    pub has_third_party_audio: bool,
    #[serde(default)]
    pub has_video: bool,
    #[serde(default)]
    pub has_screen_share: bool,
    #[serde(default)]
    pub recording: bool,
}

/// One participant record per join event.
#[derive(Debug, Deserialize)]
pub struct RawParticipant {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    /// Country code; the API abbreviates the key.
    #[serde(rename = "cn", default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub network_type: Option<String>,
    #[serde(default)]
    pub join_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub leave_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub share_application: bool,
    #[serde(default)]
    pub share_desktop: bool,
    #[serde(default)]
    pub share_whiteboard: bool,
    #[serde(default)]
    pub recording: bool,
}

impl RawMeeting {
    /// `topic` and `host_id` come from the series index and stay empty
    /// for one-off meetings.
    pub fn into_document(self, topic: String, host_id: String) -> Result<MeetingDocument, Error> {
        let duration = parse_duration(&self.duration)?;

        Ok(MeetingDocument {
            uuid: self.uuid,
            meeting_series_id: self.id,
            topic,
            host: HostInfo {
                host_id,
                name: self.host,
                email: self.email,
                user_type: self.user_type,
            },
            start_time: self.start_time,
            end_time: self.end_time,
            duration,
            participant_sessions: self.participants,
            has_pstn: self.has_pstn,
            has_voip: self.has_voip,
            has_third_party_audio: self.has_third_party_audio,
            has_video: self.has_video,
            has_screen_share: self.has_screen_share,
            recording: self.recording,
        })
    }
}

impl RawParticipant {
    pub fn into_document(self, meeting_uuid: &str) -> SessionDocument {
        SessionDocument {
            meeting: meeting_uuid.to_string(),
            id: self.id,
            user_id: self.user_id,
            user_name: self.user_name,
            device: self.device,
            ip_address: self.ip_address,
            country: self.country,
            city: self.city,
            network_type: self.network_type,
            join_time: self.join_time,
            leave_time: self.leave_time,
            share_application: self.share_application,
            share_desktop: self.share_desktop,
            share_whiteboard: self.share_whiteboard,
            recording: self.recording,
        }
    }
}

/// Durations arrive as `HH:MM:SS` or, without an hours field, `MM:SS`.
/// The colon count decides which shape applies; anything else is
/// rejected.
pub fn parse_duration(text: &str) -> Result<u64, Error> {
    fn field(part: &str, text: &str) -> Result<u64, Error> {
        part.parse::<u64>()
            .map_err(|_| Error::Decode(format!("malformed duration '{text}'")))
    }

    let parts: Vec<&str> = text.split(':').collect();
    match parts.as_slice() {
        [minutes, seconds] => Ok(field(minutes, text)? * 60 + field(seconds, text)?),
        [hours, minutes, seconds] => {
            Ok(field(hours, text)? * 3600 + field(minutes, text)? * 60 + field(seconds, text)?)
        }
        _ => Err(Error::Decode(format!("malformed duration '{text}'"))),
    }
}
