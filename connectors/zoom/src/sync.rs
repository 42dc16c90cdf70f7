use std::collections::HashMap;

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{info, warn};

use shared::models::{MeetingDocument, SessionDocument};
use shared::pacing::{pause, Pacer};
use shared::sink::DocumentSink;
use shared::{CancelFlag, Error};

use crate::client::{fetch_records, ReportApi, ReportParams, ReportQuery};
use crate::config::{ZoomConfig, METRICS_PAGE_SIZE, REPORT_PAGE_SIZE};
use crate::models::{RawHost, RawMeeting, RawParticipant, RawSeries};

/// Dashboard report variant: meetings still running, or occurrences that
/// already ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeetingType {
    Live,
    Completed,
}

impl MeetingType {
    fn as_param(self) -> u8 {
        match self {
            MeetingType::Live => 1,
            MeetingType::Completed => 2,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ExportOptions {
    pub date: NaiveDate,
    pub meeting_type: MeetingType,
}

#[derive(Debug, Clone, PartialEq)]
struct SeriesInfo {
    topic: String,
    host_id: String,
}

#[derive(Debug, Default)]
pub struct ExportStats {
    pub meetings: u64,
    pub sessions: u64,
}

pub struct MeetingExport {
    pub meeting: MeetingDocument,
    pub sessions: Vec<SessionDocument>,
}

async fn active_hosts(
    api: &dyn ReportApi,
    config: &ZoomConfig,
    date: NaiveDate,
    cancel: &CancelFlag,
) -> Result<Vec<String>, Error> {
    let day = date.format("%Y-%m-%d").to_string();
    let params = ReportParams::new(config, REPORT_PAGE_SIZE).date_range(&day, &day);
    let pacer = Pacer::new(config.page_wait);

    let records = fetch_records(
        api,
        &pacer,
        cancel,
        ReportQuery::new("/report/getaccountreport", "users"),
        params,
    )
    .await?;

    let mut hosts = Vec::with_capacity(records.len());
    for record in records {
        let host: RawHost = serde_json::from_value(record)?;
        hosts.push(host.user_id);
    }

    info!("Found {} active hosts for {}", hosts.len(), day);
    Ok(hosts)
}

/// Maps series ids to topic and host so metrics records can be
/// re-associated with the meeting definitions they came from.
async fn build_series_index(
    api: &dyn ReportApi,
    config: &ZoomConfig,
    hosts: &[String],
    cancel: &CancelFlag,
) -> Result<HashMap<i64, SeriesInfo>, Error> {
    let mut index = HashMap::new();

    for host_id in hosts {
        let params = ReportParams::new(config, REPORT_PAGE_SIZE).host(host_id);
        let pacer = Pacer::new(config.page_wait);

        let records = fetch_records(
            api,
            &pacer,
            cancel,
            ReportQuery::new("/meeting/list", "meetings"),
            params,
        )
        .await?;

        for record in records {
            let series: RawSeries = serde_json::from_value(record)?;
            let entry = SeriesInfo {
                topic: series.topic,
                host_id: series.host_id,
            };
            if let Some(previous) = index.insert(series.id, entry) {
                warn!(
                    "Series {} listed under both {} and {}, keeping the later entry",
                    series.id, previous.host_id, host_id
                );
            }
        }

        // stay under the per-account quota between hosts
        pause(config.cooldown, cancel).await?;
    }

    info!("Built series index with {} entries", index.len());
    Ok(index)
}

/// Lazily yields one meeting occurrence at a time, fetching its
/// participant sessions on demand so a large day never sits in memory all
/// at once.
pub struct ExportStream<'a> {
    api: &'a dyn ReportApi,
    config: &'a ZoomConfig,
    cancel: &'a CancelFlag,
    options: ExportOptions,
    series: HashMap<i64, SeriesInfo>,
    meetings: std::vec::IntoIter<Value>,
}

impl<'a> ExportStream<'a> {
    pub async fn open(
        api: &'a dyn ReportApi,
        config: &'a ZoomConfig,
        options: ExportOptions,
        cancel: &'a CancelFlag,
    ) -> Result<ExportStream<'a>, Error> {
        let hosts = active_hosts(api, config, options.date, cancel).await?;
        let series = build_series_index(api, config, &hosts, cancel).await?;

        let day = options.date.format("%Y-%m-%d").to_string();
        let params = ReportParams::new(config, METRICS_PAGE_SIZE)
            .date_range(&day, &day)
            .meeting_type(options.meeting_type.as_param());
        // the metrics endpoint enforces the strict per-minute quota
        let pacer = Pacer::new(config.metrics_page_wait);

        let meetings = fetch_records(
            api,
            &pacer,
            cancel,
            ReportQuery::new("/metrics/meetings", "meetings"),
            params,
        )
        .await?;
        info!("Found {} meeting occurrences for {}", meetings.len(), day);

        Ok(Self {
            api,
            config,
            cancel,
            options,
            series,
            meetings: meetings.into_iter(),
        })
    }

    /// Next (meeting, sessions) pair in discovery order, `None` once the
    /// day is exhausted.
    pub async fn next(&mut self) -> Result<Option<MeetingExport>, Error> {
        let Some(record) = self.meetings.next() else {
            return Ok(None);
        };

        let raw: RawMeeting = serde_json::from_value(record)?;
        // one-off meetings have no series entry; empty metadata is expected
        let (topic, host_id) = match self.series.get(&raw.id) {
            Some(series) => (series.topic.clone(), series.host_id.clone()),
            None => (String::new(), String::new()),
        };
        let meeting = raw.into_document(topic, host_id)?;

        let sessions = self.fetch_sessions(&meeting.uuid).await?;
        pause(self.config.cooldown, self.cancel).await?;

        Ok(Some(MeetingExport { meeting, sessions }))
    }

    async fn fetch_sessions(&self, uuid: &str) -> Result<Vec<SessionDocument>, Error> {
        let params = ReportParams::new(self.config, METRICS_PAGE_SIZE)
            .meeting(uuid)
            .meeting_type(self.options.meeting_type.as_param());
        let pacer = Pacer::new(self.config.page_wait);

        let records = fetch_records(
            self.api,
            &pacer,
            self.cancel,
            ReportQuery::new("/metrics/meetingdetail", "participants")
                .count_key("participants_count"),
            params,
        )
        .await?;

        let mut sessions = Vec::with_capacity(records.len());
        for record in records {
            let participant: RawParticipant = serde_json::from_value(record)?;
            sessions.push(participant.into_document(uuid));
        }
        Ok(sessions)
    }
}

/// Drives the full day: discovery, then one sink write per occurrence.
/// The first fatal error from any stage aborts the run; documents already
/// written stay written.
pub async fn run(
    api: &dyn ReportApi,
    config: &ZoomConfig,
    options: ExportOptions,
    sink: &mut dyn DocumentSink,
    cancel: &CancelFlag,
) -> Result<ExportStats, Error> {
    let mut stream = ExportStream::open(api, config, options, cancel).await?;
    let mut stats = ExportStats::default();

    while let Some(export) = stream.next().await? {
        sink.upsert_meeting(&export.meeting).await?;
        sink.append_sessions(&export.sessions).await?;
        stats.meetings += 1;
        stats.sessions += export.sessions.len() as u64;
        info!(
            "Exported meeting {} with {} sessions",
            export.meeting.uuid,
            export.sessions.len()
        );
    }

    sink.finish().await?;
    Ok(stats)
}
