use std::time::Duration;

use shared::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.zoom.us/v1";

// Max page sizes documented for the report and dashboard endpoints.
pub const REPORT_PAGE_SIZE: u32 = 300;
pub const METRICS_PAGE_SIZE: u32 = 100;

// The report endpoints allow one request per second; the meeting-metrics
// endpoint allows one per minute.
pub const PAGE_WAIT: Duration = Duration::from_secs(1);
pub const METRICS_PAGE_WAIT: Duration = Duration::from_secs(60);

// Pause between per-host and per-meeting report runs, on top of the
// per-page pacing.
pub const COOLDOWN: Duration = Duration::from_secs(1);

/// Everything the pipeline needs to reach the API, passed explicitly to
/// every component.
#[derive(Debug, Clone)]
pub struct ZoomConfig {
    pub api_key: String,
    pub api_secret: String,
    pub base_url: String,
    pub page_wait: Duration,
    pub metrics_page_wait: Duration,
    pub cooldown: Duration,
}

impl ZoomConfig {
    pub fn from_env(
        key_override: Option<String>,
        secret_override: Option<String>,
    ) -> Result<Self, Error> {
        let api_key = key_override
            .or_else(|| std::env::var("ZOOM_KEY").ok())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                Error::Config("missing Zoom API key (set ZOOM_KEY or pass --key)".to_string())
            })?;
        let api_secret = secret_override
            .or_else(|| std::env::var("ZOOM_SECRET").ok())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                Error::Config(
                    "missing Zoom API secret (set ZOOM_SECRET or pass --secret)".to_string(),
                )
            })?;
        let base_url = std::env::var("ZOOM_BASE_URL")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            api_key,
            api_secret,
            base_url,
            page_wait: PAGE_WAIT,
            metrics_page_wait: METRICS_PAGE_WAIT,
            cooldown: COOLDOWN,
        })
    }
}
