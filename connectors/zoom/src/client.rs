use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use shared::pacing::Pacer;
use shared::{CancelFlag, Error};

use crate::config::ZoomConfig;

/// Form-encoded body for one report request. `page_number` is advanced
/// by the paginator.
#[derive(Debug, Clone, Serialize)]
pub struct ReportParams {
    pub api_key: String,
    pub api_secret: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub meeting_type: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_id: Option<String>,
    pub page_size: u32,
    pub page_number: u32,
}

impl ReportParams {
    pub fn new(config: &ZoomConfig, page_size: u32) -> Self {
        Self {
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            from: None,
            to: None,
            meeting_type: None,
            host_id: None,
            meeting_id: None,
            page_size,
            page_number: 1,
        }
    }

    pub fn date_range(mut self, from: &str, to: &str) -> Self {
        self.from = Some(from.to_string());
        self.to = Some(to.to_string());
        self
    }

    pub fn meeting_type(mut self, meeting_type: u8) -> Self {
        self.meeting_type = Some(meeting_type);
        self
    }

    pub fn host(mut self, host_id: &str) -> Self {
        self.host_id = Some(host_id.to_string());
        self
    }

    pub fn meeting(mut self, meeting_id: &str) -> Self {
        self.meeting_id = Some(meeting_id.to_string());
        self
    }
}

/// One page exchange against the reporting API. Tests substitute fixture
/// pages for the HTTP client.
#[async_trait]
pub trait ReportApi: Send + Sync {
    async fn fetch_page(&self, endpoint: &str, params: &ReportParams) -> Result<Value, Error>;
}

#[derive(Clone)]
pub struct ZoomClient {
    http: Client,
    base_url: String,
}

impl ZoomClient {
    pub fn new(config: &ZoomConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ReportApi for ZoomClient {
    async fn fetch_page(&self, endpoint: &str, params: &ReportParams) -> Result<Value, Error> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("Requesting page {} of {}", params.page_number, url);

        let response = self.http.post(&url).form(params).send().await?;
        let response = response.error_for_status()?;
        let body = response.json::<Value>().await?;
        Ok(body)
    }
}

/// Which key holds a report's records and which reports its total.
/// Endpoints disagree on both.
#[derive(Debug, Clone, Copy)]
pub struct ReportQuery<'a> {
    pub endpoint: &'a str,
    pub records_key: &'a str,
    pub count_key: &'a str,
}

impl<'a> ReportQuery<'a> {
    pub fn new(endpoint: &'a str, records_key: &'a str) -> Self {
        Self {
            endpoint,
            records_key,
            count_key: "total_records",
        }
    }

    pub fn count_key(mut self, key: &'a str) -> Self {
        self.count_key = key;
        self
    }
}

/// Walks one report across pages, accumulating records in response order.
///
/// Stops on whichever termination signal is satisfied first: accumulated
/// record count reaching the reported total, or the page counter reaching
/// the reported page count. Endpoints reliably populate only one of the
/// two fields, so both are honored. `pacer` spaces the page requests to
/// the endpoint's quota.
pub async fn fetch_records(
    api: &dyn ReportApi,
    pacer: &Pacer,
    cancel: &CancelFlag,
    query: ReportQuery<'_>,
    mut params: ReportParams,
) -> Result<Vec<Value>, Error> {
    let mut records: Vec<Value> = Vec::new();

    loop {
        pacer.ready(cancel).await?;

        let page = api.fetch_page(query.endpoint, &params).await?;

        if let Some(error) = page.get("error") {
            return Err(Error::Api(error.to_string()));
        }

        let batch = page
            .get(query.records_key)
            .and_then(Value::as_array)
            .ok_or_else(|| {
                Error::Decode(format!(
                    "response from {} is missing '{}'",
                    query.endpoint, query.records_key
                ))
            })?;
        let batch_len = batch.len();
        records.extend(batch.iter().cloned());

        let total = page.get(query.count_key).and_then(Value::as_u64);
        let page_count = page.get("page_count").and_then(Value::as_u64);
        let page_number = page
            .get("page_number")
            .and_then(Value::as_u64)
            .unwrap_or(u64::from(params.page_number));

        if total.is_some_and(|t| records.len() as u64 >= t) {
            break;
        }
        if page_count.is_some_and(|count| page_number >= count) {
            break;
        }
        if batch_len == 0 {
            // neither signal fired and the endpoint stopped producing
            warn!(
                "Empty page from {} without termination metadata, stopping",
                query.endpoint
            );
            break;
        }

        params.page_number += 1;
    }

    Ok(records)
}
