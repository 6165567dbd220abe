/// Upstream flight provider client
use crate::domain::{ProviderEnvelope, ProviderFault, RawFlight};
use crate::errors::{ApiResult, UpstreamError};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Request deadlines per call class
#[derive(Clone, Copy, Debug)]
pub struct RequestTimeouts {
    pub live: Duration,
    pub history: Duration,
    pub probe: Duration,
}

impl Default for RequestTimeouts {
    fn default() -> Self {
        Self {
            live: Duration::from_secs(8),
            history: Duration::from_secs(12),
            probe: Duration::from_secs(5),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallClass {
    Live,
    History,
    Probe,
}

impl RequestTimeouts {
    pub fn for_class(&self, class: CallClass) -> Duration {
        match class {
            CallClass::Live => self.live,
            CallClass::History => self.history,
            CallClass::Probe => self.probe,
        }
    }
}

/// Filters understood by the provider. Free-text search is not one of them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlightQuery {
    pub limit: u32,
    pub icao24: Option<String>,
    pub flight_date: Option<NaiveDate>,
    pub class: CallClass,
}

impl FlightQuery {
    /// Unfiltered bulk query for live flights
    pub fn live(limit: u32) -> Self {
        Self {
            limit,
            icao24: None,
            flight_date: None,
            class: CallClass::Live,
        }
    }

    /// One aircraft on one calendar day
    pub fn history(icao24: &str, date: NaiveDate, limit: u32) -> Self {
        Self {
            limit,
            icao24: Some(icao24.to_string()),
            flight_date: Some(date),
            class: CallClass::History,
        }
    }

    /// Minimal request used for connectivity checks
    pub fn probe() -> Self {
        Self {
            limit: 1,
            icao24: None,
            flight_date: None,
            class: CallClass::Probe,
        }
    }
}

/// Source of raw flight records
#[async_trait]
pub trait FlightSource: Send + Sync {
    /// Run one query. Implementations never retry.
    async fn fetch(&self, query: &FlightQuery) -> Result<Vec<RawFlight>, UpstreamError>;
}

/// HTTP client wrapper with common configuration
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new() -> ApiResult<Self> {
        let client = Client::builder()
            .user_agent("flight-tracker/1.0")
            .build()
            .map_err(|e| crate::errors::ApiError::Internal(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn get_client(&self) -> &Client {
        &self.client
    }
}

/// AviationStack flights endpoint client
pub struct AviationStackClient {
    http_client: HttpClient,
    base_url: String,
    access_key: String,
    timeouts: RequestTimeouts,
}

impl AviationStackClient {
    pub fn new(base_url: String, access_key: String, timeouts: RequestTimeouts) -> ApiResult<Self> {
        Ok(Self {
            http_client: HttpClient::new()?,
            base_url,
            access_key,
            timeouts,
        })
    }

    fn params(&self, query: &FlightQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("access_key", self.access_key.clone()),
            ("limit", query.limit.to_string()),
        ];
        if let Some(icao24) = &query.icao24 {
            params.push(("icao24", icao24.to_lowercase()));
        }
        if let Some(date) = query.flight_date {
            params.push(("flight_date", date.format("%Y-%m-%d").to_string()));
        }
        params
    }
}

#[async_trait]
impl FlightSource for AviationStackClient {
    async fn fetch(&self, query: &FlightQuery) -> Result<Vec<RawFlight>, UpstreamError> {
        let url = format!("{}/flights", self.base_url);
        debug!(
            "Upstream request: limit={} icao24={:?} date={:?}",
            query.limit, query.icao24, query.flight_date
        );

        let resp = self
            .http_client
            .get_client()
            .get(&url)
            .query(&self.params(query))
            .timeout(self.timeouts.for_class(query.class))
            .send()
            .await?;

        let status = resp.status().as_u16();
        if let Some(err) = classify_status(status) {
            warn!("Upstream responded with status {}", status);
            return Err(err);
        }

        let envelope: ProviderEnvelope = resp.json().await?;
        decode_envelope(envelope)
    }
}

/// Map a non-success HTTP status to an upstream failure
pub fn classify_status(status: u16) -> Option<UpstreamError> {
    match status {
        200..=299 => None,
        429 => Some(UpstreamError::RateLimited(format!("HTTP {}", status))),
        401 => Some(UpstreamError::Unauthorized(format!("HTTP {}", status))),
        _ => Some(UpstreamError::Unreachable(format!("HTTP {}", status))),
    }
}

/// Map an error block embedded in a successful response
pub fn classify_fault(fault: &ProviderFault) -> UpstreamError {
    let code = fault.code.as_deref().unwrap_or_default();
    let message = fault
        .message
        .clone()
        .unwrap_or_else(|| code.to_string());

    match code {
        "rate_limit_reached" | "usage_limit_reached" | "too_many_requests" => {
            UpstreamError::RateLimited(message)
        }
        "invalid_access_key" | "missing_access_key" | "inactive_user" => {
            UpstreamError::Unauthorized(message)
        }
        _ => UpstreamError::Unreachable(message),
    }
}

/// Pull records out of a provider envelope, skipping elements that are not records
pub fn decode_envelope(envelope: ProviderEnvelope) -> Result<Vec<RawFlight>, UpstreamError> {
    if let Some(fault) = &envelope.error {
        return Err(classify_fault(fault));
    }

    let items = envelope.data.unwrap_or_default();
    let total = items.len();
    let records: Vec<RawFlight> = items
        .into_iter()
        .filter(|v| v.is_object())
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect();

    if records.len() < total {
        debug!("Skipped {} malformed upstream records", total - records.len());
    }
    Ok(records)
}
