/// Domain models for the application
use crate::errors::ApiError;
use crate::utils::{lenient, lenient_f64};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Longest history window accepted, in calendar days (inclusive)
pub const MAX_HISTORY_DAYS: i64 = 14;

/// Label reported as the snapshot origin
pub const SNAPSHOT_SOURCE: &str = "AviationStack";

/// Response envelope returned by the provider's flights endpoint
#[derive(Debug, Default, Deserialize)]
pub struct ProviderEnvelope {
    #[serde(default, deserialize_with = "lenient")]
    pub data: Option<Vec<serde_json::Value>>,
    #[serde(default, deserialize_with = "lenient")]
    pub error: Option<ProviderFault>,
}

/// Error block some provider failures report inside a 200 body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderFault {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// One raw flight record as delivered by the provider
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFlight {
    #[serde(default, deserialize_with = "lenient")]
    pub flight_date: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub airline: Option<RawAirline>,
    #[serde(default, deserialize_with = "lenient")]
    pub flight: Option<RawFlightNumber>,
    #[serde(default, deserialize_with = "lenient")]
    pub aircraft: Option<RawAircraft>,
    #[serde(default, deserialize_with = "lenient")]
    pub departure: Option<RawAirport>,
    #[serde(default, deserialize_with = "lenient")]
    pub arrival: Option<RawAirport>,
    #[serde(default, deserialize_with = "lenient")]
    pub live: Option<RawLive>,
}

impl RawFlight {
    pub fn icao24(&self) -> Option<&str> {
        self.aircraft.as_ref()?.icao24.as_deref()
    }

    pub fn flight_iata(&self) -> Option<&str> {
        self.flight.as_ref()?.iata.as_deref()
    }

    pub fn flight_icao(&self) -> Option<&str> {
        self.flight.as_ref()?.icao.as_deref()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAirline {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub iata: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub icao: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFlightNumber {
    #[serde(default, deserialize_with = "lenient")]
    pub number: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub iata: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub icao: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAircraft {
    #[serde(default, deserialize_with = "lenient")]
    pub icao24: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAirport {
    #[serde(default, deserialize_with = "lenient")]
    pub airport: Option<String>,
}

/// Live-telemetry block. Units are the provider's: feet, knots, ft/min.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLive {
    #[serde(default, deserialize_with = "lenient")]
    pub updated: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub altitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub direction: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub speed_horizontal: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub speed_vertical: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub is_ground: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

/// Flight state in output units (meters, m/s, UNIX seconds)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedFlightState {
    pub icao24: String,
    pub callsign: Option<String>,
    pub origin_country: String,
    pub last_contact: Option<i64>,
    pub position: Option<Position>,
    pub baro_altitude: Option<f64>,
    pub geo_altitude: Option<f64>,
    pub on_ground: bool,
    pub velocity: Option<f64>,
    pub true_track: Option<f64>,
    pub vertical_rate: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    pub total: usize,
    pub countries: usize,
    pub in_air: usize,
    pub on_ground: usize,
}

impl AggregateStats {
    pub fn from_flights(flights: &[NormalizedFlightState]) -> Self {
        let countries: HashSet<&str> = flights.iter().map(|f| f.origin_country.as_str()).collect();
        let on_ground = flights.iter().filter(|f| f.on_ground).count();

        Self {
            total: flights.len(),
            countries: countries.len(),
            in_air: flights.len() - on_ground,
            on_ground,
        }
    }
}

/// Immutable aggregate of every flight with live telemetry
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub flights: Vec<NormalizedFlightState>,
    pub stats: AggregateStats,
    pub timestamp: i64,
    pub source: &'static str,
}

/// A snapshot as handed to callers, possibly flagged as stale
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotView {
    #[serde(flatten)]
    pub snapshot: Arc<Snapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl SnapshotView {
    pub fn fresh(snapshot: Arc<Snapshot>) -> Self {
        Self {
            snapshot,
            warning: None,
        }
    }

    pub fn stale(snapshot: Arc<Snapshot>, reason: impl std::fmt::Display) -> Self {
        Self {
            snapshot,
            warning: Some(format!("Serving cached data - error: {}", reason)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AirlineInfo {
    pub name: Option<String>,
    pub iata: Option<String>,
    pub icao: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlightNumberInfo {
    pub number: Option<String>,
    pub iata: Option<String>,
    pub icao: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AirportRef {
    pub airport: Option<String>,
}

/// One historical flight, without telemetry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRecord {
    pub icao24: String,
    pub flight_date: String,
    pub callsign: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub airline: Option<AirlineInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flight: Option<FlightNumberInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure: Option<AirportRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival: Option<AirportRef>,
}

#[derive(Debug, Serialize)]
pub struct HistoryReport {
    pub flights: Vec<HistoryRecord>,
    pub count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_dates: Vec<NaiveDate>,
}

/// Inclusive UTC calendar-date range of at most `MAX_HISTORY_DAYS` days
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ApiError> {
        if start > end {
            return Err(ApiError::InvalidRange(format!(
                "start {} is after end {}",
                start, end
            )));
        }
        let span = (end - start).num_days() + 1;
        if span > MAX_HISTORY_DAYS {
            return Err(ApiError::InvalidRange(format!(
                "{} days requested, at most {} allowed",
                span, MAX_HISTORY_DAYS
            )));
        }
        Ok(Self { start, end })
    }

    /// The last `MAX_HISTORY_DAYS` days ending on `today`
    pub fn trailing(today: NaiveDate) -> Self {
        let start = today - Days::new(MAX_HISTORY_DAYS as u64 - 1);
        Self { start, end: today }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Every date in the range, ascending
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

/// Which layer answered a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupSource {
    Cache,
    Aviationstack,
}

#[derive(Debug, Clone, Serialize)]
pub struct LookupHit {
    pub flight: NormalizedFlightState,
    pub source: LookupSource,
}

/// Liveness probe response
#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub message: &'static str,
    pub upstream: &'static str,
    pub flights_available: usize,
    pub cache_status: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn flight(country: &str, on_ground: bool) -> NormalizedFlightState {
        NormalizedFlightState {
            origin_country: country.to_string(),
            on_ground,
            ..Default::default()
        }
    }

    #[test]
    fn test_stats_add_up() {
        let flights = vec![
            flight("Lufthansa", false),
            flight("Lufthansa", true),
            flight("Delta", false),
            flight("", false),
        ];
        let stats = AggregateStats::from_flights(&flights);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.countries, 3);
        assert_eq!(stats.in_air, 3);
        assert_eq!(stats.on_ground, 1);
        assert_eq!(stats.in_air + stats.on_ground, stats.total);
    }

    #[test]
    fn test_stats_empty() {
        assert_eq!(AggregateStats::from_flights(&[]), AggregateStats::default());
    }

    #[test]
    fn test_range_accepts_fourteen_days() {
        let range = DateRange::new(date("2024-01-01"), date("2024-01-14")).unwrap();
        assert_eq!(range.days().count(), 14);
    }

    #[test]
    fn test_range_rejects_fifteen_days() {
        let err = DateRange::new(date("2024-01-01"), date("2024-01-15")).unwrap_err();
        assert!(matches!(err, ApiError::InvalidRange(_)));
    }

    #[test]
    fn test_range_rejects_reversed() {
        let err = DateRange::new(date("2024-01-03"), date("2024-01-01")).unwrap_err();
        assert!(matches!(err, ApiError::InvalidRange(_)));
    }

    #[test]
    fn test_range_days_cross_month() {
        let range = DateRange::new(date("2024-02-28"), date("2024-03-01")).unwrap();
        let days: Vec<_> = range.days().collect();
        assert_eq!(
            days,
            vec![date("2024-02-28"), date("2024-02-29"), date("2024-03-01")]
        );
    }

    #[test]
    fn test_trailing_range() {
        let range = DateRange::trailing(date("2024-01-14"));
        assert_eq!(range.start(), date("2024-01-01"));
        assert_eq!(range.end(), date("2024-01-14"));
    }

    #[test]
    fn test_raw_flight_tolerates_wrong_shapes() {
        let raw: RawFlight = serde_json::from_value(serde_json::json!({
            "airline": "not-an-object",
            "flight": {"iata": 100},
            "live": {"altitude": "35000", "latitude": null, "is_ground": "maybe"}
        }))
        .unwrap();
        assert!(raw.airline.is_none());
        assert!(raw.flight_iata().is_none());
        let live = raw.live.unwrap();
        assert_eq!(live.altitude, Some(35000.0));
        assert_eq!(live.latitude, None);
        assert_eq!(live.is_ground, None);
    }

    #[test]
    fn test_stale_view_warning() {
        let snapshot = Arc::new(Snapshot {
            flights: vec![],
            stats: AggregateStats::default(),
            timestamp: 0,
            source: SNAPSHOT_SOURCE,
        });
        let view = SnapshotView::stale(snapshot, "timeout");
        assert_eq!(
            view.warning.as_deref(),
            Some("Serving cached data - error: timeout")
        );
    }
}
