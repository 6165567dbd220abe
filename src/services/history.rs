/// Multi-day flight history for one aircraft
use super::mapper::to_history_record;
use crate::clients::{FlightQuery, FlightSource};
use crate::domain::{DateRange, HistoryRecord, HistoryReport};
use crate::errors::{ApiError, ApiResult, UpstreamError};
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{info, warn};

/// Records requested per day
pub const HISTORY_DAY_LIMIT: u32 = 100;

#[derive(Default)]
struct HistoryAccumulator {
    records: Vec<HistoryRecord>,
    failures: Vec<(NaiveDate, UpstreamError)>,
    days: usize,
}

impl HistoryAccumulator {
    /// Decide the outcome once every day has been visited
    fn finish(self, icao24: &str, range: &DateRange) -> ApiResult<HistoryReport> {
        if !self.records.is_empty() {
            let count = self.records.len();
            return Ok(HistoryReport {
                flights: self.records,
                count,
                failed_dates: self.failures.into_iter().map(|(d, _)| d).collect(),
            });
        }

        // Credential and quota problems explain an empty result better than
        // "no data", so they win over the generic error.
        if let Some((_, err)) = self
            .failures
            .iter()
            .find(|(_, e)| matches!(e, UpstreamError::Unauthorized(_)))
            .or_else(|| {
                self.failures
                    .iter()
                    .find(|(_, e)| matches!(e, UpstreamError::RateLimited(_)))
            })
        {
            return Err(ApiError::Upstream(err.clone()));
        }

        if self.failures.len() == self.days {
            if let Some((_, err)) = self.failures.into_iter().last() {
                return Err(ApiError::Upstream(err));
            }
        }

        Err(ApiError::NoHistoricalData(format!(
            "no flights for {} between {} and {}",
            icao24,
            range.start(),
            range.end()
        )))
    }
}

/// The provider only answers single-date queries, so a range becomes one
/// request per calendar day, issued in order. Failed days are recorded and
/// skipped; the range only fails as a whole when it produced nothing.
pub struct HistoryService {
    source: Arc<dyn FlightSource>,
}

impl HistoryService {
    pub fn new(source: Arc<dyn FlightSource>) -> Self {
        Self { source }
    }

    /// Fetch every day of `range` for one aircraft, oldest day first
    pub async fn fetch_history(&self, icao24: &str, range: DateRange) -> ApiResult<HistoryReport> {
        let icao24 = icao24.trim().to_lowercase();
        if icao24.is_empty() {
            return Err(ApiError::InvalidInput("aircraft id is required".into()));
        }

        let acc = stream::iter(range.days())
            .fold(HistoryAccumulator::default(), |mut acc, day| {
                let source = Arc::clone(&self.source);
                let query = FlightQuery::history(&icao24, day, HISTORY_DAY_LIMIT);
                async move {
                    acc.days += 1;
                    match source.fetch(&query).await {
                        Ok(raw) => acc
                            .records
                            .extend(raw.iter().map(|r| to_history_record(r, day))),
                        Err(e) => {
                            warn!("History day {} failed: {}", day, e);
                            acc.failures.push((day, e));
                        }
                    }
                    acc
                }
            })
            .await;

        info!(
            "History for {}: {} records over {} days, {} failed days",
            icao24,
            acc.records.len(),
            acc.days,
            acc.failures.len()
        );
        acc.finish(&icao24, &range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::testing::{raw, ScriptedSource};
    use serde_json::json;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn range(start: &str, end: &str) -> DateRange {
        DateRange::new(date(start), date(end)).unwrap()
    }

    fn record(date: &str, iata: &str) -> crate::domain::RawFlight {
        raw(json!({
            "flight_date": date,
            "airline": {"name": "Lufthansa", "iata": "LH", "icao": "DLH"},
            "flight": {"number": "400", "iata": iata, "icao": "DLH400"},
            "aircraft": {"icao24": "3C6444"},
            "departure": {"airport": "Frankfurt", "scheduled": "2024-01-01T10:00:00+00:00"},
            "arrival": {"airport": "JFK"}
        }))
    }

    #[tokio::test]
    async fn test_partial_failure_scenario() {
        let source = Arc::new(ScriptedSource::new());
        source.on_date(date("2024-01-01"), Ok(vec![record("2024-01-01", "LH400")]));
        source.on_date(
            date("2024-01-02"),
            Err(UpstreamError::Unreachable("HTTP 502".into())),
        );
        source.on_date(date("2024-01-03"), Ok(vec![]));
        let service = HistoryService::new(source.clone());

        let report = service
            .fetch_history("3C6444", range("2024-01-01", "2024-01-03"))
            .await
            .unwrap();

        assert_eq!(report.count, 1);
        assert_eq!(report.flights[0].flight_date, "2024-01-01");
        assert_eq!(report.flights[0].icao24, "3c6444");
        assert_eq!(report.failed_dates, vec![date("2024-01-02")]);
        assert_eq!(source.calls(), 3);

        let dates: Vec<_> = source.seen().iter().map(|q| q.flight_date.unwrap()).collect();
        assert_eq!(
            dates,
            vec![date("2024-01-01"), date("2024-01-02"), date("2024-01-03")]
        );
        assert!(source
            .seen()
            .iter()
            .all(|q| q.icao24.as_deref() == Some("3c6444") && q.limit == 100));
    }

    #[tokio::test]
    async fn test_every_day_unreachable_is_a_failure() {
        let source = Arc::new(ScriptedSource::failing_with(UpstreamError::Unreachable(
            "connection refused".into(),
        )));
        let service = HistoryService::new(source.clone());

        let err = service
            .fetch_history("3c6444", range("2024-01-01", "2024-01-14"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Upstream(UpstreamError::Unreachable(_))
        ));
        assert_eq!(source.calls(), 14);
    }

    #[tokio::test]
    async fn test_thirteen_failures_one_good_day() {
        let source = Arc::new(ScriptedSource::failing_with(UpstreamError::Timeout(
            "12s".into(),
        )));
        source.on_date(
            date("2024-01-07"),
            Ok(vec![record("2024-01-07", "LH400"), record("2024-01-07", "LH401")]),
        );
        let service = HistoryService::new(source.clone());

        let report = service
            .fetch_history("3c6444", range("2024-01-01", "2024-01-14"))
            .await
            .unwrap();
        assert_eq!(report.count, 2);
        assert_eq!(report.flights[0].callsign.as_deref(), Some("LH400"));
        assert_eq!(report.flights[1].callsign.as_deref(), Some("LH401"));
        assert_eq!(report.failed_dates.len(), 13);
    }

    #[tokio::test]
    async fn test_day_order_preserved() {
        let source = Arc::new(ScriptedSource::new());
        source.on_date(
            date("2024-01-02"),
            Ok(vec![record("2024-01-02", "B1"), record("2024-01-02", "B2")]),
        );
        source.on_date(date("2024-01-01"), Ok(vec![record("2024-01-01", "A1")]));
        let service = HistoryService::new(source);

        let report = service
            .fetch_history("3c6444", range("2024-01-01", "2024-01-02"))
            .await
            .unwrap();
        let callsigns: Vec<_> = report
            .flights
            .iter()
            .map(|f| f.callsign.clone().unwrap())
            .collect();
        assert_eq!(callsigns, vec!["A1", "B1", "B2"]);
    }

    #[tokio::test]
    async fn test_empty_range_is_no_historical_data() {
        let source = Arc::new(ScriptedSource::new());
        let service = HistoryService::new(source);

        let err = service
            .fetch_history("3c6444", range("2024-01-01", "2024-01-03"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NoHistoricalData(_)));
    }

    #[tokio::test]
    async fn test_rate_limit_surfaces_over_empty_result() {
        let source = Arc::new(ScriptedSource::new());
        source.on_date(
            date("2024-01-02"),
            Err(UpstreamError::RateLimited("HTTP 429".into())),
        );
        let service = HistoryService::new(source);

        let err = service
            .fetch_history("3c6444", range("2024-01-01", "2024-01-03"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Upstream(UpstreamError::RateLimited(_))
        ));
    }

    #[tokio::test]
    async fn test_unauthorized_beats_rate_limited() {
        let source = Arc::new(ScriptedSource::failing_with(UpstreamError::RateLimited(
            "HTTP 429".into(),
        )));
        source.on_date(
            date("2024-01-03"),
            Err(UpstreamError::Unauthorized("HTTP 401".into())),
        );
        let service = HistoryService::new(source);

        let err = service
            .fetch_history("3c6444", range("2024-01-01", "2024-01-04"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Upstream(UpstreamError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_some_days_timed_out_rest_empty() {
        let source = Arc::new(ScriptedSource::new());
        source.on_date(
            date("2024-01-01"),
            Err(UpstreamError::Timeout("12s".into())),
        );
        let service = HistoryService::new(source);

        let err = service
            .fetch_history("3c6444", range("2024-01-01", "2024-01-02"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NoHistoricalData(_)));
    }

    #[tokio::test]
    async fn test_blank_aircraft_id() {
        let source = Arc::new(ScriptedSource::new());
        let service = HistoryService::new(source.clone());

        let err = service
            .fetch_history("  ", range("2024-01-01", "2024-01-02"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
        assert_eq!(source.calls(), 0);
    }
}
