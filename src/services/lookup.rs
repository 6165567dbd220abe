/// Flight lookup by callsign or aircraft id
use super::cache::{SnapshotCache, SNAPSHOT_LIMIT};
use super::mapper::to_flight_state;
use crate::clients::{FlightQuery, FlightSource};
use crate::domain::{LookupHit, LookupSource, NormalizedFlightState, RawFlight};
use crate::errors::{ApiError, ApiResult};
use std::sync::Arc;
use tracing::{debug, info};

/// Finds a single flight by callsign fragment or aircraft id
pub struct FlightLookup {
    cache: Arc<SnapshotCache>,
    source: Arc<dyn FlightSource>,
}

fn cached_match(flight: &NormalizedFlightState, term: &str) -> bool {
    flight
        .callsign
        .as_deref()
        .is_some_and(|c| c.to_uppercase().contains(term))
        || flight.icao24.to_uppercase() == term
}

fn raw_match(raw: &RawFlight, term: &str) -> bool {
    raw.flight_iata()
        .is_some_and(|iata| iata.to_uppercase().contains(term))
        || raw
            .flight_icao()
            .is_some_and(|icao| icao.to_uppercase() == term)
        || raw.icao24().is_some_and(|id| id.to_uppercase() == term)
}

impl FlightLookup {
    pub fn new(cache: Arc<SnapshotCache>, source: Arc<dyn FlightSource>) -> Self {
        Self { cache, source }
    }

    /// Search the held snapshot first, then one unfiltered upstream page
    pub async fn find(&self, term: &str) -> ApiResult<LookupHit> {
        let term = term.trim().to_uppercase();
        if term.is_empty() {
            return Err(ApiError::InvalidInput("search term is required".into()));
        }

        if let Some(snapshot) = self.cache.peek().await {
            if let Some(flight) = snapshot.flights.iter().find(|f| cached_match(f, &term)) {
                debug!("Lookup '{}' answered from cache", term);
                return Ok(LookupHit {
                    flight: flight.clone(),
                    source: LookupSource::Cache,
                });
            }
        }

        let raw = self.source.fetch(&FlightQuery::live(SNAPSHOT_LIMIT)).await?;
        match raw.iter().find(|r| raw_match(r, &term)) {
            Some(found) => {
                info!("Lookup '{}' answered from upstream", term);
                Ok(LookupHit {
                    flight: to_flight_state(found),
                    source: LookupSource::Aviationstack,
                })
            }
            None => Err(ApiError::NotFound(format!("flight '{}' not found", term))),
        }
    }
}
