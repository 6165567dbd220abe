/// Business logic services layer
mod cache;
mod history;
mod lookup;
mod mapper;

pub use cache::SnapshotCache;
pub use history::HistoryService;
pub use lookup::FlightLookup;

use crate::clients::{FlightQuery, FlightSource};
use crate::domain::Health;
use crate::errors::ApiResult;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

/// Source of the current instant
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Upstream connectivity reporting
pub struct StatusService {
    cache: Arc<SnapshotCache>,
    source: Arc<dyn FlightSource>,
}

impl StatusService {
    pub fn new(cache: Arc<SnapshotCache>, source: Arc<dyn FlightSource>) -> Self {
        Self { cache, source }
    }

    /// One minimal upstream request; failures propagate typed
    pub async fn probe(&self) -> ApiResult<Health> {
        let flights = self.source.fetch(&FlightQuery::probe()).await?;
        info!("Upstream probe ok ({} flights)", flights.len());

        Ok(Health {
            status: "OK",
            message: "Flight Tracker API is running",
            upstream: "Connected",
            flights_available: flights.len(),
            cache_status: self.cache.status().await,
        })
    }
}
