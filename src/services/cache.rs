/// Short-TTL cache for the bulk live-flights snapshot
use super::mapper::to_flight_state;
use super::Clock;
use crate::clients::{FlightQuery, FlightSource};
use crate::domain::{AggregateStats, NormalizedFlightState, Snapshot, SnapshotView, SNAPSHOT_SOURCE};
use crate::errors::UpstreamError;
use chrono::{DateTime, Duration, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Records requested for one bulk snapshot
pub const SNAPSHOT_LIMIT: u32 = 100;

type Refresh = Shared<BoxFuture<'static, Result<SnapshotView, UpstreamError>>>;

struct CacheEntry {
    snapshot: Arc<Snapshot>,
    captured_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.captured_at < ttl
    }
}

#[derive(Default)]
struct CacheState {
    current: Option<CacheEntry>,
    in_flight: Option<Refresh>,
}

/// A snapshot younger than the TTL is served without I/O. An expired or
/// missing snapshot triggers one upstream fetch shared by every concurrent
/// caller. If that fetch fails the previous snapshot is served with a warning;
/// with no previous snapshot the failure propagates.
pub struct SnapshotCache {
    source: Arc<dyn FlightSource>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    state: Arc<Mutex<CacheState>>,
}

impl SnapshotCache {
    pub fn new(source: Arc<dyn FlightSource>, clock: Arc<dyn Clock>, ttl: std::time::Duration) -> Self {
        Self {
            source,
            clock,
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::seconds(10)),
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    /// Current snapshot, refreshing it first when it has expired
    pub async fn get(&self) -> Result<SnapshotView, UpstreamError> {
        let refresh = {
            let mut state = self.state.lock().await;
            if let Some(entry) = &state.current {
                if entry.is_fresh(self.clock.now(), self.ttl) {
                    debug!("Snapshot cache hit");
                    return Ok(SnapshotView::fresh(Arc::clone(&entry.snapshot)));
                }
            }
            match state.in_flight.clone() {
                Some(refresh) => {
                    debug!("Joining in-flight snapshot refresh");
                    refresh
                }
                None => {
                    let refresh = self.start_refresh();
                    state.in_flight = Some(refresh.clone());
                    refresh
                }
            }
        };

        refresh.await
    }

    /// Held snapshot regardless of age. Never touches the upstream.
    pub async fn peek(&self) -> Option<Arc<Snapshot>> {
        let state = self.state.lock().await;
        state.current.as_ref().map(|e| Arc::clone(&e.snapshot))
    }

    pub async fn status(&self) -> &'static str {
        if self.peek().await.is_some() {
            "Active"
        } else {
            "Empty"
        }
    }

    fn start_refresh(&self) -> Refresh {
        let source = Arc::clone(&self.source);
        let clock = Arc::clone(&self.clock);
        let state = Arc::clone(&self.state);

        async move {
            info!("Refreshing flight snapshot");
            let fetched = source.fetch(&FlightQuery::live(SNAPSHOT_LIMIT)).await;

            let mut state = state.lock().await;
            state.in_flight = None;

            match fetched {
                Ok(raw) => {
                    let flights: Vec<NormalizedFlightState> = raw
                        .iter()
                        .filter(|r| r.live.is_some())
                        .map(to_flight_state)
                        .collect();
                    let captured_at = clock.now();
                    let snapshot = Arc::new(Snapshot {
                        stats: AggregateStats::from_flights(&flights),
                        flights,
                        timestamp: captured_at.timestamp(),
                        source: SNAPSHOT_SOURCE,
                    });
                    info!(
                        "Snapshot published: {} live flights of {} records",
                        snapshot.stats.total,
                        raw.len()
                    );
                    state.current = Some(CacheEntry {
                        snapshot: Arc::clone(&snapshot),
                        captured_at,
                    });
                    Ok(SnapshotView::fresh(snapshot))
                }
                Err(e) => match &state.current {
                    Some(entry) => {
                        warn!("Snapshot refresh failed, serving stale data: {}", e);
                        Ok(SnapshotView::stale(Arc::clone(&entry.snapshot), &e))
                    }
                    None => {
                        warn!("Snapshot refresh failed with nothing cached: {}", e);
                        Err(e)
                    }
                },
            }
        }
        .boxed()
        .shared()
    }
}
