/// Application configuration module
use crate::clients::RequestTimeouts;
use std::env;
use std::time::Duration;
use tracing::warn;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub aviationstack_api: String,
    pub aviationstack_key: String,
    pub timeouts: RequestTimeouts,
    pub snapshot_ttl: Duration,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let aviationstack_api = base_url(env::var("AVIATIONSTACK_API").ok());

        let aviationstack_key = env::var("AVIATIONSTACK_KEY").unwrap_or_default();
        if aviationstack_key.is_empty() {
            warn!("AVIATIONSTACK_KEY is not set; upstream calls will be rejected");
        }

        let timeouts = RequestTimeouts {
            live: Duration::from_millis(env_u64("LIVE_TIMEOUT_MS", 8_000)),
            history: Duration::from_millis(env_u64("HISTORY_TIMEOUT_MS", 12_000)),
            probe: Duration::from_millis(env_u64("PROBE_TIMEOUT_MS", 5_000)),
        };

        let snapshot_ttl = Duration::from_secs(env_u64("SNAPSHOT_TTL_SECONDS", 10));

        Ok(Self {
            port,
            aviationstack_api,
            aviationstack_key,
            timeouts,
            snapshot_ttl,
        })
    }
}

fn base_url(raw: Option<String>) -> String {
    raw.map(|s| s.trim().trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "https://api.aviationstack.com/v1".to_string())
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
