use common::errors::AppError;
use common::models::Forecast;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell, RwLock};
use tokio::time::{Duration, Instant};
use tracing::{info, instrument};

use crate::api_client::ForecastClient;

/// Cache key is the exact `(api_key, state, city)` triple; no normalization
/// beyond what the client applies to the request path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    api_key: String,
    state: String,
    city: String,
}

struct CacheEntry {
    forecast: Forecast,
    expires_at: Instant,
}

/// The result cell shared by every caller that joined one upstream flight.
type FlightCell = Arc<OnceCell<Result<Forecast, AppError>>>;

/// TTL-bounded memoization layer in front of [`ForecastClient`].
///
/// Guarantees at most one in-flight provider call per key: concurrent
/// callers hitting the same missing or expired key join the first caller's
/// flight and receive a clone of its result, success or error. Callers for
/// different keys only ever contend on the brief in-flight table lock,
/// never for the duration of a network call.
///
/// Failures are never cached: a failed flight installs nothing, any stale
/// entry is left to expire naturally, and the next caller goes upstream
/// again. Expired entries are overwritten in place rather than evicted.
pub struct ForecastCache {
    client: ForecastClient,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    inflight: Mutex<HashMap<CacheKey, FlightCell>>,
    ttl: Duration,
}

impl ForecastCache {
    pub fn new(client: ForecastClient, ttl: Duration) -> Self {
        Self {
            client,
            entries: RwLock::new(HashMap::new()),
            inflight: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    #[instrument(skip(self, api_key), fields(state = %state, city = %city))]
    pub async fn get(&self, api_key: &str, state: &str, city: &str) -> Result<Forecast, AppError> {
        let key = CacheKey {
            api_key: api_key.to_string(),
            state: state.to_string(),
            city: city.to_string(),
        };

        if let Some(hit) = self.lookup(&key).await {
            info!("Cache hit");
            return Ok(hit);
        }

        // Join the in-flight call for this key, or start one. The table lock
        // covers only the entry lookup, never the network call itself.
        let cell = {
            let mut inflight = self.inflight.lock().await;
            Arc::clone(
                inflight
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(OnceCell::new())),
            )
        };

        let mut leader = false;
        let result = cell
            .get_or_init(|| {
                leader = true;
                self.fill(&key, api_key, state, city)
            })
            .await
            .clone();

        if leader {
            let mut inflight = self.inflight.lock().await;
            if let Some(current) = inflight.get(&key)
                && Arc::ptr_eq(current, &cell)
            {
                inflight.remove(&key);
            }
        }

        result
    }

    /// Drop the entry for a key so the next `get` goes upstream.
    pub async fn invalidate(&self, api_key: &str, state: &str, city: &str) {
        let key = CacheKey {
            api_key: api_key.to_string(),
            state: state.to_string(),
            city: city.to_string(),
        };
        let mut entries = self.entries.write().await;
        entries.remove(&key);
    }

    async fn lookup(&self, key: &CacheKey) -> Option<Forecast> {
        let entries = self.entries.read().await;
        if let Some(entry) = entries.get(key)
            && entry.expires_at > Instant::now()
        {
            return Some(entry.forecast.clone());
        }
        None
    }

    /// Runs exactly once per flight. The entry is installed before any
    /// follower wakes, and only on success.
    async fn fill(
        &self,
        key: &CacheKey,
        api_key: &str,
        state: &str,
        city: &str,
    ) -> Result<Forecast, AppError> {
        // A flight that finished between our miss and joining may already
        // have installed the entry; re-check before going upstream.
        if let Some(hit) = self.lookup(key).await {
            return Ok(hit);
        }

        info!("Cache miss, fetching from provider");

        let forecast = self.client.fetch(api_key, state, city).await?;

        let mut entries = self.entries.write().await;
        entries.insert(
            key.clone(),
            CacheEntry {
                forecast: forecast.clone(),
                expires_at: Instant::now() + self.ttl,
            },
        );

        Ok(forecast)
    }
}
