use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Current conditions for one place, as reported by the weather provider.
///
/// Immutable once constructed; the cache and its callers copy it freely.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Forecast {
    /// Temperature in degrees Fahrenheit
    pub temperature: f64,
    /// Provider-specific condition code, e.g. "cloudy"
    pub conditions: String,
    /// When the provider was queried
    pub queried_at: DateTime<Utc>,
}

/// One signup record: an email address and the city it wants weather for.
///
/// Produced by the subscriber store; the pipeline treats it as read-only.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Subscriber {
    pub email: String,
    pub city: String,
    pub state: String,
}

/// A fully rendered notification, ready for the mail transport.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationMessage {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Terminal result of one delivery attempt. Never persisted; surfaced
/// through logs and the dispatch counters only.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Delivered,
    Failed(String),
}

/// Snapshot of the dispatch counters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct DispatchStats {
    pub submitted: usize,
    pub delivered: usize,
    pub failed: usize,
}

/// Synchronous summary of one campaign run.
///
/// Delivery outcomes are asynchronous and intentionally absent here; they
/// show up in [`DispatchStats`] once the sends settle.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CampaignReport {
    /// Subscribers the run iterated over
    pub attempted: usize,
    /// Messages composed and handed to dispatch
    pub composed: usize,
    /// Subscribers skipped after a forecast-stage failure
    pub failed: usize,
}
