//! tex-schemas
//!
//! Record shapes of the remote order service, decoded verbatim.
//!
//! Statuses stay raw strings here: the order service's vocabulary evolves
//! independently of this client, so interpretation belongs to `tex-status`.
//! Money is integer cents. Any total the service sends is informational only;
//! the domain model recomputes it from quantity and unit price.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCounterpart {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteProduct {
    pub name: String,
    /// Catalogue category used by the product-type filter (e.g. `"camisa"`).
    pub product_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTimelineEvent {
    /// Milestone key as stored by the service (e.g. `"materials_received"`).
    pub step: String,
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub icon: Option<String>,
}

/// One order as returned by `fetch_orders(role)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteOrder {
    pub id: String,
    pub display_id: String,
    pub counterpart: RemoteCounterpart,
    pub product: RemoteProduct,
    pub quantity: u32,
    pub unit_price_cents: i64,
    /// Ignored on decode; recomputed from `quantity * unit_price_cents`.
    #[serde(default)]
    pub total_value_cents: Option<i64>,
    pub deadline: NaiveDate,
    /// External-vocabulary status string.
    pub status: String,
    #[serde(default)]
    pub payment_status: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub timeline: Vec<RemoteTimelineEvent>,
}

/// An item awaiting review by the viewing party. Detail is owned by the
/// service; the dashboard only counts and lists them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingReview {
    pub review_id: Uuid,
    pub order_id: String,
    pub summary: String,
    pub submitted_at: DateTime<Utc>,
}

/// Acknowledgement for `request_status_change`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChangeAck {
    pub order_id: String,
    /// External status the service recorded.
    pub status: String,
    pub recorded_at: DateTime<Utc>,
}
