//! Persistence of optimistic status changes.
//!
//! # Design
//!
//! ```text
//!  apply_action ──► local order updated ──► SyncState::Pending
//!        │
//!        └─ tokio::spawn(persist_with_retry) ── attempts 1..=max_attempts
//!                                  │
//!                      mpsc ◄──────┘ PersistOutcome
//!        │
//!  drain_outcomes / next_outcome ──► Synced | Failed { reason }
//! ```
//!
//! Each request carries a per-order sequence number. An outcome whose `seq`
//! is older than the latest request for that order is stale and ignored, so
//! a slow first attempt can never overwrite the result of a newer one.
//!
//! Writes for one order go through its [`WriteLane`]: one attempt at a time,
//! and an attempt is only sent while its request is still the newest. A
//! request that is overtaken while waiting or backing off stops with
//! `Superseded`, so the service never receives an older status after a
//! newer one.
//!
//! A failed request is never rolled back locally. The order keeps its
//! optimistic status, is flagged `Failed`, and can be resubmitted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tex_config::PersistencePolicy;
use tex_schemas::StatusChangeAck;
use tex_status::{CanonicalStatus, ExternalStatus};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::service::OrderService;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncState {
    /// Local state matches what the service last acknowledged.
    Synced { at: Option<DateTime<Utc>> },
    /// A request is in flight.
    Pending { request_id: Uuid },
    /// Retries exhausted. The local status is kept.
    Failed { reason: String },
}

impl SyncState {
    pub fn is_pending(&self) -> bool {
        matches!(self, SyncState::Pending { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SyncState::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistRequest {
    pub request_id: Uuid,
    pub seq: u64,
    pub order_id: String,
    pub canonical: CanonicalStatus,
    pub external: ExternalStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistResult {
    Persisted(StatusChangeAck),
    /// Retries exhausted; carries the last error.
    Failed(String),
    /// A newer request for the same order took over. Nothing more was sent.
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistOutcome {
    pub request_id: Uuid,
    pub seq: u64,
    pub order_id: String,
    /// Calls actually made to the service.
    pub attempts: u32,
    pub result: PersistResult,
}

/// Per-order write serialization.
#[derive(Debug, Default)]
pub struct WriteLane {
    latest: AtomicU64,
    write: Mutex<()>,
}

impl WriteLane {
    /// Record `seq` as the newest request. Never moves backwards.
    pub fn claim(&self, seq: u64) {
        self.latest.fetch_max(seq, Ordering::SeqCst);
    }

    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    fn is_superseded(&self, seq: u64) -> bool {
        self.latest() > seq
    }
}

/// Delay before attempt `attempt + 1`.
pub fn backoff_for(policy: &PersistencePolicy, attempt: u32) -> Duration {
    Duration::from_millis(policy.retry_backoff_ms.saturating_mul(u64::from(attempt)))
}

/// Try `request_status_change` up to `policy.max_attempts` times.
///
/// Each attempt holds the order's lane and is skipped once a newer request
/// has claimed it.
#[instrument(
    skip(service, lane, policy),
    fields(order_id = %req.order_id, request_id = %req.request_id, status = %req.external)
)]
pub async fn persist_with_retry<S: OrderService>(
    service: Arc<S>,
    lane: Arc<WriteLane>,
    req: PersistRequest,
    policy: PersistencePolicy,
) -> PersistOutcome {
    let max = policy.max_attempts.max(1);
    let mut attempts = 0;
    let result = loop {
        let sent = {
            let _turn = lane.write.lock().await;
            if lane.is_superseded(req.seq) {
                debug!(
                    seq = req.seq,
                    latest = lane.latest(),
                    "newer request owns the order; stopping"
                );
                break PersistResult::Superseded;
            }
            attempts += 1;
            service
                .request_status_change(&req.order_id, req.external)
                .await
        };
        match sent {
            Ok(ack) => break PersistResult::Persisted(ack),
            Err(e) => {
                let err = format!("{e:#}");
                warn!(attempt = attempts, max, error = %err, "status change not persisted");
                if attempts >= max {
                    break PersistResult::Failed(err);
                }
                tokio::time::sleep(backoff_for(&policy, attempts)).await;
            }
        }
    };
    PersistOutcome {
        request_id: req.request_id,
        seq: req.seq,
        order_id: req.order_id,
        attempts,
        result,
    }
}
