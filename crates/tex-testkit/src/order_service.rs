//! In-memory order service.
//!
//! Stores service records as given and applies acknowledged status changes
//! to them, so a later `fetch_orders` sees what was persisted. No IO and no
//! clock: acknowledgements carry a fixed `recorded_at`.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Utc};
use tex_dashboard::OrderService;
use tex_schemas::{PendingReview, RemoteOrder, StatusChangeAck};
use tex_status::{ExternalStatus, Role};
use tokio::sync::Semaphore;

/// One `request_status_change` call, recorded on entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRequest {
    pub order_id: String,
    pub status: ExternalStatus,
}

#[derive(Default)]
struct Inner {
    orders: Vec<RemoteOrder>,
    reviews: Vec<PendingReview>,
    /// Failure messages for the next status-change calls, front first.
    scripted_failures: VecDeque<String>,
    fail_all_writes: Option<String>,
    fail_fetch: Option<String>,
    requests: Vec<StatusRequest>,
}

pub struct InMemoryOrderService {
    inner: Mutex<Inner>,
    gate: Mutex<Option<Arc<Semaphore>>>,
    recorded_at: DateTime<Utc>,
}

impl InMemoryOrderService {
    pub fn new(orders: Vec<RemoteOrder>, recorded_at: DateTime<Utc>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                orders,
                ..Inner::default()
            }),
            gate: Mutex::new(None),
            recorded_at,
        }
    }

    pub fn with_reviews(self, reviews: Vec<PendingReview>) -> Self {
        self.lock().reviews = reviews;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicking test thread poisons the lock; the data is still usable.
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Fail the next `n` status-change calls with `reason`.
    pub fn fail_next_writes(&self, n: usize, reason: &str) {
        let mut g = self.lock();
        for _ in 0..n {
            g.scripted_failures.push_back(reason.to_string());
        }
    }

    /// Fail every status-change call until [`Self::recover`].
    pub fn fail_all_writes(&self, reason: &str) {
        self.lock().fail_all_writes = Some(reason.to_string());
    }

    pub fn fail_fetches(&self, reason: &str) {
        self.lock().fail_fetch = Some(reason.to_string());
    }

    /// Clear every scripted failure.
    pub fn recover(&self) {
        let mut g = self.lock();
        g.scripted_failures.clear();
        g.fail_all_writes = None;
        g.fail_fetch = None;
    }

    /// Hold status-change calls after they are logged until released.
    pub fn hold_writes(&self) {
        *self.gate.lock().unwrap_or_else(|p| p.into_inner()) = Some(Arc::new(Semaphore::new(0)));
    }

    /// Let `n` held calls proceed.
    pub fn release_writes(&self, n: usize) {
        if let Some(gate) = self.gate.lock().unwrap_or_else(|p| p.into_inner()).as_ref() {
            gate.add_permits(n);
        }
    }

    pub fn requests(&self) -> Vec<StatusRequest> {
        self.lock().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.lock().requests.len()
    }

    /// Stored external status string of `order_id`.
    pub fn stored_status(&self, order_id: &str) -> Option<String> {
        self.lock()
            .orders
            .iter()
            .find(|o| o.id == order_id)
            .map(|o| o.status.clone())
    }

    /// Drop a record, as if the service stopped returning it.
    pub fn remove_order(&self, order_id: &str) {
        self.lock().orders.retain(|o| o.id != order_id);
    }

    /// Overwrite the stored status, as another party would.
    pub fn set_stored_status(&self, order_id: &str, status: &str) {
        if let Some(o) = self.lock().orders.iter_mut().find(|o| o.id == order_id) {
            o.status = status.to_string();
        }
    }
}

#[async_trait::async_trait]
impl OrderService for InMemoryOrderService {
    fn source_name(&self) -> &'static str {
        "in-memory"
    }

    async fn fetch_orders(&self, _role: Role) -> Result<Vec<RemoteOrder>> {
        let g = self.lock();
        if let Some(reason) = &g.fail_fetch {
            bail!("{reason}");
        }
        Ok(g.orders.clone())
    }

    async fn request_status_change(
        &self,
        order_id: &str,
        status: ExternalStatus,
    ) -> Result<StatusChangeAck> {
        self.lock().requests.push(StatusRequest {
            order_id: order_id.to_string(),
            status,
        });

        let gate = self
            .gate
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone();
        if let Some(gate) = gate {
            gate.acquire()
                .await
                .map_err(|_| anyhow!("request gate closed"))?
                .forget();
        }

        let mut g = self.lock();
        if let Some(reason) = g.scripted_failures.pop_front() {
            bail!("{reason}");
        }
        if let Some(reason) = &g.fail_all_writes {
            bail!("{reason}");
        }
        let Some(order) = g.orders.iter_mut().find(|o| o.id == order_id) else {
            bail!("unknown order: {order_id}");
        };
        order.status = status.as_wire().to_string();
        Ok(StatusChangeAck {
            order_id: order_id.to_string(),
            status: status.as_wire().to_string(),
            recorded_at: self.recorded_at,
        })
    }

    async fn fetch_pending_reviews(&self) -> Result<Vec<PendingReview>> {
        let g = self.lock();
        if let Some(reason) = &g.fail_fetch {
            bail!("{reason}");
        }
        Ok(g.reviews.clone())
    }
}
