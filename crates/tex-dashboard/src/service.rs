//! Order-service boundary.
//!
//! This module defines only the trait the dashboard talks to. Transport,
//! authentication and retries against the wire are the implementor's
//! business; the dashboard layers its own bounded retry on top (see
//! [`crate::sync`]).

use anyhow::Result;
use tex_schemas::{PendingReview, RemoteOrder, StatusChangeAck};
use tex_status::{ExternalStatus, Role};

/// Remote order service, as seen from one dashboard.
///
/// Statuses cross this boundary in the external vocabulary only.
#[async_trait::async_trait]
pub trait OrderService: Send + Sync + 'static {
    fn source_name(&self) -> &'static str;

    /// Every order visible to `role`.
    async fn fetch_orders(&self, role: Role) -> Result<Vec<RemoteOrder>>;

    /// Ask the service to record `status` for `order_id`.
    async fn request_status_change(
        &self,
        order_id: &str,
        status: ExternalStatus,
    ) -> Result<StatusChangeAck>;

    async fn fetch_pending_reviews(&self) -> Result<Vec<PendingReview>>;
}
