//! tex-dashboard
//!
//! Per-role dashboard controller over the order engine.
//!
//! - `service`: the async seam to the remote order service.
//! - `dashboard`: loads orders, holds view state, applies actions
//!   optimistically and keeps the derived view current.
//! - `sync`: background persistence with bounded retries.
//! - `view`: the types handed to the view layer.
//!
//! No logging subscriber is installed here; binaries own that.

mod dashboard;
pub mod service;
pub mod sync;
pub mod view;

pub use dashboard::{ActionError, Dashboard};
pub use service::OrderService;
pub use sync::{
    backoff_for, persist_with_retry, PersistOutcome, PersistRequest, PersistResult, SyncState,
    WriteLane,
};
pub use view::{
    BoardColumnView, DashboardSummary, DerivedView, OrderDetail, PendingConfirmation,
    SyncFailure, ViewMode, ViewState,
};
