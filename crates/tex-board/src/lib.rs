//! tex-board
//!
//! Read-side projections over a collection of orders:
//! - `columns`: role-specific board columns and the projection into them.
//! - `query`: search, filters and stable multi-key sorting.
//! - `urgency`: deadline urgency against a reference instant.
//!
//! Nothing in this crate mutates an order or reads the clock.

pub mod columns;
pub mod query;
pub mod urgency;

pub use columns::{
    check_partition, column_for, columns_for, project, BoardProjection, ColumnBucket, ColumnId,
    PartitionDefect, StatusColumn,
};
pub use query::{
    apply_query, expand_statuses, filter_orders, sort_orders, DateRange, OrderQuery, SortDirection,
    SortKey, SortSpec,
};
pub use urgency::{days_until_deadline, deadline_urgency, Urgency, DEFAULT_DUE_SOON_DAYS};
