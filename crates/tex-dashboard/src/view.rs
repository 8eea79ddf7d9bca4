use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tex_board::{OrderQuery, SortSpec, Urgency};
use tex_config::DefaultView;
use tex_orders::{Action, Order, TimelineEvent};

use crate::sync::SyncState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViewMode {
    #[default]
    Board,
    List,
}

impl From<DefaultView> for ViewMode {
    fn from(v: DefaultView) -> Self {
        match v {
            DefaultView::Board => ViewMode::Board,
            DefaultView::List => ViewMode::List,
        }
    }
}

/// An action the user picked but has not confirmed yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingConfirmation {
    pub order_id: String,
    pub action: Action,
}

/// Ephemeral UI state. Never mixed with order data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    /// Search text lives in `query.search`. `query.hide_terminal` applies to
    /// the list only; the board always shows its closed columns.
    pub query: OrderQuery,
    pub sort: SortSpec,
    pub mode: ViewMode,
    pub selected_order: Option<String>,
    pub pending: Option<PendingConfirmation>,
    /// "Now" for date filters, deadline urgency and transition timestamps.
    pub reference_instant: DateTime<Utc>,
}

impl ViewState {
    pub fn new(mode: ViewMode, reference_instant: DateTime<Utc>) -> Self {
        Self {
            query: OrderQuery {
                hide_terminal: true,
                ..OrderQuery::default()
            },
            sort: SortSpec::default(),
            mode,
            selected_order: None,
            pending: None,
            reference_instant,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardColumnView {
    pub id: &'static str,
    pub label: &'static str,
    pub orders: Vec<Order>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub open_orders: usize,
    pub open_value_cents: i64,
    pub overdue: usize,
    pub pending_sync: usize,
    pub failed_sync: usize,
    pub pending_reviews: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncFailure {
    pub order_id: String,
    pub reason: String,
}

/// Everything the detail panel shows for the selected order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDetail {
    pub order: Order,
    pub timeline: Vec<TimelineEvent>,
    pub available_actions: Vec<Action>,
    pub urgency: Urgency,
    pub sync: Option<SyncState>,
}

/// Output for the view layer, recomputed after every state change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DerivedView {
    /// Revision of the dashboard state this view was computed from.
    pub revision: u64,
    pub columns: Vec<BoardColumnView>,
    pub filtered_sorted_orders: Vec<Order>,
    pub urgency: BTreeMap<String, Urgency>,
    pub selected: Option<OrderDetail>,
    pub summary: DashboardSummary,
    pub sync_failures: Vec<SyncFailure>,
}

impl DerivedView {
    pub fn column(&self, id: &str) -> Option<&BoardColumnView> {
        self.columns.iter().find(|c| c.id == id)
    }
}
