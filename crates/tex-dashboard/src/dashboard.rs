//! Dashboard Orchestrator
//!
//! # Design
//!
//! One `Dashboard` per role. It owns its copy of the order collection, the
//! ephemeral [`ViewState`], the per-order [`SyncState`] and the last
//! [`DerivedView`]. Nothing is shared across instances.
//!
//! Every method that changes orders, sync state or view state ends in
//! `rederive()`, which bumps `revision` and recomputes the derived view from
//! scratch. The derived view records the revision it was built from, so a
//! stale view is detectable (`derived().revision != revision()`).
//!
//! Actions are applied optimistically: validate, update the local order,
//! then spawn persistence in the background. Methods that spawn must run
//! inside a Tokio runtime.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tex_board::{
    apply_query, deadline_urgency, project, DateRange, OrderQuery, SortSpec, Urgency,
};
use tex_config::DashboardSettings;
use tex_orders::{
    available_actions, validate, Action, Order, TransitionContext, TransitionDecision,
    TransitionError,
};
use tex_schemas::PendingReview;
use tex_status::{to_external_for_write, CanonicalStatus, ExternalStatus, MappingError, Role};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::service::OrderService;
use crate::sync::{
    persist_with_retry, PersistOutcome, PersistRequest, PersistResult, SyncState, WriteLane,
};
use crate::view::{
    BoardColumnView, DashboardSummary, DerivedView, OrderDetail, PendingConfirmation,
    SyncFailure, ViewMode, ViewState,
};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    UnknownOrder(String),
    /// `confirm_pending` with nothing awaiting confirmation.
    NothingPending,
    /// `retry_sync` on an order whose last request did not fail.
    NotFailed(String),
    Transition(TransitionError),
    Mapping(MappingError),
}

impl ActionError {
    /// User-facing message.
    pub fn message(&self) -> String {
        match self {
            ActionError::UnknownOrder(_) => "Pedido não encontrado.".to_string(),
            ActionError::NothingPending => "Nenhuma ação aguardando confirmação.".to_string(),
            ActionError::NotFailed(_) => "Este pedido não tem sincronização pendente.".to_string(),
            ActionError::Transition(e) => e.message(),
            ActionError::Mapping(_) => {
                "Este status não pode ser enviado ao serviço de pedidos.".to_string()
            }
        }
    }
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionError::UnknownOrder(id) => write!(f, "UNKNOWN_ORDER: {id}"),
            ActionError::NothingPending => write!(f, "NOTHING_PENDING"),
            ActionError::NotFailed(id) => write!(f, "SYNC_NOT_FAILED: {id}"),
            ActionError::Transition(e) => write!(f, "{e}"),
            ActionError::Mapping(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ActionError {}

impl From<TransitionError> for ActionError {
    fn from(e: TransitionError) -> Self {
        ActionError::Transition(e)
    }
}

impl From<MappingError> for ActionError {
    fn from(e: MappingError) -> Self {
        ActionError::Mapping(e)
    }
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct SyncEntry {
    state: SyncState,
    /// Sequence number of the latest request for this order.
    seq: u64,
}

pub struct Dashboard<S: OrderService> {
    service: Arc<S>,
    settings: DashboardSettings,
    orders: Vec<Order>,
    pending_reviews: Vec<PendingReview>,
    sync: BTreeMap<String, SyncEntry>,
    /// Kept for the dashboard's lifetime, so a request outliving a reload
    /// still shares its lane with later ones.
    lanes: BTreeMap<String, Arc<WriteLane>>,
    view: ViewState,
    revision: u64,
    derived: DerivedView,
    last_message: Option<String>,
    next_seq: u64,
    outcome_tx: mpsc::UnboundedSender<PersistOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<PersistOutcome>,
}

impl<S: OrderService> Dashboard<S> {
    /// An empty dashboard for `settings.role`. Call [`Dashboard::load`] next.
    pub fn new(service: Arc<S>, settings: DashboardSettings, reference: DateTime<Utc>) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let view = ViewState::new(ViewMode::from(settings.default_view), reference);
        let mut dash = Self {
            service,
            settings,
            orders: Vec::new(),
            pending_reviews: Vec::new(),
            sync: BTreeMap::new(),
            lanes: BTreeMap::new(),
            view,
            revision: 0,
            derived: DerivedView::default(),
            last_message: None,
            next_seq: 0,
            outcome_tx,
            outcome_rx,
        };
        dash.rederive();
        dash
    }

    pub fn role(&self) -> Role {
        self.settings.role
    }

    pub fn settings(&self) -> &DashboardSettings {
        &self.settings
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn order(&self, order_id: &str) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == order_id)
    }

    pub fn pending_reviews(&self) -> &[PendingReview] {
        &self.pending_reviews
    }

    pub fn view_state(&self) -> &ViewState {
        &self.view
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn derived(&self) -> &DerivedView {
        &self.derived
    }

    pub fn last_message(&self) -> Option<&str> {
        self.last_message.as_deref()
    }

    pub fn sync_state(&self, order_id: &str) -> Option<&SyncState> {
        self.sync.get(order_id).map(|e| &e.state)
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Fetch orders and pending reviews from the service.
    ///
    /// Orders whose latest change is pending or failed keep their local
    /// (optimistic) copy; the service has not recorded that change.
    ///
    /// # Errors
    /// Any service error. Local state is left as it was.
    pub async fn load(&mut self) -> Result<()> {
        let role = self.role();
        let remote = self
            .service
            .fetch_orders(role)
            .await
            .with_context(|| format!("fetch_orders failed ({})", self.service.source_name()))?;
        let reviews = self
            .service
            .fetch_pending_reviews()
            .await
            .with_context(|| {
                format!("fetch_pending_reviews failed ({})", self.service.source_name())
            })?;

        let mut orders = Vec::with_capacity(remote.len());
        let mut seen = BTreeSet::new();
        for r in &remote {
            if !seen.insert(r.id.clone()) {
                warn!(order_id = %r.id, "duplicate order in service response; keeping first");
                continue;
            }
            let unsynced = self
                .sync
                .get(&r.id)
                .map(|e| !matches!(e.state, SyncState::Synced { .. }))
                .unwrap_or(false);
            match self.order(&r.id) {
                Some(local) if unsynced => orders.push(local.clone()),
                _ => orders.push(Order::from_remote(r, role)),
            }
        }

        self.sync.retain(|id, _| seen.contains(id));
        info!(%role, orders = orders.len(), reviews = reviews.len(), "dashboard loaded");
        self.orders = orders;
        self.pending_reviews = reviews;
        if let Some(id) = &self.view.selected_order {
            if !seen.contains(id) {
                self.view.selected_order = None;
                self.view.pending = None;
            }
        }
        self.rederive();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // View state
    // -----------------------------------------------------------------------

    pub fn set_search(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.view.query.search = (!text.trim().is_empty()).then_some(text);
        self.rederive();
    }

    pub fn set_date_range(&mut self, range: Option<DateRange>) {
        self.view.query.date_range = range;
        self.rederive();
    }

    pub fn set_status_filter(&mut self, statuses: BTreeSet<CanonicalStatus>) {
        self.view.query.statuses = statuses;
        self.rederive();
    }

    pub fn set_counterpart_filter(&mut self, counterpart_id: Option<String>) {
        self.view.query.counterpart_id = counterpart_id;
        self.rederive();
    }

    pub fn set_product_type_filter(&mut self, product_type: Option<String>) {
        self.view.query.product_type = product_type;
        self.rederive();
    }

    /// Show or hide terminal orders in the list.
    pub fn set_show_terminal(&mut self, show: bool) {
        self.view.query.hide_terminal = !show;
        self.rederive();
    }

    /// Back to the default working list: no filters, terminal orders hidden.
    pub fn clear_filters(&mut self) {
        self.view.query = OrderQuery {
            hide_terminal: true,
            ..OrderQuery::default()
        };
        self.rederive();
    }

    pub fn set_sort(&mut self, sort: SortSpec) {
        self.view.sort = sort;
        self.rederive();
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view.mode = mode;
        self.rederive();
    }

    pub fn set_reference_instant(&mut self, at: DateTime<Utc>) {
        self.view.reference_instant = at;
        self.rederive();
    }

    pub fn select_order(&mut self, order_id: &str) -> Result<(), ActionError> {
        if self.order(order_id).is_none() {
            return Err(ActionError::UnknownOrder(order_id.to_string()));
        }
        if self.view.selected_order.as_deref() != Some(order_id) {
            self.view.pending = None;
        }
        self.view.selected_order = Some(order_id.to_string());
        self.rederive();
        Ok(())
    }

    /// Dismiss the detail view. In-flight persistence is not affected.
    pub fn close_detail(&mut self) {
        self.view.selected_order = None;
        self.view.pending = None;
        self.rederive();
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    /// Stage `action` for confirmation. Fails early if it would not validate.
    pub fn request_action(&mut self, order_id: &str, action: Action) -> Result<(), ActionError> {
        let result = self.check_action(order_id, action).map(|_| ());
        match &result {
            Ok(()) => {
                self.view.selected_order = Some(order_id.to_string());
                self.view.pending = Some(PendingConfirmation {
                    order_id: order_id.to_string(),
                    action,
                });
                self.last_message = None;
            }
            Err(e) => self.last_message = Some(e.message()),
        }
        self.rederive();
        result
    }

    /// Discard the staged action. Nothing was sent, nothing is cancelled.
    pub fn cancel_pending(&mut self) {
        self.view.pending = None;
        self.rederive();
    }

    /// Apply the staged action.
    pub fn confirm_pending(&mut self) -> Result<TransitionDecision, ActionError> {
        let Some(p) = self.view.pending.take() else {
            return Err(ActionError::NothingPending);
        };
        self.apply_action(&p.order_id, p.action)
    }

    /// Validate and apply `action` to `order_id`, then persist in the
    /// background. On error the order is unchanged.
    pub fn apply_action(
        &mut self,
        order_id: &str,
        action: Action,
    ) -> Result<TransitionDecision, ActionError> {
        let result = self.try_apply(order_id, action);
        self.last_message = Some(match &result {
            Ok(d) if d.is_noop() => format!("{}: nada a alterar.", action.label()),
            Ok(d) => format!("{} → {}", action.label(), d.to.label()),
            Err(e) => e.message(),
        });
        if let Err(e) = &result {
            info!(order_id, %action, role = %self.role(), error = %e, "action refused");
        }
        self.rederive();
        result
    }

    /// Resubmit the current status of an order whose persistence failed.
    pub fn retry_sync(&mut self, order_id: &str) -> Result<(), ActionError> {
        let failed = self
            .sync
            .get(order_id)
            .map(|e| e.state.is_failed())
            .unwrap_or(false);
        if !failed {
            return Err(ActionError::NotFailed(order_id.to_string()));
        }
        let status = self
            .order(order_id)
            .map(Order::status)
            .ok_or_else(|| ActionError::UnknownOrder(order_id.to_string()))?;
        let external = to_external_for_write(status, self.role())?;
        self.spawn_persist(order_id, status, external);
        self.rederive();
        Ok(())
    }

    fn check_action(
        &self,
        order_id: &str,
        action: Action,
    ) -> Result<TransitionDecision, ActionError> {
        let order = self
            .order(order_id)
            .ok_or_else(|| ActionError::UnknownOrder(order_id.to_string()))?;
        let decision = validate(&TransitionContext::for_order(order, self.role()), action)?;
        if let Some(target) = decision.persisted_status() {
            to_external_for_write(target, self.role())?;
        }
        Ok(decision)
    }

    fn try_apply(
        &mut self,
        order_id: &str,
        action: Action,
    ) -> Result<TransitionDecision, ActionError> {
        let role = self.role();
        let at = self.view.reference_instant;
        // Map before mutating, so an unmappable target never changes local state.
        let decision = self.check_action(order_id, action)?;
        let external = decision
            .persisted_status()
            .map(|s| to_external_for_write(s, role))
            .transpose()?;

        let order = self
            .orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or_else(|| ActionError::UnknownOrder(order_id.to_string()))?;
        let applied = order.apply(action, role, at)?;

        if let Some(external) = external {
            self.spawn_persist(order_id, applied.to, external);
        }
        Ok(applied)
    }

    fn spawn_persist(
        &mut self,
        order_id: &str,
        canonical: CanonicalStatus,
        external: ExternalStatus,
    ) {
        self.next_seq += 1;
        let req = PersistRequest {
            request_id: Uuid::new_v4(),
            seq: self.next_seq,
            order_id: order_id.to_string(),
            canonical,
            external,
        };
        debug!(order_id, request_id = %req.request_id, %external, "persisting status change");
        self.sync.insert(
            order_id.to_string(),
            SyncEntry {
                state: SyncState::Pending {
                    request_id: req.request_id,
                },
                seq: req.seq,
            },
        );

        let lane = Arc::clone(self.lanes.entry(order_id.to_string()).or_default());
        lane.claim(req.seq);

        let service = Arc::clone(&self.service);
        let policy = self.settings.persistence;
        let tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let outcome = persist_with_retry(service, lane, req, policy).await;
            // The dashboard may be gone; the request still ran to completion.
            let _ = tx.send(outcome);
        });
    }

    // -----------------------------------------------------------------------
    // Outcomes
    // -----------------------------------------------------------------------

    /// Apply every outcome already delivered. Returns how many changed state.
    pub fn drain_outcomes(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            if self.record_outcome(outcome) {
                applied += 1;
            }
        }
        if applied > 0 {
            self.rederive();
        }
        applied
    }

    /// Wait for the next outcome and apply it. `false` if it was stale.
    pub async fn next_outcome(&mut self) -> bool {
        // The dashboard holds a sender, so the channel never closes here.
        let Some(outcome) = self.outcome_rx.recv().await else {
            return false;
        };
        let applied = self.record_outcome(outcome);
        if applied {
            self.rederive();
        }
        applied
    }

    /// Number of orders with a request in flight.
    pub fn in_flight(&self) -> usize {
        self.sync.values().filter(|e| e.state.is_pending()).count()
    }

    fn record_outcome(&mut self, outcome: PersistOutcome) -> bool {
        let Some(entry) = self.sync.get_mut(&outcome.order_id) else {
            debug!(order_id = %outcome.order_id, "outcome for an order no longer tracked");
            return false;
        };
        if entry.seq != outcome.seq {
            debug!(
                order_id = %outcome.order_id,
                seq = outcome.seq,
                latest = entry.seq,
                "superseded persistence outcome ignored"
            );
            return false;
        }
        match outcome.result {
            PersistResult::Persisted(ack) => {
                info!(
                    order_id = %outcome.order_id,
                    request_id = %outcome.request_id,
                    attempts = outcome.attempts,
                    recorded = %ack.status,
                    "status change persisted"
                );
                entry.state = SyncState::Synced {
                    at: Some(ack.recorded_at),
                };
            }
            PersistResult::Failed(reason) => {
                error!(
                    order_id = %outcome.order_id,
                    request_id = %outcome.request_id,
                    attempts = outcome.attempts,
                    %reason,
                    "status change not persisted; keeping local status"
                );
                entry.state = SyncState::Failed { reason };
            }
            PersistResult::Superseded => {
                // Only a request older than `entry.seq` can be overtaken.
                debug!(order_id = %outcome.order_id, seq = outcome.seq, "superseded request");
                return false;
            }
        }
        true
    }

    // -----------------------------------------------------------------------
    // Derivation
    // -----------------------------------------------------------------------

    fn rederive(&mut self) {
        self.revision += 1;
        self.derived = self.compute_view();
    }

    fn compute_view(&self) -> DerivedView {
        let role = self.role();
        let reference = self.view.reference_instant;
        let due_soon = self.settings.due_soon_days;

        let board_query = OrderQuery {
            hide_terminal: false,
            ..self.view.query.clone()
        };
        let board_rows = apply_query(&self.orders, &board_query, &self.view.sort, role, reference);
        let projection = project(board_rows, role);
        if !projection.unmapped.is_empty() {
            error!(%role, count = projection.unmapped.len(), "orders outside every board column");
        }
        let columns = projection
            .columns
            .iter()
            .map(|b| BoardColumnView {
                id: b.column.id,
                label: b.column.label,
                orders: b.orders.iter().map(|o| (*o).clone()).collect(),
            })
            .collect();

        let filtered_sorted_orders: Vec<Order> =
            apply_query(&self.orders, &self.view.query, &self.view.sort, role, reference)
                .into_iter()
                .cloned()
                .collect();

        let urgency: BTreeMap<String, Urgency> = self
            .orders
            .iter()
            .map(|o| (o.id.clone(), deadline_urgency(o, reference, due_soon)))
            .collect();

        let selected = self
            .view
            .selected_order
            .as_deref()
            .and_then(|id| self.order(id))
            .map(|o| OrderDetail {
                order: o.clone(),
                timeline: o.timeline().to_vec(),
                available_actions: available_actions(&TransitionContext::for_order(o, role)),
                urgency: deadline_urgency(o, reference, due_soon),
                sync: self.sync_state(&o.id).cloned(),
            });

        let open: Vec<&Order> = self.orders.iter().filter(|o| !o.is_terminal()).collect();
        let summary = DashboardSummary {
            open_orders: open.len(),
            open_value_cents: open
                .iter()
                .fold(0i64, |acc, o| acc.saturating_add(o.total_value_cents())),
            overdue: urgency.values().filter(|u| **u == Urgency::Overdue).count(),
            pending_sync: self.sync.values().filter(|e| e.state.is_pending()).count(),
            failed_sync: self.sync.values().filter(|e| e.state.is_failed()).count(),
            pending_reviews: self.pending_reviews.len(),
        };

        let sync_failures = self
            .sync
            .iter()
            .filter_map(|(id, e)| match &e.state {
                SyncState::Failed { reason } => Some(SyncFailure {
                    order_id: id.clone(),
                    reason: reason.clone(),
                }),
                _ => None,
            })
            .collect();

        DerivedView {
            revision: self.revision,
            columns,
            filtered_sorted_orders,
            urgency,
            selected,
            summary,
            sync_failures,
        }
    }
}
