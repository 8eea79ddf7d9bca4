//! Scenario: dismissing the detail view never cancels persistence
//!
//! # Invariants under test
//! 1. `request_action` stages an action and selects the order; nothing is
//!    sent until `confirm_pending`.
//! 2. `close_detail` right after confirming clears selection and staged
//!    state, while the request still completes and is recorded.
//! 3. `cancel_pending` sends nothing and changes no order.
//! 4. An illegal staged action is refused up front with a message.

use std::sync::Arc;

use tex_config::{DashboardSettings, PersistencePolicy};
use tex_dashboard::{ActionError, Dashboard, PendingConfirmation, SyncState};
use tex_orders::{Action, RejectReason};
use tex_status::{CanonicalStatus, Role};
use tex_testkit::{fixtures, InMemoryOrderService};

async fn supplier_dashboard(
    service: &Arc<InMemoryOrderService>,
) -> Dashboard<InMemoryOrderService> {
    let settings = DashboardSettings {
        role: Role::Supplier,
        persistence: PersistencePolicy {
            max_attempts: 1,
            retry_backoff_ms: 0,
        },
        ..DashboardSettings::default()
    };
    let mut dash = Dashboard::new(Arc::clone(service), settings, fixtures::reference_instant());
    dash.load().await.unwrap();
    dash
}

fn service() -> Arc<InMemoryOrderService> {
    Arc::new(InMemoryOrderService::new(
        fixtures::order_book(),
        fixtures::ack_instant(),
    ))
}

#[tokio::test]
async fn request_in_flight_survives_close_detail() {
    let service = service();
    service.hold_writes();
    let mut dash = supplier_dashboard(&service).await;

    dash.request_action("o-300", Action::Advance).unwrap();
    assert_eq!(
        dash.view_state().pending,
        Some(PendingConfirmation {
            order_id: "o-300".into(),
            action: Action::Advance,
        })
    );
    assert_eq!(
        dash.derived().selected.as_ref().map(|d| d.order.id.as_str()),
        Some("o-300")
    );
    assert_eq!(
        dash.order("o-300").unwrap().status(),
        CanonicalStatus::Production,
        "staging changes nothing"
    );

    dash.confirm_pending().unwrap();
    dash.close_detail();

    assert!(dash.view_state().selected_order.is_none());
    assert!(dash.view_state().pending.is_none());
    assert!(dash.derived().selected.is_none());
    assert!(dash.sync_state("o-300").unwrap().is_pending());

    service.release_writes(1);
    assert!(dash.next_outcome().await);

    assert_eq!(service.request_count(), 1);
    assert_eq!(service.stored_status("o-300").as_deref(), Some("ready_to_ship"));
    assert!(matches!(
        dash.sync_state("o-300"),
        Some(SyncState::Synced { .. })
    ));
    assert_eq!(
        dash.order("o-300").unwrap().status(),
        CanonicalStatus::ReadySend
    );
}

#[tokio::test]
async fn cancel_pending_sends_nothing() {
    let service = service();
    let mut dash = supplier_dashboard(&service).await;

    dash.request_action("o-100", Action::Reject).unwrap();
    dash.cancel_pending();

    assert!(dash.view_state().pending.is_none());
    // Selection stays; only the confirmation is dismissed.
    assert_eq!(dash.view_state().selected_order.as_deref(), Some("o-100"));
    assert_eq!(dash.order("o-100").unwrap().status(), CanonicalStatus::New);
    assert_eq!(dash.in_flight(), 0);
    assert_eq!(service.request_count(), 0);
    assert_eq!(dash.confirm_pending(), Err(ActionError::NothingPending));
}

#[tokio::test]
async fn illegal_action_is_refused_before_staging() {
    let service = service();
    let mut dash = supplier_dashboard(&service).await;

    let err = dash.request_action("o-100", Action::Advance).unwrap_err();
    match &err {
        ActionError::Transition(e) => assert_eq!(e.reason, RejectReason::InvalidActionForStatus),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(dash.view_state().pending.is_none());
    assert_eq!(dash.last_message(), Some(err.message().as_str()));

    assert_eq!(
        dash.request_action("o-999", Action::Accept),
        Err(ActionError::UnknownOrder("o-999".into()))
    );
}
