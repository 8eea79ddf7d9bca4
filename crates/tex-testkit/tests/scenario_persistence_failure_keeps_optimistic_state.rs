//! Scenario: persistence failure keeps the optimistic update
//!
//! # Invariants under test
//! 1. An accepted action is visible locally before the service answers, and
//!    the order is marked pending.
//! 2. When every attempt fails, the local status is NOT rolled back; the
//!    order is flagged `Failed` with the service's reason and shows up in
//!    the derived view's sync failures.
//! 3. Reloading does not overwrite an unsynced local change.
//! 4. `retry_sync` resubmits the current status and clears the failure.
//! 5. Transient failures inside the retry budget end in `Synced`.

use std::sync::Arc;

use tex_config::{DashboardSettings, PersistencePolicy};
use tex_dashboard::{ActionError, Dashboard, SyncState};
use tex_orders::Action;
use tex_status::{CanonicalStatus, ExternalStatus, Role};
use tex_testkit::{fixtures, InMemoryOrderService, StatusRequest};

fn supplier_settings() -> DashboardSettings {
    DashboardSettings {
        role: Role::Supplier,
        persistence: PersistencePolicy {
            max_attempts: 3,
            retry_backoff_ms: 0,
        },
        ..DashboardSettings::default()
    }
}

fn service() -> Arc<InMemoryOrderService> {
    Arc::new(InMemoryOrderService::new(
        fixtures::order_book(),
        fixtures::ack_instant(),
    ))
}

async fn loaded(service: &Arc<InMemoryOrderService>) -> Dashboard<InMemoryOrderService> {
    let mut dash = Dashboard::new(
        Arc::clone(service),
        supplier_settings(),
        fixtures::reference_instant(),
    );
    dash.load().await.expect("load must succeed");
    dash
}

#[tokio::test]
async fn exhausted_retries_flag_the_order_without_rollback() {
    let service = service();
    service.fail_all_writes("service unavailable");
    let mut dash = loaded(&service).await;

    let decision = dash
        .apply_action("o-100", Action::Accept)
        .expect("supplier may accept a new order");
    assert_eq!(decision.to, CanonicalStatus::Accepted);

    // Optimistic: local state changed before any outcome arrived.
    assert_eq!(
        dash.order("o-100").unwrap().status(),
        CanonicalStatus::Accepted
    );
    assert!(dash.sync_state("o-100").unwrap().is_pending());
    assert_eq!(dash.derived().summary.pending_sync, 1);

    assert!(dash.next_outcome().await);

    assert_eq!(
        dash.order("o-100").unwrap().status(),
        CanonicalStatus::Accepted,
        "failed persistence must not roll back"
    );
    match dash.sync_state("o-100") {
        Some(SyncState::Failed { reason }) => assert!(reason.contains("service unavailable")),
        other => panic!("expected Failed, got {other:?}"),
    }

    let expected = StatusRequest {
        order_id: "o-100".into(),
        status: ExternalStatus::Approved,
    };
    assert_eq!(service.requests(), vec![expected.clone(), expected.clone(), expected]);
    assert_eq!(service.stored_status("o-100").as_deref(), Some("pending"));

    let view = dash.derived();
    assert_eq!(view.revision, dash.revision());
    assert_eq!(view.sync_failures.len(), 1);
    assert_eq!(view.sync_failures[0].order_id, "o-100");
    assert_eq!(view.summary.failed_sync, 1);
    assert_eq!(view.summary.pending_sync, 0);

    // The service still says "pending"; the unsynced local change wins.
    dash.load().await.unwrap();
    assert_eq!(
        dash.order("o-100").unwrap().status(),
        CanonicalStatus::Accepted
    );
    assert!(dash.sync_state("o-100").unwrap().is_failed());
}

#[tokio::test]
async fn retry_sync_resubmits_and_clears_the_failure() {
    let service = service();
    service.fail_all_writes("timeout");
    let mut dash = loaded(&service).await;

    dash.apply_action("o-100", Action::Negotiate).unwrap();
    assert!(dash.next_outcome().await);
    assert!(dash.sync_state("o-100").unwrap().is_failed());

    service.recover();
    dash.retry_sync("o-100").expect("failed order can be retried");
    assert!(dash.sync_state("o-100").unwrap().is_pending());

    assert!(dash.next_outcome().await);
    assert_eq!(
        dash.sync_state("o-100"),
        Some(&SyncState::Synced {
            at: Some(fixtures::ack_instant())
        })
    );
    assert_eq!(service.stored_status("o-100").as_deref(), Some("counter_offer"));
    assert!(dash.derived().sync_failures.is_empty());

    assert_eq!(
        dash.retry_sync("o-100"),
        Err(ActionError::NotFailed("o-100".into()))
    );
}

#[tokio::test]
async fn transient_failures_within_budget_end_synced() {
    let service = service();
    service.fail_next_writes(2, "connection reset");
    let mut dash = loaded(&service).await;

    dash.apply_action("o-300", Action::Advance).unwrap();
    assert!(dash.next_outcome().await);

    assert_eq!(service.request_count(), 3);
    assert_eq!(service.stored_status("o-300").as_deref(), Some("ready_to_ship"));
    assert!(matches!(
        dash.sync_state("o-300"),
        Some(SyncState::Synced { .. })
    ));
    assert_eq!(dash.derived().summary.failed_sync, 0);
}
