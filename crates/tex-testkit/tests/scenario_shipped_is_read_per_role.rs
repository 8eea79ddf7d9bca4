//! Scenario: one service record, two readings
//!
//! # Invariant under test
//! When the workshop finalizes an order the service stores `shipped`. The
//! workshop reads that back as FINALIZED; the brand, still waiting for
//! delivery, reads it as READY_SEND. Each dashboard keeps its own copy.

use std::sync::Arc;

use tex_config::{DashboardSettings, PersistencePolicy};
use tex_dashboard::{ActionError, Dashboard};
use tex_orders::{Action, RejectReason};
use tex_status::{CanonicalStatus, ExternalStatus, Role};
use tex_testkit::{fixtures, InMemoryOrderService, StatusRequest};

fn settings(role: Role) -> DashboardSettings {
    DashboardSettings {
        role,
        persistence: PersistencePolicy {
            max_attempts: 1,
            retry_backoff_ms: 0,
        },
        ..DashboardSettings::default()
    }
}

fn column_of(dash: &Dashboard<InMemoryOrderService>, order_id: &str) -> Option<&'static str> {
    dash.derived()
        .columns
        .iter()
        .find(|c| c.orders.iter().any(|o| o.id == order_id))
        .map(|c| c.id)
}

#[tokio::test]
async fn supplier_finalize_is_ready_send_for_brand() {
    let service = Arc::new(InMemoryOrderService::new(
        fixtures::order_book(),
        fixtures::ack_instant(),
    ));
    let reference = fixtures::reference_instant();
    let mut supplier = Dashboard::new(Arc::clone(&service), settings(Role::Supplier), reference);
    let mut brand = Dashboard::new(Arc::clone(&service), settings(Role::Brand), reference);
    supplier.load().await.unwrap();
    brand.load().await.unwrap();

    assert_eq!(column_of(&brand, "o-400"), Some("envio"));
    assert_eq!(column_of(&supplier, "o-400"), Some("envio"));

    supplier.apply_action("o-400", Action::Advance).unwrap();
    assert!(supplier.next_outcome().await);
    assert_eq!(
        service.requests(),
        vec![StatusRequest {
            order_id: "o-400".into(),
            status: ExternalStatus::Shipped,
        }]
    );
    assert_eq!(service.stored_status("o-400").as_deref(), Some("shipped"));

    // The brand has not reloaded: its copy is untouched.
    assert_eq!(brand.order("o-400").unwrap().status(), CanonicalStatus::ReadySend);

    brand.load().await.unwrap();
    supplier.load().await.unwrap();

    assert_eq!(brand.order("o-400").unwrap().status(), CanonicalStatus::ReadySend);
    assert_eq!(column_of(&brand, "o-400"), Some("envio"));

    assert_eq!(supplier.order("o-400").unwrap().status(), CanonicalStatus::Finalized);
    assert_eq!(column_of(&supplier, "o-400"), Some("finalizados"));
    assert!(supplier
        .derived()
        .filtered_sorted_orders
        .iter()
        .all(|o| o.id != "o-400"));

    // Only the workshop advances.
    assert!(matches!(
        brand.apply_action("o-400", Action::Advance),
        Err(ActionError::Transition(ref e)) if e.reason == RejectReason::InvalidActionForRole
    ));
}
