use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tex_schemas::RemoteOrder;
use tex_status::{to_canonical_wire, CanonicalStatus, PaymentStatus, Role};
use tracing::{debug, warn};

use crate::timeline::{derive_timeline, mark_milestone, timeline_from_remote, TimelineEvent};
use crate::transition::{validate, Action, SideEffect, TransitionContext, TransitionDecision, TransitionError};

/// The other party of an order, from the viewer's side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counterpart {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub product_type: String,
}

/// Fields of an order that are not lifecycle state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewOrder {
    pub id: String,
    pub display_id: String,
    pub counterpart: Counterpart,
    pub product: Product,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub deadline: NaiveDate,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

/// A garment order.
///
/// `status` and `timeline` are private: they change only through
/// [`Order::apply`], which validates first. The total value is derived
/// from quantity and unit price and has no field of its own.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: String,
    pub display_id: String,
    pub counterpart: Counterpart,
    pub product: Product,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub deadline: NaiveDate,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    status: CanonicalStatus,
    timeline: Vec<TimelineEvent>,
}

impl Order {
    /// A freshly created order, in `New`.
    pub fn create(fields: NewOrder) -> Self {
        Self::hydrate(fields, CanonicalStatus::New, &[])
    }

    /// Rebuild an order from stored state. The timeline is re-derived from
    /// `status` and merged with `stored`.
    pub fn hydrate(fields: NewOrder, status: CanonicalStatus, stored: &[TimelineEvent]) -> Self {
        let NewOrder {
            id,
            display_id,
            counterpart,
            product,
            quantity,
            unit_price_cents,
            deadline,
            payment_status,
            created_at,
        } = fields;
        Self {
            id,
            display_id,
            counterpart,
            product,
            quantity,
            unit_price_cents,
            deadline,
            payment_status,
            created_at,
            status,
            timeline: derive_timeline(status, stored),
        }
    }

    /// Decode a service record as seen by `role`.
    ///
    /// Unknown status strings degrade to `New` (with a warning); a total sent
    /// by the service is ignored in favour of the computed one.
    pub fn from_remote(remote: &RemoteOrder, role: Role) -> Self {
        let status = to_canonical_wire(&remote.status, role);
        let computed = match i64::from(remote.quantity).checked_mul(remote.unit_price_cents) {
            Some(total) => total,
            None => {
                warn!(
                    order_id = %remote.id,
                    quantity = remote.quantity,
                    unit_price_cents = remote.unit_price_cents,
                    "order total out of range; clamping"
                );
                total_cents(remote.quantity, remote.unit_price_cents)
            }
        };
        if let Some(sent) = remote.total_value_cents {
            if sent != computed {
                debug!(order_id = %remote.id, sent, computed, "service total differs; using computed total");
            }
        }
        let stored = timeline_from_remote(&remote.timeline);
        Self::hydrate(
            NewOrder {
                id: remote.id.clone(),
                display_id: remote.display_id.clone(),
                counterpart: Counterpart {
                    id: remote.counterpart.id.clone(),
                    name: remote.counterpart.name.clone(),
                },
                product: Product {
                    name: remote.product.name.clone(),
                    product_type: remote.product.product_type.clone(),
                },
                quantity: remote.quantity,
                unit_price_cents: remote.unit_price_cents,
                deadline: remote.deadline,
                payment_status: PaymentStatus::from_wire_or_default(remote.payment_status.as_deref()),
                created_at: remote.created_at,
            },
            status,
            &stored,
        )
    }

    pub fn status(&self) -> CanonicalStatus {
        self.status
    }

    pub fn timeline(&self) -> &[TimelineEvent] {
        &self.timeline
    }

    /// `quantity × unit_price_cents`, clamped to the `i64` range.
    pub fn total_value_cents(&self) -> i64 {
        total_cents(self.quantity, self.unit_price_cents)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Validate `action` as `role` and, if legal, apply it.
    ///
    /// Milestones newly completed by this call are stamped with `at`.
    ///
    /// # Errors
    /// [`TransitionError`] when the action is illegal; the order is untouched.
    pub fn apply(
        &mut self,
        action: Action,
        role: Role,
        at: DateTime<Utc>,
    ) -> Result<TransitionDecision, TransitionError> {
        let decision = validate(&TransitionContext::for_order(self, role), action)?;
        self.apply_decision(&decision, at);
        Ok(decision)
    }

    fn apply_decision(&mut self, decision: &TransitionDecision, at: DateTime<Utc>) {
        if decision.is_noop() {
            return;
        }
        for effect in &decision.effects {
            if let SideEffect::MarkMilestone(m) = effect {
                mark_milestone(&mut self.timeline, *m, at);
            }
        }

        let before: Vec<bool> = self.timeline.iter().map(|e| e.completed).collect();
        self.status = decision.to;
        self.timeline = derive_timeline(self.status, &self.timeline);
        for (ev, was) in self.timeline.iter_mut().zip(before) {
            if ev.completed && !was && ev.completed_at.is_none() {
                ev.completed_at = Some(at);
            }
        }
    }
}

fn total_cents(quantity: u32, unit_price_cents: i64) -> i64 {
    i64::from(quantity).saturating_mul(unit_price_cents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::{derive_timeline, Milestone};
    use chrono::TimeZone;
    use tex_schemas::{RemoteCounterpart, RemoteProduct};

    fn fields() -> NewOrder {
        NewOrder {
            id: "o-1".into(),
            display_id: "#100".into(),
            counterpart: Counterpart {
                id: "sup-1".into(),
                name: "Oficina Boa Costura".into(),
            },
            product: Product {
                name: "Camisa Polo".into(),
                product_type: "camisa".into(),
            },
            quantity: 120,
            unit_price_cents: 2_500,
            deadline: NaiveDate::from_ymd_opt(2026, 2, 15).unwrap(),
            payment_status: PaymentStatus::Pending,
            created_at: Utc.with_ymd_and_hms(2026, 1, 20, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn total_is_quantity_times_unit_price() {
        let mut o = Order::create(fields());
        assert_eq!(o.total_value_cents(), 300_000);
        o.quantity = 10;
        assert_eq!(o.total_value_cents(), 25_000);
    }

    #[test]
    fn new_order_has_only_created_milestone() {
        let o = Order::create(fields());
        assert_eq!(o.status(), CanonicalStatus::New);
        let done: Vec<_> = o.timeline().iter().filter(|e| e.completed).collect();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].milestone, Milestone::Created);
    }

    #[test]
    fn apply_stamps_newly_reached_milestones() {
        let at = Utc.with_ymd_and_hms(2026, 1, 21, 9, 0, 0).unwrap();
        let mut o = Order::create(fields());
        o.apply(Action::Accept, Role::Supplier, at).unwrap();
        assert_eq!(o.status(), CanonicalStatus::Accepted);
        assert_eq!(o.timeline()[1].completed_at, Some(at));
        // Created was derived at hydration and has no stored time.
        assert_eq!(o.timeline()[0].completed_at, None);
    }

    #[test]
    fn illegal_apply_leaves_order_untouched() {
        let at = Utc.with_ymd_and_hms(2026, 1, 21, 9, 0, 0).unwrap();
        let mut o = Order::create(fields());
        let before = o.clone();
        let err = o.apply(Action::Advance, Role::Supplier, at).unwrap_err();
        assert_eq!(err.from, CanonicalStatus::New);
        assert_eq!(o, before);
    }

    #[test]
    fn out_of_range_total_is_clamped_not_wrapped() {
        let remote = RemoteOrder {
            id: "o-big".into(),
            display_id: "#9000".into(),
            counterpart: RemoteCounterpart {
                id: "sup-1".into(),
                name: "Oficina Boa Costura".into(),
            },
            product: RemoteProduct {
                name: "Camisa Polo".into(),
                product_type: "camisa".into(),
            },
            quantity: 4_000_000_000,
            unit_price_cents: 9_000_000_000_000,
            total_value_cents: None,
            deadline: NaiveDate::from_ymd_opt(2026, 2, 15).unwrap(),
            status: "in_production".into(),
            payment_status: None,
            created_at: Utc.with_ymd_and_hms(2026, 1, 20, 10, 0, 0).unwrap(),
            timeline: Vec::new(),
        };
        let o = Order::from_remote(&remote, Role::Supplier);
        assert_eq!(o.total_value_cents(), i64::MAX);

        let mut refund = o.clone();
        refund.unit_price_cents = -9_000_000_000_000;
        assert_eq!(refund.total_value_cents(), i64::MIN);
    }

    #[test]
    fn stored_receipt_does_not_pin_order_in_waiting() {
        let received_at = Utc.with_ymd_and_hms(2026, 1, 22, 8, 0, 0).unwrap();
        let mut stored: Vec<_> = derive_timeline(CanonicalStatus::Production, &[])
            .into_iter()
            .filter(|e| e.milestone == Milestone::MaterialsReceived)
            .collect();
        stored[0].completed_at = Some(received_at);

        let mut o = Order::hydrate(fields(), CanonicalStatus::Waiting, &stored);
        let at = Utc.with_ymd_and_hms(2026, 1, 23, 9, 0, 0).unwrap();
        let d = o.apply(Action::ConfirmReceipt, Role::Supplier, at).unwrap();

        assert_eq!(d.to, CanonicalStatus::Production);
        assert_eq!(o.status(), CanonicalStatus::Production);
        let receipt = o
            .timeline()
            .iter()
            .find(|e| e.milestone == Milestone::MaterialsReceived)
            .unwrap();
        assert_eq!(receipt.completed_at, Some(received_at));

        // Now a genuine replay.
        let again = o.apply(Action::ConfirmReceipt, Role::Supplier, at).unwrap();
        assert!(again.is_noop());
        assert_eq!(o.status(), CanonicalStatus::Production);
    }
}
