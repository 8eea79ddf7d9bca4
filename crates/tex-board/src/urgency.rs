//! Deadline urgency relative to an injected reference instant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tex_orders::Order;

pub const DEFAULT_DUE_SOON_DAYS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    Overdue,
    DueSoon,
    OnTrack,
    /// Terminal order; the deadline no longer matters.
    Closed,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Overdue => "OVERDUE",
            Urgency::DueSoon => "DUE_SOON",
            Urgency::OnTrack => "ON_TRACK",
            Urgency::Closed => "CLOSED",
        }
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whole days from the reference date to the deadline. Negative once past.
pub fn days_until_deadline(order: &Order, reference: DateTime<Utc>) -> i64 {
    (order.deadline - reference.date_naive()).num_days()
}

pub fn deadline_urgency(order: &Order, reference: DateTime<Utc>, due_soon_days: i64) -> Urgency {
    if order.is_terminal() {
        return Urgency::Closed;
    }
    match days_until_deadline(order, reference) {
        d if d < 0 => Urgency::Overdue,
        d if d <= due_soon_days => Urgency::DueSoon,
        _ => Urgency::OnTrack,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use tex_orders::{Action, Counterpart, NewOrder, Product};
    use tex_status::{PaymentStatus, Role};

    fn due(y: i32, m: u32, d: u32) -> Order {
        Order::create(NewOrder {
            id: "o".into(),
            display_id: "#1".into(),
            counterpart: Counterpart {
                id: "c".into(),
                name: "C".into(),
            },
            product: Product {
                name: "Camisa".into(),
                product_type: "camisa".into(),
            },
            quantity: 1,
            unit_price_cents: 100,
            deadline: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            payment_status: PaymentStatus::Pending,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        })
    }

    #[test]
    fn buckets_by_days_left() {
        let r = Utc.with_ymd_and_hms(2026, 2, 10, 18, 0, 0).unwrap();
        assert_eq!(deadline_urgency(&due(2026, 2, 9), r, 3), Urgency::Overdue);
        assert_eq!(deadline_urgency(&due(2026, 2, 10), r, 3), Urgency::DueSoon);
        assert_eq!(deadline_urgency(&due(2026, 2, 13), r, 3), Urgency::DueSoon);
        assert_eq!(deadline_urgency(&due(2026, 2, 14), r, 3), Urgency::OnTrack);
    }

    #[test]
    fn terminal_orders_are_closed_even_when_late() {
        let r = Utc.with_ymd_and_hms(2026, 2, 10, 0, 0, 0).unwrap();
        let mut o = due(2026, 1, 5);
        o.apply(Action::Reject, Role::Supplier, r).unwrap();
        assert_eq!(deadline_urgency(&o, r, DEFAULT_DUE_SOON_DAYS), Urgency::Closed);
    }
}
