//! A small order book with fixed dates.
//!
//! | id    | display | product       | created    | service status      |
//! |-------|---------|---------------|------------|---------------------|
//! | o-100 | #100    | Camisa Polo   | 2026-01-20 | pending             |
//! | o-200 | #200    | Calça Jeans   | 2026-01-01 | supplies_in_transit |
//! | o-300 | #300    | Vestido Midi  | 2026-01-10 | in_production       |
//! | o-400 | #400    | Jaqueta Jeans | 2026-01-12 | ready_to_ship       |
//! | o-500 | #500    | Bermuda Sarja | 2026-01-15 | declined            |
//! | o-600 | #600    | Saia Plissada | 2026-01-24 | counter_offer       |

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tex_schemas::{PendingReview, RemoteCounterpart, RemoteOrder, RemoteProduct};
use uuid::Uuid;

/// "Now" for scenarios: 2026-01-25 12:00 UTC.
pub fn reference_instant() -> DateTime<Utc> {
    utc(2026, 1, 25, 12)
}

/// Timestamp the in-memory service stamps on acknowledgements.
pub fn ack_instant() -> DateTime<Utc> {
    utc(2026, 1, 25, 12) + chrono::Duration::minutes(1)
}

pub fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid fixture date")
}

#[allow(clippy::too_many_arguments)]
pub fn remote_order(
    id: &str,
    display_id: &str,
    product: &str,
    product_type: &str,
    quantity: u32,
    unit_price_cents: i64,
    deadline: NaiveDate,
    created_at: DateTime<Utc>,
    status: &str,
) -> RemoteOrder {
    RemoteOrder {
        id: id.to_string(),
        display_id: display_id.to_string(),
        counterpart: RemoteCounterpart {
            id: "sup-1".to_string(),
            name: "Oficina Boa Costura".to_string(),
        },
        product: RemoteProduct {
            name: product.to_string(),
            product_type: product_type.to_string(),
        },
        quantity,
        unit_price_cents,
        total_value_cents: None,
        deadline,
        status: status.to_string(),
        payment_status: Some("pending".to_string()),
        created_at,
        timeline: Vec::new(),
    }
}

#[rustfmt::skip]
pub fn order_book() -> Vec<RemoteOrder> {
    vec![
        remote_order("o-100", "#100", "Camisa Polo", "camisa", 120, 2_500, date(2026, 2, 15), utc(2026, 1, 20, 10), "pending"),
        remote_order("o-200", "#200", "Calça Jeans", "calca", 80, 6_000, date(2026, 1, 27), utc(2026, 1, 1, 9), "supplies_in_transit"),
        remote_order("o-300", "#300", "Vestido Midi", "vestido", 50, 9_000, date(2026, 1, 20), utc(2026, 1, 10, 14), "in_production"),
        remote_order("o-400", "#400", "Jaqueta Jeans", "jaqueta", 40, 15_000, date(2026, 3, 1), utc(2026, 1, 12, 8), "ready_to_ship"),
        remote_order("o-500", "#500", "Bermuda Sarja", "bermuda", 60, 4_000, date(2026, 1, 5), utc(2026, 1, 15, 11), "declined"),
        remote_order("o-600", "#600", "Saia Plissada", "saia", 30, 7_000, date(2026, 2, 28), utc(2026, 1, 24, 16), "counter_offer"),
    ]
}

pub fn pending_reviews() -> Vec<PendingReview> {
    vec![PendingReview {
        review_id: Uuid::from_u128(0x7e57_0001),
        order_id: "o-300".to_string(),
        summary: "Amostra de tecido aguardando aprovação".to_string(),
        submitted_at: utc(2026, 1, 23, 15),
    }]
}
