//! Command handler modules for the `tex` CLI.
//!
//! Shared utilities used by multiple command paths live here.
//! Command-specific logic lives in the submodules.

pub mod board;
pub mod config;
pub mod order;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fs;
use tex_orders::{format_brl, Order};
use tex_schemas::RemoteOrder;
use tex_status::Role;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

pub fn parse_role(role: &str) -> Result<Role> {
    Ok(role.parse::<Role>()?)
}

/// `--at` as an RFC 3339 instant, or now.
pub fn parse_reference(at: Option<&str>) -> Result<DateTime<Utc>> {
    match at {
        Some(raw) => DateTime::parse_from_rfc3339(raw.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .with_context(|| format!("invalid --at '{raw}' (expected RFC 3339)")),
        None => Ok(Utc::now()),
    }
}

/// Read a JSON array of service records and decode them as `role` sees them.
/// Duplicate ids keep the first record.
pub fn load_orders(path: &str, role: Role) -> Result<Vec<Order>> {
    let bytes = fs::read(path).with_context(|| format!("read orders file failed: {path}"))?;
    // Files saved by Windows editors often start with a UTF-8 BOM.
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(&bytes);
    let remote: Vec<RemoteOrder> = serde_json::from_slice(bytes)
        .with_context(|| format!("orders file must contain a JSON array of orders: {path}"))?;

    let mut seen = BTreeSet::new();
    let mut out = Vec::with_capacity(remote.len());
    for r in &remote {
        if !seen.insert(r.id.clone()) {
            warn!(order_id = %r.id, "duplicate order in file; keeping first");
            continue;
        }
        out.push(Order::from_remote(r, role));
    }
    debug!(path, %role, orders = out.len(), "orders loaded");
    Ok(out)
}

pub fn find_order<'a>(orders: &'a [Order], order_id: &str) -> Result<&'a Order> {
    orders
        .iter()
        .find(|o| o.id == order_id)
        .ok_or_else(|| anyhow!("unknown order id: {order_id}"))
}

/// One order on one line.
pub fn order_line(o: &Order) -> String {
    format!(
        "{} {} | {} | {} | {} | deadline={}",
        o.display_id,
        o.product.name,
        o.counterpart.name,
        o.status(),
        format_brl(o.total_value_cents()),
        o.deadline
    )
}
