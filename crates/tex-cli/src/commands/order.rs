//! `tex transition` and `tex timeline`.

use anyhow::{anyhow, bail, Result};
use tex_orders::{validate, Action, TransitionContext};
use tex_status::to_external_for_write;

use super::{find_order, load_orders, parse_role};

/// Dry run: prints the next status and the value that would be written.
pub fn transition(orders_path: &str, role: &str, order_id: &str, action: &str) -> Result<()> {
    let role = parse_role(role)?;
    let action: Action = action.parse().map_err(|e: String| anyhow!(e))?;
    let orders = load_orders(orders_path, role)?;
    let order = find_order(&orders, order_id)?;

    let decision = match validate(&TransitionContext::for_order(order, role), action) {
        Ok(d) => d,
        Err(e) => bail!("{} ({})", e.reason.as_str(), e.message()),
    };

    println!("order_id={}", order.id);
    println!("action={action}");
    println!("from={}", decision.from);
    println!("to={}", decision.to);
    match decision.persisted_status() {
        Some(target) => {
            let external = to_external_for_write(target, role)?;
            println!("write={external}");
        }
        None => println!("noop=true"),
    }
    Ok(())
}

pub fn timeline(orders_path: &str, role: &str, order_id: &str) -> Result<()> {
    let role = parse_role(role)?;
    let orders = load_orders(orders_path, role)?;
    let order = find_order(&orders, order_id)?;

    println!("order_id={} status={}", order.id, order.status());
    for ev in order.timeline() {
        let mark = if ev.completed { "x" } else { " " };
        let at = ev
            .completed_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_default();
        println!("[{mark}] {} {at}", ev.step);
    }
    Ok(())
}
