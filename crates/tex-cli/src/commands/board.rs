//! `tex board` and `tex list`.

use anyhow::{anyhow, Result};
use std::collections::BTreeSet;
use tex_board::{
    apply_query, deadline_urgency, project, DateRange, OrderQuery, SortSpec,
};
use tex_status::CanonicalStatus;

use super::{load_orders, order_line, parse_reference, parse_role};

pub fn board(orders_path: &str, role: &str, at: Option<String>) -> Result<()> {
    let role = parse_role(role)?;
    let reference = parse_reference(at.as_deref())?;
    let orders = load_orders(orders_path, role)?;

    let rows = apply_query(&orders, &OrderQuery::default(), &SortSpec::default(), role, reference);
    let projection = project(rows, role);
    for bucket in &projection.columns {
        println!(
            "column={} label=\"{}\" count={}",
            bucket.column.id,
            bucket.column.label,
            bucket.orders.len()
        );
        for o in &bucket.orders {
            println!("  {}", order_line(o));
        }
    }
    if !projection.unmapped.is_empty() {
        println!("unmapped={}", projection.unmapped.len());
    }
    Ok(())
}

pub struct ListArgs {
    pub search: Option<String>,
    pub range: Option<String>,
    pub statuses: Vec<String>,
    pub sort: Option<String>,
    pub all: bool,
    pub at: Option<String>,
    pub due_soon_days: i64,
}

pub fn list(orders_path: &str, role: &str, args: ListArgs) -> Result<()> {
    let role = parse_role(role)?;
    let reference = parse_reference(args.at.as_deref())?;

    let date_range = args
        .range
        .as_deref()
        .map(|r| r.parse::<DateRange>())
        .transpose()
        .map_err(|e| anyhow!("invalid --range: {e}"))?;
    let statuses = args
        .statuses
        .iter()
        .map(|s| s.parse::<CanonicalStatus>())
        .collect::<Result<BTreeSet<_>, _>>()
        .map_err(|e| anyhow!("invalid --status: {e}"))?;
    let sort = match args.sort.as_deref() {
        Some(raw) => raw
            .parse::<SortSpec>()
            .map_err(|e| anyhow!("invalid --sort: {e}"))?,
        None => SortSpec::default(),
    };
    let query = OrderQuery {
        search: args.search,
        date_range,
        statuses,
        hide_terminal: !args.all,
        ..OrderQuery::default()
    };

    let orders = load_orders(orders_path, role)?;
    let rows = apply_query(&orders, &query, &sort, role, reference);
    for o in &rows {
        println!(
            "{} urgency={}",
            order_line(o),
            deadline_urgency(o, reference, args.due_soon_days)
        );
    }
    println!("count={}", rows.len());
    Ok(())
}
