//! Query Engine
//!
//! # Design
//!
//! Filtering and sorting are pure functions over borrowed orders. Nothing
//! here reads the clock: date ranges are evaluated against a `reference`
//! instant passed in by the caller, so the same inputs always give the same
//! output.
//!
//! All filters combine with AND. An absent filter is a no-op; in particular
//! `OrderQuery::default()` matches every order, terminal ones included.
//! Hiding terminal orders is an explicit opt-in (`hide_terminal`) used by
//! working lists.
//!
//! A status filter is expanded through the role's columns before matching:
//! selecting `PRODUCTION` on the brand board selects the whole "andamento"
//! column (`ACCEPTED`, `WAITING`, `PRODUCTION`).

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use tex_orders::Order;
use tex_status::{CanonicalStatus, Role};

use crate::columns::column_for;

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DateRange {
    /// Same UTC calendar date as the reference.
    Today,
    /// Created within the 7 days up to and including the reference.
    Week,
    /// Same UTC calendar month as the reference.
    Month,
}

impl DateRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateRange::Today => "TODAY",
            DateRange::Week => "WEEK",
            DateRange::Month => "MONTH",
        }
    }

    pub fn contains(&self, created_at: DateTime<Utc>, reference: DateTime<Utc>) -> bool {
        match self {
            DateRange::Today => created_at.date_naive() == reference.date_naive(),
            DateRange::Week => {
                created_at <= reference && created_at >= reference - Duration::days(7)
            }
            DateRange::Month => {
                created_at.year() == reference.year() && created_at.month() == reference.month()
            }
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DateRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TODAY" | "HOJE" => Ok(DateRange::Today),
            "WEEK" | "SEMANA" => Ok(DateRange::Week),
            "MONTH" | "MES" | "MÊS" => Ok(DateRange::Month),
            other => Err(format!("unknown date range: {other}")),
        }
    }
}

/// Search text plus structured filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderQuery {
    /// Case-insensitive substring over display id, counterpart name and
    /// product name. Blank text matches everything.
    pub search: Option<String>,
    pub date_range: Option<DateRange>,
    /// Selected statuses, before column expansion. Empty means any.
    pub statuses: BTreeSet<CanonicalStatus>,
    pub counterpart_id: Option<String>,
    pub product_type: Option<String>,
    /// Drop terminal orders unless the status filter names them.
    pub hide_terminal: bool,
}

impl OrderQuery {
    pub fn is_empty(&self) -> bool {
        *self == OrderQuery::default()
    }
}

/// Widen `selected` to every status sharing a column with a selected one.
pub fn expand_statuses(
    selected: &BTreeSet<CanonicalStatus>,
    role: Role,
) -> BTreeSet<CanonicalStatus> {
    let mut out = BTreeSet::new();
    for status in selected {
        out.insert(*status);
        if let Some(col) = column_for(*status, role) {
            out.extend(col.statuses.iter().copied());
        }
    }
    out
}

fn matches_search(order: &Order, needle: &str) -> bool {
    let hay = [
        order.display_id.as_str(),
        order.counterpart.name.as_str(),
        order.product.name.as_str(),
    ];
    hay.iter().any(|h| h.to_lowercase().contains(needle))
}

/// Evaluate the query's filters. `statuses` must already be expanded.
fn matches(
    order: &Order,
    query: &OrderQuery,
    needle: Option<&str>,
    statuses: &BTreeSet<CanonicalStatus>,
    reference: DateTime<Utc>,
) -> bool {
    if let Some(needle) = needle {
        if !matches_search(order, needle) {
            return false;
        }
    }
    if let Some(range) = query.date_range {
        if !range.contains(order.created_at, reference) {
            return false;
        }
    }
    if !statuses.is_empty() && !statuses.contains(&order.status()) {
        return false;
    }
    if query.hide_terminal && order.is_terminal() && !statuses.contains(&order.status()) {
        return false;
    }
    if let Some(id) = &query.counterpart_id {
        if order.counterpart.id != *id {
            return false;
        }
    }
    if let Some(pt) = &query.product_type {
        if order.product.product_type != *pt {
            return false;
        }
    }
    true
}

/// Orders matching every filter in `query`, in input order.
pub fn filter_orders<'a, I>(
    orders: I,
    query: &OrderQuery,
    role: Role,
    reference: DateTime<Utc>,
) -> Vec<&'a Order>
where
    I: IntoIterator<Item = &'a Order>,
{
    let needle = query
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());
    let statuses = expand_statuses(&query.statuses, role);
    orders
        .into_iter()
        .filter(|o| matches(o, query, needle.as_deref(), &statuses, reference))
        .collect()
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    CreatedAt,
    Deadline,
    TotalValue,
    Quantity,
    DisplayId,
    Status,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "created_at" | "created" | "date" => Ok(SortKey::CreatedAt),
            "deadline" | "prazo" => Ok(SortKey::Deadline),
            "total_value" | "value" | "total" => Ok(SortKey::TotalValue),
            "quantity" | "qty" => Ok(SortKey::Quantity),
            "display_id" | "id" => Ok(SortKey::DisplayId),
            "status" => Ok(SortKey::Status),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(format!("unknown sort direction: {other}")),
        }
    }
}

/// Ordered sort keys; later keys break ties of earlier ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub keys: Vec<(SortKey, SortDirection)>,
}

impl SortSpec {
    pub fn by(key: SortKey, direction: SortDirection) -> Self {
        Self {
            keys: vec![(key, direction)],
        }
    }

    pub fn then(mut self, key: SortKey, direction: SortDirection) -> Self {
        self.keys.push((key, direction));
        self
    }

    pub fn compare(&self, a: &Order, b: &Order) -> Ordering {
        for (key, dir) in &self.keys {
            let ord = compare_by(*key, a, b);
            let ord = match dir {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

impl Default for SortSpec {
    /// Newest first.
    fn default() -> Self {
        SortSpec::by(SortKey::CreatedAt, SortDirection::Desc)
    }
}

/// Parses `key[:dir][,key[:dir]...]`, e.g. `value:desc,created:asc`.
impl FromStr for SortSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut keys = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, dir) = match part.split_once(':') {
                Some((k, d)) => (k.parse::<SortKey>()?, d.parse::<SortDirection>()?),
                None => (part.parse::<SortKey>()?, SortDirection::default()),
            };
            keys.push((key, dir));
        }
        if keys.is_empty() {
            return Err("empty sort spec".to_string());
        }
        Ok(SortSpec { keys })
    }
}

fn compare_by(key: SortKey, a: &Order, b: &Order) -> Ordering {
    match key {
        SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
        SortKey::Deadline => a.deadline.cmp(&b.deadline),
        SortKey::TotalValue => a.total_value_cents().cmp(&b.total_value_cents()),
        SortKey::Quantity => a.quantity.cmp(&b.quantity),
        SortKey::DisplayId => compare_display_ids(&a.display_id, &b.display_id),
        SortKey::Status => a.status().rank().cmp(&b.status().rank()),
    }
}

/// `#99` sorts before `#100`. Numeric ids come before every non-numeric
/// one, which compare as text among themselves, so the order stays total.
fn compare_display_ids(a: &str, b: &str) -> Ordering {
    let num = |s: &str| s.trim_start_matches('#').parse::<u64>().ok();
    match (num(a), num(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Stable sort into a new vector. The input slice is not reordered.
pub fn sort_orders<'a>(orders: &[&'a Order], spec: &SortSpec) -> Vec<&'a Order> {
    let mut out = orders.to_vec();
    out.sort_by(|a, b| spec.compare(a, b));
    out
}

/// Filter then sort.
pub fn apply_query<'a, I>(
    orders: I,
    query: &OrderQuery,
    sort: &SortSpec,
    role: Role,
    reference: DateTime<Utc>,
) -> Vec<&'a Order>
where
    I: IntoIterator<Item = &'a Order>,
{
    let filtered = filter_orders(orders, query, role, reference);
    sort_orders(&filtered, sort)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn week_window_is_inclusive_and_bounded() {
        let r = Utc.with_ymd_and_hms(2026, 1, 25, 12, 0, 0).unwrap();
        assert!(DateRange::Week.contains(r - Duration::days(7), r));
        assert!(DateRange::Week.contains(r, r));
        assert!(!DateRange::Week.contains(r - Duration::days(8), r));
        assert!(!DateRange::Week.contains(r + Duration::seconds(1), r));
    }

    #[test]
    fn month_and_today_use_calendar_fields() {
        let r = Utc.with_ymd_and_hms(2026, 3, 1, 0, 30, 0).unwrap();
        assert!(DateRange::Today.contains(Utc.with_ymd_and_hms(2026, 3, 1, 23, 0, 0).unwrap(), r));
        assert!(!DateRange::Today.contains(Utc.with_ymd_and_hms(2026, 2, 28, 23, 0, 0).unwrap(), r));
        assert!(DateRange::Month.contains(Utc.with_ymd_and_hms(2026, 3, 31, 0, 0, 0).unwrap(), r));
        assert!(!DateRange::Month.contains(Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap(), r));
    }

    #[test]
    fn status_selection_expands_to_column() {
        let sel: BTreeSet<_> = [CanonicalStatus::Production].into();
        let brand: BTreeSet<_> = [
            CanonicalStatus::Accepted,
            CanonicalStatus::Waiting,
            CanonicalStatus::Production,
        ]
        .into();
        assert_eq!(expand_statuses(&sel, Role::Brand), brand);
        assert_eq!(expand_statuses(&sel, Role::Supplier), sel);
    }

    #[test]
    fn sort_spec_parses_chains() {
        let spec: SortSpec = "value:desc, created:asc".parse().unwrap();
        assert_eq!(
            spec,
            SortSpec::by(SortKey::TotalValue, SortDirection::Desc)
                .then(SortKey::CreatedAt, SortDirection::Asc)
        );
        assert!("".parse::<SortSpec>().is_err());
        assert!("value:sideways".parse::<SortSpec>().is_err());
    }

    #[test]
    fn display_ids_compare_numerically() {
        assert_eq!(compare_display_ids("#99", "#100"), Ordering::Less);
        assert_eq!(compare_display_ids("#100", "#100"), Ordering::Equal);
        assert_eq!(compare_display_ids("A-1", "B-1"), Ordering::Less);
    }

    #[test]
    fn mixed_display_ids_have_no_cycle() {
        assert_eq!(compare_display_ids("#9", "#10"), Ordering::Less);
        assert_eq!(compare_display_ids("#10", "#1a"), Ordering::Less);
        assert_eq!(compare_display_ids("#9", "#1a"), Ordering::Less);
        assert_eq!(compare_display_ids("#1a", "#9"), Ordering::Greater);
    }

    #[test]
    fn mixed_display_id_sort_ignores_input_order() {
        let ids = ["#1a", "#10", "A-7", "#9", "#010", "#2b", "#100"];
        let expected = vec!["#9", "#010", "#10", "#100", "#1a", "#2b", "A-7"];
        let sorted = |input: &[&'static str]| {
            let mut v = input.to_vec();
            v.sort_by(|a, b| compare_display_ids(a, b));
            v
        };
        assert_eq!(sorted(&ids[..]), expected);
        let mut reversed = ids;
        reversed.reverse();
        assert_eq!(sorted(&reversed[..]), expected);
        let mut rotated = ids;
        rotated.rotate_left(3);
        assert_eq!(sorted(&rotated[..]), expected);
    }
}
