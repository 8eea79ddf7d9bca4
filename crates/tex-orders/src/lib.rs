//! tex-orders
//!
//! The order model and its lifecycle rules:
//! - `Order`: a garment order whose status changes only through validated
//!   transitions.
//! - `transition`: the validator, a `(status, action)` rule table checked
//!   against the acting role.
//! - `timeline`: milestone progress derived from status and merged with
//!   stored events.
//!
//! Pure deterministic logic. Timestamps are always passed in by the caller.

pub mod money;
pub mod timeline;
pub mod transition;

mod types;

pub use money::format_brl;
pub use timeline::{
    current_milestone, derive_timeline, is_complete, mark_milestone, Milestone, TimelineEvent,
};
pub use transition::{
    available_actions, rule, validate, Action, RejectReason, SideEffect, TransitionContext,
    TransitionDecision, TransitionError, TransitionRule,
};
pub use types::{Counterpart, NewOrder, Order, Product};
