//! Transition Validator
//!
//! # Design
//!
//! Decides whether `(status, action, role)` is legal and what it produces.
//! The legal moves are a lookup keyed by `(status, action)`, see [`rule`];
//! each rule names the next status and the roles allowed to take it.
//!
//! ```text
//!   NEW ──ACCEPT──────► ACCEPTED          (supplier)
//!   NEW ──NEGOTIATE───► NEGOTIATING       (supplier)
//!   NEW ──REJECT──────► REJECTED          (supplier)
//!   NEGOTIATING ─ACCEPT─► ACCEPTED        (brand)
//!   NEGOTIATING ─REJECT─► REJECTED        (brand, supplier)
//!   WAITING ──CONFIRM_RECEIPT──► PRODUCTION + milestone   (supplier)
//!   PRODUCTION ──ADVANCE──► READY_SEND    (supplier)
//!   READY_SEND ──ADVANCE──► FINALIZED     (supplier)
//! ```
//!
//! Checks run in a fixed order: terminal status, then `(status, action)`
//! legality, then role permission.
//!
//! `CONFIRM_RECEIPT` is idempotent: once the receipt milestone is complete it
//! returns a no-op decision (same status, no side effects).
//!
//! No IO. The caller decides how and when side effects are persisted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tex_status::{CanonicalStatus, Role};

use crate::timeline::{is_complete, Milestone};
use crate::Order;

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Accept,
    Negotiate,
    Reject,
    Advance,
    ConfirmReceipt,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::Accept,
        Action::Negotiate,
        Action::Reject,
        Action::Advance,
        Action::ConfirmReceipt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Accept => "ACCEPT",
            Action::Negotiate => "NEGOTIATE",
            Action::Reject => "REJECT",
            Action::Advance => "ADVANCE",
            Action::ConfirmReceipt => "CONFIRM_RECEIPT",
        }
    }

    /// Button label.
    pub fn label(&self) -> &'static str {
        match self {
            Action::Accept => "Aceitar",
            Action::Negotiate => "Negociar",
            Action::Reject => "Recusar",
            Action::Advance => "Avançar Etapa",
            Action::ConfirmReceipt => "Confirmar Recebimento",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase().replace('-', "_");
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == wanted)
            .ok_or_else(|| {
                format!(
                    "invalid action '{}'. expected one of: ACCEPT | NEGOTIATE | REJECT | ADVANCE | CONFIRM_RECEIPT",
                    s.trim()
                )
            })
    }
}

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    InvalidActionForStatus,
    InvalidActionForRole,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::InvalidActionForStatus => "INVALID_ACTION_FOR_STATUS",
            RejectReason::InvalidActionForRole => "INVALID_ACTION_FOR_ROLE",
        }
    }
}

/// Returned when an action cannot legally be applied. The order is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionError {
    pub from: CanonicalStatus,
    pub action: Action,
    pub role: Role,
    pub reason: RejectReason,
}

impl TransitionError {
    /// User-facing message for the reason code.
    pub fn message(&self) -> String {
        match self.reason {
            RejectReason::InvalidActionForStatus => format!(
                "A ação \"{}\" não está disponível para pedidos com status \"{}\".",
                self.action.label(),
                self.from.label()
            ),
            RejectReason::InvalidActionForRole => format!(
                "A ação \"{}\" não pode ser realizada pelo seu perfil.",
                self.action.label()
            ),
        }
    }
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} + {} as {}",
            self.reason.as_str(),
            self.from,
            self.action,
            self.role
        )
    }
}

impl std::error::Error for TransitionError {}

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SideEffect {
    /// Record the milestone locally (idempotent).
    MarkMilestone(Milestone),
    /// Ask the order service to record the new status.
    PersistStatus(CanonicalStatus),
}

/// Outcome of a legal action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionDecision {
    pub from: CanonicalStatus,
    pub to: CanonicalStatus,
    pub action: Action,
    pub effects: Vec<SideEffect>,
}

impl TransitionDecision {
    /// `true` for an idempotent replay that changes nothing.
    pub fn is_noop(&self) -> bool {
        self.from == self.to && self.effects.is_empty()
    }

    /// The status to persist, if any.
    pub fn persisted_status(&self) -> Option<CanonicalStatus> {
        self.effects.iter().find_map(|e| match e {
            SideEffect::PersistStatus(s) => Some(*s),
            _ => None,
        })
    }
}

// ---------------------------------------------------------------------------
// Rule table
// ---------------------------------------------------------------------------

const SUPPLIER_ONLY: &[Role] = &[Role::Supplier];
const BRAND_ONLY: &[Role] = &[Role::Brand];
const BOTH: &[Role] = &[Role::Brand, Role::Supplier];

/// One legal `(status, action)` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    pub next: CanonicalStatus,
    pub roles: &'static [Role],
    /// Milestone the action records regardless of status derivation.
    pub marks: Option<Milestone>,
}

const fn to(next: CanonicalStatus, roles: &'static [Role]) -> TransitionRule {
    TransitionRule {
        next,
        roles,
        marks: None,
    }
}

/// The legal move for `(status, action)`, or `None`.
pub fn rule(status: CanonicalStatus, action: Action) -> Option<TransitionRule> {
    use Action::*;
    use CanonicalStatus::*;

    match (status, action) {
        (New, Accept) => Some(to(Accepted, SUPPLIER_ONLY)),
        (New, Negotiate) => Some(to(Negotiating, SUPPLIER_ONLY)),
        (New, Reject) => Some(to(Rejected, SUPPLIER_ONLY)),

        // Brand answers the counter-proposal.
        (Negotiating, Accept) => Some(to(Accepted, BRAND_ONLY)),
        (Negotiating, Reject) => Some(to(Rejected, BOTH)),

        (Waiting, ConfirmReceipt) => Some(TransitionRule {
            next: Production,
            roles: SUPPLIER_ONLY,
            marks: Some(Milestone::MaterialsReceived),
        }),

        // ADVANCE has exactly two branches.
        (Production, Advance) => Some(to(ReadySend, SUPPLIER_ONLY)),
        (ReadySend, Advance) => Some(to(Finalized, SUPPLIER_ONLY)),

        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Everything the validator looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionContext {
    pub status: CanonicalStatus,
    pub role: Role,
    /// Whether the receipt milestone is already complete.
    pub receipt_confirmed: bool,
}

impl TransitionContext {
    pub fn new(status: CanonicalStatus, role: Role) -> Self {
        Self {
            status,
            role,
            receipt_confirmed: false,
        }
    }

    pub fn for_order(order: &Order, role: Role) -> Self {
        Self {
            status: order.status(),
            role,
            receipt_confirmed: is_complete(order.timeline(), Milestone::MaterialsReceived),
        }
    }
}

/// Decide `action` in `ctx`.
///
/// # Errors
/// [`TransitionError`] with `InvalidActionForStatus` or
/// `InvalidActionForRole`. The caller's state must not change.
pub fn validate(
    ctx: &TransitionContext,
    action: Action,
) -> Result<TransitionDecision, TransitionError> {
    let reject = |reason| TransitionError {
        from: ctx.status,
        action,
        role: ctx.role,
        reason,
    };

    if ctx.status.is_terminal() {
        return Err(reject(RejectReason::InvalidActionForStatus));
    }

    // Replayed receipt confirmation: legal, changes nothing. An order still
    // in WAITING with the receipt already stored is promoted below.
    if action == Action::ConfirmReceipt
        && ctx.receipt_confirmed
        && ctx.status != CanonicalStatus::Waiting
    {
        if !SUPPLIER_ONLY.contains(&ctx.role) {
            return Err(reject(RejectReason::InvalidActionForRole));
        }
        return Ok(TransitionDecision {
            from: ctx.status,
            to: ctx.status,
            action,
            effects: Vec::new(),
        });
    }

    let Some(r) = rule(ctx.status, action) else {
        return Err(reject(RejectReason::InvalidActionForStatus));
    };
    if !r.roles.contains(&ctx.role) {
        return Err(reject(RejectReason::InvalidActionForRole));
    }

    let mut effects = Vec::new();
    // A receipt already on the stored timeline keeps its original stamp.
    let marks = r
        .marks
        .filter(|m| !(*m == Milestone::MaterialsReceived && ctx.receipt_confirmed));
    if let Some(m) = marks {
        effects.push(SideEffect::MarkMilestone(m));
    }
    if r.next != ctx.status {
        effects.push(SideEffect::PersistStatus(r.next));
    }

    Ok(TransitionDecision {
        from: ctx.status,
        to: r.next,
        action,
        effects,
    })
}

/// Actions that would currently validate, for rendering buttons.
pub fn available_actions(ctx: &TransitionContext) -> Vec<Action> {
    Action::ALL
        .into_iter()
        .filter(|a| validate(ctx, *a).map(|d| !d.is_noop()).unwrap_or(false))
        .collect()
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
