//! Timeline Deriver
//!
//! # Design
//!
//! An order's progress is a fixed, ordered list of happy-path milestones.
//! Milestone `M` is complete iff
//!
//! 1. the current status is in `M.reachable_from()` (a monotone set: every
//!    later happy-path status is also in it), **or**
//! 2. stored event data already marks `M` complete.
//!
//! Rule 2 is what keeps completion monotonic when an order later lands in a
//! terminal failure state: a cancelled order keeps the milestones it had
//! reached. Stored completion timestamps are carried verbatim; they are never
//! invented from the status.
//!
//! ```text
//!  Created ─► Accepted ─► MaterialsReceived ─► Production ─► ReadySend ─► Finalized
//! ```
//!
//! Rejection and cancellation are not milestones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tex_schemas::RemoteTimelineEvent;
use tex_status::CanonicalStatus;
use tracing::debug;

use CanonicalStatus::*;

// ---------------------------------------------------------------------------
// Milestone
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    Created,
    Accepted,
    /// Receipt of materials at the workshop. Set by `CONFIRM_RECEIPT`.
    MaterialsReceived,
    Production,
    ReadySend,
    Finalized,
}

impl Milestone {
    pub const ALL: [Milestone; 6] = [
        Milestone::Created,
        Milestone::Accepted,
        Milestone::MaterialsReceived,
        Milestone::Production,
        Milestone::ReadySend,
        Milestone::Finalized,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Milestone::Created => "Pedido Criado",
            Milestone::Accepted => "Pedido Aceito",
            Milestone::MaterialsReceived => "Recebimento na Oficina",
            Milestone::Production => "Em Produção",
            Milestone::ReadySend => "Pronto para Envio",
            Milestone::Finalized => "Finalizado",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Milestone::Created => "file-plus",
            Milestone::Accepted => "handshake",
            Milestone::MaterialsReceived => "package-check",
            Milestone::Production => "scissors",
            Milestone::ReadySend => "truck",
            Milestone::Finalized => "check-circle",
        }
    }

    /// Storage key used by the order service.
    pub fn key(&self) -> &'static str {
        match self {
            Milestone::Created => "created",
            Milestone::Accepted => "accepted",
            Milestone::MaterialsReceived => "materials_received",
            Milestone::Production => "production",
            Milestone::ReadySend => "ready_send",
            Milestone::Finalized => "finalized",
        }
    }

    /// Accepts the storage key or the display label.
    pub fn from_step(step: &str) -> Option<Self> {
        let step = step.trim();
        Milestone::ALL
            .into_iter()
            .find(|m| m.key().eq_ignore_ascii_case(step) || m.label() == step)
    }

    /// Statuses at which this milestone counts as reached.
    pub fn reachable_from(&self) -> &'static [CanonicalStatus] {
        match self {
            Milestone::Created => &[
                New,
                Negotiating,
                Accepted,
                Waiting,
                Production,
                ReadySend,
                Finalized,
                Rejected,
                Cancelled,
            ],
            Milestone::Accepted => &[Accepted, Waiting, Production, ReadySend, Finalized],
            Milestone::MaterialsReceived => &[Production, ReadySend, Finalized],
            Milestone::Production => &[Production, ReadySend, Finalized],
            Milestone::ReadySend => &[ReadySend, Finalized],
            Milestone::Finalized => &[Finalized],
        }
    }
}

// ---------------------------------------------------------------------------
// TimelineEvent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub milestone: Milestone,
    /// Display name of the step.
    pub step: String,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub icon: Option<String>,
}

impl TimelineEvent {
    fn pending(milestone: Milestone) -> Self {
        Self {
            milestone,
            step: milestone.label().to_string(),
            completed: false,
            completed_at: None,
            icon: Some(milestone.icon().to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// Full timeline for `status`, merged with previously stored events.
///
/// Always returns one event per milestone, in milestone order.
pub fn derive_timeline(status: CanonicalStatus, stored: &[TimelineEvent]) -> Vec<TimelineEvent> {
    Milestone::ALL
        .into_iter()
        .map(|m| {
            let prior = stored.iter().find(|e| e.milestone == m && e.completed);
            let mut ev = TimelineEvent::pending(m);
            ev.completed = prior.is_some() || m.reachable_from().contains(&status);
            if let Some(prior) = prior {
                ev.completed_at = prior.completed_at;
                if prior.icon.is_some() {
                    ev.icon = prior.icon.clone();
                }
            }
            ev
        })
        .collect()
}

/// Mark `milestone` complete at `at`. Returns `false` (and changes nothing)
/// if it was already complete.
pub fn mark_milestone(
    timeline: &mut Vec<TimelineEvent>,
    milestone: Milestone,
    at: DateTime<Utc>,
) -> bool {
    match timeline.iter_mut().find(|e| e.milestone == milestone) {
        Some(ev) if ev.completed => false,
        Some(ev) => {
            ev.completed = true;
            ev.completed_at = Some(at);
            true
        }
        None => {
            let mut ev = TimelineEvent::pending(milestone);
            ev.completed = true;
            ev.completed_at = Some(at);
            timeline.push(ev);
            timeline.sort_by_key(|e| e.milestone);
            true
        }
    }
}

pub fn is_complete(timeline: &[TimelineEvent], milestone: Milestone) -> bool {
    timeline
        .iter()
        .any(|e| e.milestone == milestone && e.completed)
}

/// Furthest milestone reached, if any.
pub fn current_milestone(timeline: &[TimelineEvent]) -> Option<Milestone> {
    timeline
        .iter()
        .filter(|e| e.completed)
        .map(|e| e.milestone)
        .max()
}

/// Decode stored events. Unknown step names are skipped.
pub fn timeline_from_remote(events: &[RemoteTimelineEvent]) -> Vec<TimelineEvent> {
    let mut out: Vec<TimelineEvent> = Vec::new();
    for raw in events {
        let Some(milestone) = Milestone::from_step(&raw.step) else {
            debug!(step = %raw.step, "skipping unknown timeline step");
            continue;
        };
        if out.iter().any(|e| e.milestone == milestone) {
            continue;
        }
        out.push(TimelineEvent {
            milestone,
            step: milestone.label().to_string(),
            completed: raw.completed,
            completed_at: raw.completed_at,
            icon: raw.icon.clone(),
        });
    }
    out
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
