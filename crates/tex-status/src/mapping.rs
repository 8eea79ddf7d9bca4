//! Per-role translation between the canonical and external vocabularies.
//!
//! # Design
//!
//! Both roles share one state machine; what differs is how each role reads
//! the service's vocabulary. That difference lives in a single table per role
//! ([`RoleProfile`]), looked up by [`profile`]:
//!
//! - `inbound`: every external status → canonical. Several external values
//!   collapse onto one canonical value (the three `supplies_*` states are all
//!   `Waiting`).
//! - `writes`: the exact external value to send for each **writable**
//!   canonical status (a status that can be the target of a transition).
//! - `read_only`: representatives for the remaining canonical statuses, so
//!   [`to_external`] stays total. These are never sent to the service.
//!
//! ```text
//!   external ──inbound──► canonical ──writes──► external   (exact)
//!                               └────read_only──► external (representative)
//! ```

use std::collections::BTreeSet;
use std::fmt;

use tracing::warn;

use crate::{CanonicalStatus, ExternalStatus, Role};

use crate::CanonicalStatus as C;
use crate::ExternalStatus as E;

// ---------------------------------------------------------------------------
// RoleProfile
// ---------------------------------------------------------------------------

/// Mapping configuration for one role.
#[derive(Debug)]
pub struct RoleProfile {
    pub role: Role,
    pub inbound: &'static [(ExternalStatus, CanonicalStatus)],
    pub writes: &'static [(CanonicalStatus, ExternalStatus)],
    pub read_only: &'static [(CanonicalStatus, ExternalStatus)],
}

static BRAND: RoleProfile = RoleProfile {
    role: Role::Brand,
    inbound: &[
        (E::Pending, C::New),
        (E::CounterOffer, C::Negotiating),
        (E::Approved, C::Accepted),
        (E::SuppliesPreparing, C::Waiting),
        (E::SuppliesInTransit, C::Waiting),
        (E::SuppliesReceived, C::Waiting),
        (E::InProduction, C::Production),
        (E::ReadyToShip, C::ReadySend),
        // Shipped but not yet delivered: the brand is still waiting on it.
        (E::Shipped, C::ReadySend),
        (E::Delivered, C::Finalized),
        (E::Declined, C::Rejected),
        (E::Cancelled, C::Cancelled),
    ],
    writes: &[
        (C::Negotiating, E::CounterOffer),
        (C::Accepted, E::Approved),
        (C::Production, E::InProduction),
        (C::ReadySend, E::ReadyToShip),
        (C::Finalized, E::Delivered),
        (C::Rejected, E::Declined),
    ],
    read_only: &[
        (C::New, E::Pending),
        (C::Waiting, E::SuppliesPreparing),
        (C::Cancelled, E::Cancelled),
    ],
};

static SUPPLIER: RoleProfile = RoleProfile {
    role: Role::Supplier,
    inbound: &[
        (E::Pending, C::New),
        (E::CounterOffer, C::Negotiating),
        (E::Approved, C::Accepted),
        (E::SuppliesPreparing, C::Waiting),
        (E::SuppliesInTransit, C::Waiting),
        (E::SuppliesReceived, C::Waiting),
        (E::InProduction, C::Production),
        (E::ReadyToShip, C::ReadySend),
        // The workshop's part ends when the goods leave.
        (E::Shipped, C::Finalized),
        (E::Delivered, C::Finalized),
        (E::Declined, C::Rejected),
        (E::Cancelled, C::Cancelled),
    ],
    writes: &[
        (C::Negotiating, E::CounterOffer),
        (C::Accepted, E::Approved),
        (C::Production, E::InProduction),
        (C::ReadySend, E::ReadyToShip),
        (C::Finalized, E::Shipped),
        (C::Rejected, E::Declined),
    ],
    read_only: &[
        (C::New, E::Pending),
        (C::Waiting, E::SuppliesPreparing),
        (C::Cancelled, E::Cancelled),
    ],
};

/// The mapping table for `role`.
pub fn profile(role: Role) -> &'static RoleProfile {
    match role {
        Role::Brand => &BRAND,
        Role::Supplier => &SUPPLIER,
    }
}

// ---------------------------------------------------------------------------
// MappingError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// The status is a read-only projection; sending it would be ambiguous
    /// (collapsed) or meaningless (not a transition target).
    NotWritable { status: CanonicalStatus, role: Role },
}

impl fmt::Display for MappingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingError::NotWritable { status, role } => write!(
                f,
                "MAPPING_NOT_WRITABLE: {status} cannot be sent to the order service as {role}"
            ),
        }
    }
}

impl std::error::Error for MappingError {}

// ---------------------------------------------------------------------------
// Translation
// ---------------------------------------------------------------------------

/// Canonical status the role reads for `external`.
pub fn to_canonical(external: ExternalStatus, role: Role) -> CanonicalStatus {
    let table = profile(role).inbound;
    match table.iter().find(|(e, _)| *e == external) {
        Some((_, c)) => *c,
        None => {
            // Unreachable while the tables cover ExternalStatus::ALL (tested).
            warn!(%external, %role, "external status missing from role table; treating as NEW");
            CanonicalStatus::New
        }
    }
}

/// Lenient decode of a raw wire string.
///
/// An unrecognized value degrades to `New` with a warning. The service's
/// vocabulary evolves on its own schedule, so this never fails.
pub fn to_canonical_wire(raw: &str, role: Role) -> CanonicalStatus {
    match ExternalStatus::from_wire(raw) {
        Some(external) => to_canonical(external, role),
        None => {
            warn!(raw_status = raw, %role, "unrecognized external status; treating as NEW");
            CanonicalStatus::New
        }
    }
}

/// Total projection back to the external vocabulary.
///
/// Exact for writable statuses; for read-only statuses returns the documented
/// representative. Use [`to_external_for_write`] when building a request.
pub fn to_external(canonical: CanonicalStatus, role: Role) -> ExternalStatus {
    let p = profile(role);
    p.writes
        .iter()
        .chain(p.read_only.iter())
        .find(|(c, _)| *c == canonical)
        .map(|(_, e)| *e)
        .unwrap_or(ExternalStatus::Pending)
}

/// Exact external value to send when `canonical` is the target of a
/// transition request.
pub fn to_external_for_write(
    canonical: CanonicalStatus,
    role: Role,
) -> Result<ExternalStatus, MappingError> {
    profile(role)
        .writes
        .iter()
        .find(|(c, _)| *c == canonical)
        .map(|(_, e)| *e)
        .ok_or(MappingError::NotWritable {
            status: canonical,
            role,
        })
}

/// `true` if `canonical` can be sent to the service as `role`.
pub fn is_writable(canonical: CanonicalStatus, role: Role) -> bool {
    to_external_for_write(canonical, role).is_ok()
}

/// Every canonical status `role` can observe: the image of its inbound table.
pub fn reachable_statuses(role: Role) -> BTreeSet<CanonicalStatus> {
    profile(role).inbound.iter().map(|(_, c)| *c).collect()
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
