//! tex-status
//!
//! Order status vocabularies and the per-role mapping between them.
//!
//! - `CanonicalStatus`: the internal vocabulary every business rule uses.
//! - `ExternalStatus`: the remote order service's vocabulary.
//! - `Role`: selects which mapping table (and, downstream, which column set)
//!   applies.
//!
//! Pure logic. No IO. Unknown wire values never fail; they degrade to `New`
//! with a `tracing` warning.

mod mapping;
mod types;

pub use mapping::{
    is_writable, profile, reachable_statuses, to_canonical, to_canonical_wire, to_external,
    to_external_for_write, MappingError, RoleProfile,
};
pub use types::{CanonicalStatus, ExternalStatus, PaymentStatus, Role, UnknownRole};

/// Canonical statuses that can be the target of a transition request.
pub fn writable_statuses(role: Role) -> Vec<CanonicalStatus> {
    profile(role).writes.iter().map(|(c, _)| *c).collect()
}
