//! Scenario: writable statuses survive a round trip through the service
//!
//! # Invariant under test
//! For every role and every writable status `s`:
//! `to_canonical(to_external_for_write(s, role), role) == s`.
//!
//! Collapsed read-only statuses are refused by the write path instead of
//! silently picking one of their external values.

use tex_status::{
    is_writable, reachable_statuses, to_canonical, to_external, to_external_for_write,
    writable_statuses, CanonicalStatus, Role,
};

#[test]
fn writable_statuses_round_trip_for_every_role() {
    for role in Role::ALL {
        let writable = writable_statuses(role);
        assert!(!writable.is_empty());

        for s in writable {
            let ext = to_external_for_write(s, role).expect("writable status must map");
            assert_eq!(
                to_canonical(ext, role),
                s,
                "{role}: {s} -> {ext} must read back as {s}"
            );
            // The total projection agrees with the write path.
            assert_eq!(to_external(s, role), ext);
        }
    }
}

#[test]
fn transition_targets_are_writable() {
    use CanonicalStatus::*;
    for role in Role::ALL {
        for s in [Negotiating, Accepted, Production, ReadySend, Finalized, Rejected] {
            assert!(is_writable(s, role), "{role}: {s} must be writable");
        }
        for s in [New, Waiting, Cancelled] {
            assert!(!is_writable(s, role), "{role}: {s} must be read-only");
        }
    }
}

#[test]
fn finalized_is_written_per_role() {
    assert_eq!(
        to_external_for_write(CanonicalStatus::Finalized, Role::Brand)
            .unwrap()
            .as_wire(),
        "delivered"
    );
    assert_eq!(
        to_external_for_write(CanonicalStatus::Finalized, Role::Supplier)
            .unwrap()
            .as_wire(),
        "shipped"
    );
}

#[test]
fn writable_statuses_are_reachable() {
    for role in Role::ALL {
        let reachable = reachable_statuses(role);
        for s in writable_statuses(role) {
            assert!(reachable.contains(&s));
        }
    }
}
