//! Authorization policy functions.
//!
//! Every state-changing route re-derives permission from id comparison
//! against ownership freshly loaded from the store. The rules live here as
//! explicit allow/deny functions so the rule set is testable on its own,
//! instead of inline conditionals scattered through handlers.

use crate::models::BookingStatus;

/// Outcome of a policy check: allowed, or denied with a caller-facing reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(&'static str),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// The denial reason, if any.
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            Decision::Allow => None,
            Decision::Deny(reason) => Some(reason),
        }
    }
}

/// The caller's relation to a booking, derived from fresh id lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingRelation {
    Guest,
    Host,
    Unrelated,
}

impl BookingRelation {
    /// Classifies `caller_id` against the booking's guest and the listing's
    /// host. The host wins if a host ever books their own listing through
    /// some out-of-band path.
    pub fn of(caller_id: i64, guest_id: i64, host_id: i64) -> Self {
        if caller_id == host_id {
            BookingRelation::Host
        } else if caller_id == guest_id {
            BookingRelation::Guest
        } else {
            BookingRelation::Unrelated
        }
    }
}

/// Only the owning host may update or delete a listing.
pub fn can_mutate_listing(caller_id: i64, listing_host_id: i64) -> Decision {
    if caller_id == listing_host_id {
        Decision::Allow
    } else {
        Decision::Deny("You can only modify your own listings")
    }
}

/// A host may not reserve their own listing.
pub fn can_book_listing(caller_id: i64, listing_host_id: i64) -> Decision {
    if caller_id == listing_host_id {
        Decision::Deny("You cannot book your own listing")
    } else {
        Decision::Allow
    }
}

/// Booking status transition rules:
/// - the listing's host may set any status;
/// - the booking's guest may only cancel;
/// - anyone else is denied.
///
/// No further state-machine restriction applies: an authorized party can
/// re-target even a cancelled or completed booking.
pub fn can_transition_booking(relation: BookingRelation, target: BookingStatus) -> Decision {
    match relation {
        BookingRelation::Host => Decision::Allow,
        BookingRelation::Guest => {
            if target == BookingStatus::Cancelled {
                Decision::Allow
            } else {
                Decision::Deny("Guests can only cancel bookings")
            }
        }
        BookingRelation::Unrelated => {
            Decision::Deny("You do not have permission to update this booking")
        }
    }
}

/// A user may only view their own booking history.
pub fn can_view_user_bookings(caller_id: i64, owner_id: i64) -> Decision {
    if caller_id == owner_id {
        Decision::Allow
    } else {
        Decision::Deny("You can only view your own bookings")
    }
}

/// Only the listing's host may view the bookings made against it.
pub fn can_view_listing_bookings(caller_id: i64, listing_host_id: i64) -> Decision {
    if caller_id == listing_host_id {
        Decision::Allow
    } else {
        Decision::Deny("You can only view bookings for your own listings")
    }
}

/// Users may only edit their own profile.
pub fn can_update_profile(caller_id: i64, profile_owner_id: i64) -> Decision {
    if caller_id == profile_owner_id {
        Decision::Allow
    } else {
        Decision::Deny("You can only update your own profile")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_classification() {
        assert_eq!(BookingRelation::of(1, 1, 2), BookingRelation::Guest);
        assert_eq!(BookingRelation::of(2, 1, 2), BookingRelation::Host);
        assert_eq!(BookingRelation::of(3, 1, 2), BookingRelation::Unrelated);
    }

    #[test]
    fn test_relation_host_wins_over_guest() {
        assert_eq!(BookingRelation::of(5, 5, 5), BookingRelation::Host);
    }

    #[test]
    fn test_listing_mutation_owner_only() {
        assert!(can_mutate_listing(7, 7).is_allowed());
        let decision = can_mutate_listing(8, 7);
        assert!(!decision.is_allowed());
        assert_eq!(decision.reason(), Some("You can only modify your own listings"));
    }

    #[test]
    fn test_self_booking_denied() {
        assert!(!can_book_listing(7, 7).is_allowed());
        assert!(can_book_listing(8, 7).is_allowed());
    }

    #[test]
    fn test_host_may_set_any_status() {
        for target in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Cancelled,
            BookingStatus::Completed,
        ] {
            assert!(
                can_transition_booking(BookingRelation::Host, target).is_allowed(),
                "host should be allowed to set {}",
                target
            );
        }
    }

    #[test]
    fn test_guest_may_only_cancel() {
        assert!(
            can_transition_booking(BookingRelation::Guest, BookingStatus::Cancelled).is_allowed()
        );

        for target in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Completed,
        ] {
            let decision = can_transition_booking(BookingRelation::Guest, target);
            assert!(!decision.is_allowed(), "guest must not set {}", target);
            assert_eq!(decision.reason(), Some("Guests can only cancel bookings"));
        }
    }

    #[test]
    fn test_unrelated_caller_denied_all_transitions() {
        for target in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Cancelled,
            BookingStatus::Completed,
        ] {
            assert!(!can_transition_booking(BookingRelation::Unrelated, target).is_allowed());
        }
    }

    #[test]
    fn test_booking_views_are_owner_scoped() {
        assert!(can_view_user_bookings(3, 3).is_allowed());
        assert!(!can_view_user_bookings(3, 4).is_allowed());

        assert!(can_view_listing_bookings(9, 9).is_allowed());
        assert!(!can_view_listing_bookings(9, 10).is_allowed());
    }

    #[test]
    fn test_profile_updates_are_self_only() {
        assert!(can_update_profile(1, 1).is_allowed());
        assert!(!can_update_profile(1, 2).is_allowed());
    }
}
