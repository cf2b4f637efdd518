//! Domain models for Homigo.

pub mod booking;
pub mod listing;
pub mod user;

pub use booking::{Booking, BookingStatus};
pub use listing::{Listing, ListingStatus, ListingSummary};
pub use user::{User, UserRole, UserSummary};
