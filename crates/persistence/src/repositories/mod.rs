//! Repository implementations for database operations.

pub mod booking;
pub mod listing;
pub mod user;

pub use booking::{
    BookingDetailsRow, BookingPartiesRow, BookingRepository, GuestBookingRow, ListingBookingRow,
    NewBooking, ReserveError,
};
pub use listing::{
    ListingFilter, ListingRepository, ListingSort, ListingWithHostRow, NewListing, SortOrder,
    UpdateListing,
};
pub use user::{NewUser, UpdateUserProfile, UserRepository};
