//! Booking date rules and pricing.
//!
//! The date logic here backs the Booking Lifecycle Manager: stay-range
//! validation at creation time, the half-open overlap test used for
//! conflict detection, and server-side price computation.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors for a rejected booking request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BookingDateError {
    #[error("Check-out date must be after check-in date")]
    EmptyStay,

    #[error("Check-in date cannot be in the past")]
    PastCheckIn,

    #[error("Booking date cannot be after check-in date")]
    BookingAfterCheckIn,
}

/// A requested stay, validated before it reaches the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stay {
    pub booking_date: NaiveDate,
    pub check_in: NaiveDate,
    /// Exclusive checkout day.
    pub check_out: NaiveDate,
}

impl Stay {
    /// Validates a requested stay against `today` (the server's calendar
    /// day at creation time).
    ///
    /// Rules, in rejection order:
    /// - check-in must be strictly before check-out
    /// - check-in must not be before today
    /// - booking date must not be after check-in
    pub fn new(
        booking_date: NaiveDate,
        check_in: NaiveDate,
        check_out: NaiveDate,
        today: NaiveDate,
    ) -> Result<Self, BookingDateError> {
        if check_in >= check_out {
            return Err(BookingDateError::EmptyStay);
        }
        if check_in < today {
            return Err(BookingDateError::PastCheckIn);
        }
        if booking_date > check_in {
            return Err(BookingDateError::BookingAfterCheckIn);
        }
        Ok(Self {
            booking_date,
            check_in,
            check_out,
        })
    }

    /// Number of nights in the stay. Always >= 1 for a validated stay.
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    /// Total price for the stay at the given nightly rate.
    pub fn total_price(&self, nightly_price: f64) -> f64 {
        self.nights() as f64 * nightly_price
    }

    /// Whether this stay overlaps another `[check_in, check_out)` range.
    pub fn overlaps(&self, other_check_in: NaiveDate, other_check_out: NaiveDate) -> bool {
        ranges_overlap(self.check_in, self.check_out, other_check_in, other_check_out)
    }
}

/// Half-open interval intersection test for two `[start, end)` date ranges.
///
/// A checkout on day X does not conflict with a check-in on day X.
pub fn ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start < b_end && b_start < a_end
}
