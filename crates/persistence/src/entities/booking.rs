//! Booking entity (database row mapping).

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use std::str::FromStr;

/// Database row mapping for the bookings table.
#[derive(Debug, Clone, FromRow)]
pub struct BookingEntity {
    pub id: i64,
    pub listing_id: i64,
    pub guest_id: i64,
    pub booking_date: NaiveDate,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub total_price: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BookingEntity> for domain::models::Booking {
    fn from(entity: BookingEntity) -> Self {
        Self {
            id: entity.id,
            listing_id: entity.listing_id,
            guest_id: entity.guest_id,
            booking_date: entity.booking_date,
            check_in_date: entity.check_in_date,
            check_out_date: entity.check_out_date,
            total_price: entity.total_price,
            status: domain::models::BookingStatus::from_str(&entity.status)
                .unwrap_or(domain::models::BookingStatus::Pending),
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
