//! Booking repository for database operations.
//!
//! Reservation is the one write path that must be race-free: the conflict
//! check and the insert run inside a single transaction holding a
//! per-listing advisory lock, so concurrent requests for the same listing
//! serialize. The exclusion constraint on the table remains as a backstop
//! and surfaces as [`ReserveError::DatesUnavailable`].

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use thiserror::Error;

use crate::entities::BookingEntity;
use crate::metrics::QueryTimer;
use shared::pagination::PageSelection;

/// Postgres error codes remapped to a user-facing conflict.
const UNIQUE_VIOLATION: &str = "23505";
const EXCLUSION_VIOLATION: &str = "23P01";

/// Error type for reservation attempts.
#[derive(Debug, Error)]
pub enum ReserveError {
    /// The requested range overlaps an existing pending/confirmed booking.
    #[error("These dates are already booked or pending confirmation")]
    DatesUnavailable,

    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Fields for a new reservation. `total_price` is computed by the caller
/// from the listing's stored nightly price, never from client input.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub listing_id: i64,
    pub guest_id: i64,
    pub booking_date: NaiveDate,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub total_price: f64,
    pub status: String,
}

/// Booking joined with listing, guest, and host identity.
#[derive(Debug, Clone, FromRow)]
pub struct BookingDetailsRow {
    pub id: i64,
    pub booking_date: NaiveDate,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub total_price: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub listing_id: i64,
    pub listing_title: String,
    pub listing_location: String,
    pub listing_price: f64,
    pub listing_images: sqlx::types::Json<Vec<String>>,
    pub guest_id: i64,
    pub guest_name: String,
    pub guest_email: String,
    pub host_id: i64,
    pub host_name: String,
    pub host_email: String,
}

/// A guest's booking joined with the listing and its host.
#[derive(Debug, Clone, FromRow)]
pub struct GuestBookingRow {
    pub id: i64,
    pub booking_date: NaiveDate,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub total_price: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub listing_id: i64,
    pub listing_title: String,
    pub listing_location: String,
    pub listing_price: f64,
    pub listing_images: sqlx::types::Json<Vec<String>>,
    pub host_id: i64,
    pub host_name: String,
    pub host_email: String,
}

/// A listing's booking joined with the guest who made it.
#[derive(Debug, Clone, FromRow)]
pub struct ListingBookingRow {
    pub id: i64,
    pub booking_date: NaiveDate,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub total_price: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub guest_id: i64,
    pub guest_name: String,
    pub guest_email: String,
}

/// The two parties of a booking plus its current status, used by the
/// status-transition permission check.
#[derive(Debug, Clone, FromRow)]
pub struct BookingPartiesRow {
    pub guest_id: i64,
    pub host_id: i64,
    pub status: String,
}

/// Repository for booking-related database operations.
#[derive(Clone)]
pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    /// Creates a new BookingRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Atomically reserve a stay.
    ///
    /// Takes `pg_advisory_xact_lock` keyed by the listing id before the
    /// overlap check, so a concurrent reservation for the same listing
    /// waits until this transaction commits or rolls back. The overlap test
    /// is the half-open form: `check_in < $end AND check_out > $start`,
    /// restricted to pending/confirmed bookings.
    pub async fn reserve(&self, booking: &NewBooking) -> Result<BookingEntity, ReserveError> {
        let timer = QueryTimer::new("reserve_booking");

        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(booking.listing_id)
            .execute(&mut *tx)
            .await?;

        let conflict: Option<(i64,)> = sqlx::query_as(
            r#"
            SELECT id FROM bookings
            WHERE listing_id = $1
              AND status IN ('pending', 'confirmed')
              AND check_in_date < $3
              AND check_out_date > $2
            LIMIT 1
            "#,
        )
        .bind(booking.listing_id)
        .bind(booking.check_in_date)
        .bind(booking.check_out_date)
        .fetch_optional(&mut *tx)
        .await?;

        if conflict.is_some() {
            timer.record();
            return Err(ReserveError::DatesUnavailable);
        }

        let inserted = sqlx::query_as::<_, BookingEntity>(
            r#"
            INSERT INTO bookings
                (listing_id, guest_id, booking_date, check_in_date, check_out_date,
                 total_price, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, listing_id, guest_id, booking_date, check_in_date,
                      check_out_date, total_price, status, created_at, updated_at
            "#,
        )
        .bind(booking.listing_id)
        .bind(booking.guest_id)
        .bind(booking.booking_date)
        .bind(booking.check_in_date)
        .bind(booking.check_out_date)
        .bind(booking.total_price)
        .bind(&booking.status)
        .fetch_one(&mut *tx)
        .await
        .map_err(remap_conflict)?;

        tx.commit().await?;
        timer.record();
        Ok(inserted)
    }

    /// Full booking details joined with listing, guest, and host.
    pub async fn find_details(&self, id: i64) -> Result<Option<BookingDetailsRow>, sqlx::Error> {
        let timer = QueryTimer::new("find_booking_details");
        let result = sqlx::query_as::<_, BookingDetailsRow>(
            r#"
            SELECT b.id, b.booking_date, b.check_in_date, b.check_out_date,
                   b.total_price, b.status, b.created_at,
                   l.id AS listing_id, l.title AS listing_title,
                   l.location AS listing_location, l.price AS listing_price,
                   l.images AS listing_images,
                   u.id AS guest_id, u.name AS guest_name, u.email AS guest_email,
                   h.id AS host_id, h.name AS host_name, h.email AS host_email
            FROM bookings b
            JOIN listings l ON b.listing_id = l.id
            JOIN users u ON b.guest_id = u.id
            JOIN users h ON l.host_id = h.id
            WHERE b.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// The booking's guest, the listing's host, and the current status.
    /// Fresh lookup performed immediately before any status mutation.
    pub async fn parties(&self, id: i64) -> Result<Option<BookingPartiesRow>, sqlx::Error> {
        let timer = QueryTimer::new("booking_parties");
        let result = sqlx::query_as::<_, BookingPartiesRow>(
            r#"
            SELECT b.guest_id, l.host_id, b.status
            FROM bookings b
            JOIN listings l ON b.listing_id = l.id
            WHERE b.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// A guest's own bookings, newest first, with an optional status filter.
    pub async fn list_for_guest(
        &self,
        guest_id: i64,
        status: Option<&str>,
        page: PageSelection,
    ) -> Result<(Vec<GuestBookingRow>, i64), sqlx::Error> {
        let timer = QueryTimer::new("list_guest_bookings");

        let bookings = sqlx::query_as::<_, GuestBookingRow>(
            r#"
            SELECT b.id, b.booking_date, b.check_in_date, b.check_out_date,
                   b.total_price, b.status, b.created_at,
                   l.id AS listing_id, l.title AS listing_title,
                   l.location AS listing_location, l.price AS listing_price,
                   l.images AS listing_images,
                   h.id AS host_id, h.name AS host_name, h.email AS host_email
            FROM bookings b
            JOIN listings l ON b.listing_id = l.id
            JOIN users h ON l.host_id = h.id
            WHERE b.guest_id = $1
              AND ($2::text IS NULL OR b.status = $2)
            ORDER BY b.created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(guest_id)
        .bind(status)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM bookings
            WHERE guest_id = $1 AND ($2::text IS NULL OR status = $2)
            "#,
        )
        .bind(guest_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        timer.record();
        Ok((bookings, total))
    }

    /// Bookings made against a listing, newest first (host view).
    pub async fn list_for_listing(
        &self,
        listing_id: i64,
        status: Option<&str>,
        page: PageSelection,
    ) -> Result<(Vec<ListingBookingRow>, i64), sqlx::Error> {
        let timer = QueryTimer::new("list_listing_bookings");

        let bookings = sqlx::query_as::<_, ListingBookingRow>(
            r#"
            SELECT b.id, b.booking_date, b.check_in_date, b.check_out_date,
                   b.total_price, b.status, b.created_at,
                   u.id AS guest_id, u.name AS guest_name, u.email AS guest_email
            FROM bookings b
            JOIN users u ON b.guest_id = u.id
            WHERE b.listing_id = $1
              AND ($2::text IS NULL OR b.status = $2)
            ORDER BY b.created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(listing_id)
        .bind(status)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM bookings
            WHERE listing_id = $1 AND ($2::text IS NULL OR status = $2)
            "#,
        )
        .bind(listing_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        timer.record();
        Ok((bookings, total))
    }

    /// Every booking in the system, newest first (admin view).
    pub async fn list_all(
        &self,
        status: Option<&str>,
        page: PageSelection,
    ) -> Result<(Vec<BookingDetailsRow>, i64), sqlx::Error> {
        let timer = QueryTimer::new("list_all_bookings");

        let bookings = sqlx::query_as::<_, BookingDetailsRow>(
            r#"
            SELECT b.id, b.booking_date, b.check_in_date, b.check_out_date,
                   b.total_price, b.status, b.created_at,
                   l.id AS listing_id, l.title AS listing_title,
                   l.location AS listing_location, l.price AS listing_price,
                   l.images AS listing_images,
                   u.id AS guest_id, u.name AS guest_name, u.email AS guest_email,
                   h.id AS host_id, h.name AS host_name, h.email AS host_email
            FROM bookings b
            JOIN listings l ON b.listing_id = l.id
            JOIN users u ON b.guest_id = u.id
            JOIN users h ON l.host_id = h.id
            WHERE ($1::text IS NULL OR b.status = $1)
            ORDER BY b.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(status)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let (total,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM bookings WHERE ($1::text IS NULL OR status = $1)")
                .bind(status)
                .fetch_one(&self.pool)
                .await?;

        timer.record();
        Ok((bookings, total))
    }

    /// Persist a status transition. The caller has already authorized it.
    ///
    /// Re-activating a cancelled booking can collide with a reservation made
    /// in the meantime, so the exclusion constraint is remapped here too.
    pub async fn update_status(
        &self,
        id: i64,
        status: &str,
    ) -> Result<Option<BookingEntity>, ReserveError> {
        let timer = QueryTimer::new("update_booking_status");
        let result = sqlx::query_as::<_, BookingEntity>(
            r#"
            UPDATE bookings
            SET status = $1, updated_at = now()
            WHERE id = $2
            RETURNING id, listing_id, guest_id, booking_date, check_in_date,
                      check_out_date, total_price, status, created_at, updated_at
            "#,
        )
        .bind(status)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(remap_conflict)?;
        timer.record();
        Ok(result)
    }
}

/// Translates storage-level duplicate/overlap violations into the
/// user-facing conflict error; everything else passes through.
fn remap_conflict(err: sqlx::Error) -> ReserveError {
    if let sqlx::Error::Database(ref db_err) = err {
        if let Some(code) = db_err.code() {
            if code == UNIQUE_VIOLATION || code == EXCLUSION_VIOLATION {
                return ReserveError::DatesUnavailable;
            }
        }
    }
    ReserveError::Db(err)
}
