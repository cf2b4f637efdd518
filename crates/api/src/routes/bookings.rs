//! Booking lifecycle routes: creation with conflict detection, guest and
//! host views, and role-gated status transitions.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::middleware::metrics::record_booking_created;
use crate::response::ApiResponse;
use crate::routes::users::ensure_admin;
use domain::booking::{BookingDateError, Stay};
use domain::models::{Booking, BookingStatus, Listing, ListingSummary, UserSummary};
use domain::policy::{self, BookingRelation};
use persistence::repositories::{
    BookingDetailsRow, BookingRepository, GuestBookingRow, ListingBookingRow, ListingRepository,
    NewBooking,
};
use shared::pagination::{PageInfo, PageQuery};

/// Full booking in responses, with listing, guest, and host blocks.
#[derive(Debug, Clone, Serialize)]
pub struct BookingResponse {
    pub id: i64,
    pub booking_date: NaiveDate,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub total_price: f64,
    pub status: String,
    pub created_at: String,
    pub listing: ListingSummary,
    pub guest: UserSummary,
    pub host: UserSummary,
}

impl From<BookingDetailsRow> for BookingResponse {
    fn from(row: BookingDetailsRow) -> Self {
        Self {
            id: row.id,
            booking_date: row.booking_date,
            check_in_date: row.check_in_date,
            check_out_date: row.check_out_date,
            total_price: row.total_price,
            status: row.status,
            created_at: row.created_at.to_rfc3339(),
            listing: ListingSummary {
                id: row.listing_id,
                title: row.listing_title,
                location: row.listing_location,
                price: row.listing_price,
                images: row.listing_images.0,
            },
            guest: UserSummary {
                id: row.guest_id,
                name: row.guest_name,
                email: row.guest_email,
                bio: None,
            },
            host: UserSummary {
                id: row.host_id,
                name: row.host_name,
                email: row.host_email,
                bio: None,
            },
        }
    }
}

/// A guest's booking: listing and host blocks, no guest block.
#[derive(Debug, Clone, Serialize)]
pub struct GuestBookingResponse {
    pub id: i64,
    pub booking_date: NaiveDate,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub total_price: f64,
    pub status: String,
    pub created_at: String,
    pub listing: ListingSummary,
    pub host: UserSummary,
}

impl From<GuestBookingRow> for GuestBookingResponse {
    fn from(row: GuestBookingRow) -> Self {
        Self {
            id: row.id,
            booking_date: row.booking_date,
            check_in_date: row.check_in_date,
            check_out_date: row.check_out_date,
            total_price: row.total_price,
            status: row.status,
            created_at: row.created_at.to_rfc3339(),
            listing: ListingSummary {
                id: row.listing_id,
                title: row.listing_title,
                location: row.listing_location,
                price: row.listing_price,
                images: row.listing_images.0,
            },
            host: UserSummary {
                id: row.host_id,
                name: row.host_name,
                email: row.host_email,
                bio: None,
            },
        }
    }
}

/// A listing's booking: guest block only (host view).
#[derive(Debug, Clone, Serialize)]
pub struct ListingBookingResponse {
    pub id: i64,
    pub booking_date: NaiveDate,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub total_price: f64,
    pub status: String,
    pub created_at: String,
    pub guest: UserSummary,
}

impl From<ListingBookingRow> for ListingBookingResponse {
    fn from(row: ListingBookingRow) -> Self {
        Self {
            id: row.id,
            booking_date: row.booking_date,
            check_in_date: row.check_in_date,
            check_out_date: row.check_out_date,
            total_price: row.total_price,
            status: row.status,
            created_at: row.created_at.to_rfc3339(),
            guest: UserSummary {
                id: row.guest_id,
                name: row.guest_name,
                email: row.guest_email,
                bio: None,
            },
        }
    }
}

/// `data` payload wrapping a single booking.
#[derive(Debug, Serialize)]
pub struct BookingData {
    pub booking: BookingResponse,
}

/// Request body for booking creation. Fields are all required; they stay
/// optional here so a missing field produces the domain message instead of
/// a deserializer rejection.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    pub listing_id: Option<i64>,
    pub booking_date: Option<NaiveDate>,
    pub check_in_date: Option<NaiveDate>,
    pub check_out_date: Option<NaiveDate>,
}

fn map_date_error(err: BookingDateError) -> ApiError {
    ApiError::Validation(err.to_string())
}

/// Create a booking against an active listing.
///
/// POST /api/bookings
pub async fn create_booking(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BookingData>>), ApiError> {
    let (listing_id, booking_date, check_in, check_out) = match (
        request.listing_id,
        request.booking_date,
        request.check_in_date,
        request.check_out_date,
    ) {
        (Some(l), Some(b), Some(ci), Some(co)) => (l, b, ci, co),
        _ => {
            return Err(ApiError::Validation(
                "Listing ID, booking date, check-in date, and check-out date are required"
                    .to_string(),
            ))
        }
    };

    let today = Utc::now().date_naive();
    let stay = Stay::new(booking_date, check_in, check_out, today).map_err(map_date_error)?;

    let listings = ListingRepository::new(state.pool.clone());
    let listing: Listing = listings
        .find_by_id(listing_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Listing not found".to_string()))?
        .into();

    if !listing.is_bookable() {
        return Err(ApiError::Validation(
            "Listing is not available for booking".to_string(),
        ));
    }

    let decision = policy::can_book_listing(auth.user_id, listing.host_id);
    if let Some(reason) = decision.reason() {
        return Err(ApiError::Forbidden(reason.to_string()));
    }

    let status = if state.config.bookings.auto_confirm {
        BookingStatus::Confirmed
    } else {
        BookingStatus::Pending
    };

    let bookings = BookingRepository::new(state.pool.clone());
    let booking = bookings
        .reserve(&NewBooking {
            listing_id,
            guest_id: auth.user_id,
            booking_date: stay.booking_date,
            check_in_date: stay.check_in,
            check_out_date: stay.check_out,
            total_price: stay.total_price(listing.price),
            status: status.as_str().to_string(),
        })
        .await?;

    info!(
        booking_id = booking.id,
        listing_id,
        guest_id = auth.user_id,
        nights = stay.nights(),
        total_price = booking.total_price,
        status = %status,
        "Booking created"
    );
    record_booking_created();

    let details = bookings
        .find_details(booking.id)
        .await?
        .ok_or_else(|| ApiError::Internal("Booking missing after insert".to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Booking created successfully",
            BookingData {
                booking: details.into(),
            },
        )),
    ))
}

/// Query parameters shared by the booking list views.
#[derive(Debug, Deserialize)]
pub struct BookingListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
}

fn parse_status_filter(raw: Option<&str>) -> Result<Option<BookingStatus>, ApiError> {
    match raw {
        Some(s) => BookingStatus::from_str(s)
            .map(Some)
            .map_err(|_| ApiError::Validation("Invalid status value".to_string())),
        None => Ok(None),
    }
}

/// `data` payload for a guest's bookings.
#[derive(Debug, Serialize)]
pub struct GuestBookingListData {
    pub bookings: Vec<GuestBookingResponse>,
    pub pagination: PageInfo,
}

/// A guest's own bookings. The path id names the guest, not a booking.
///
/// GET /api/bookings/:user_id
pub async fn user_bookings(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(user_id): Path<i64>,
    Query(query): Query<BookingListQuery>,
) -> Result<Json<ApiResponse<GuestBookingListData>>, ApiError> {
    let decision = policy::can_view_user_bookings(auth.user_id, user_id);
    if let Some(reason) = decision.reason() {
        return Err(ApiError::Forbidden(reason.to_string()));
    }

    let status = parse_status_filter(query.status.as_deref())?;
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .normalize();

    let repo = BookingRepository::new(state.pool.clone());
    let (rows, total) = repo
        .list_for_guest(user_id, status.map(|s| s.as_str()), page)
        .await?;

    Ok(Json(ApiResponse::data(GuestBookingListData {
        bookings: rows.into_iter().map(GuestBookingResponse::from).collect(),
        pagination: page.info(total),
    })))
}

/// `data` payload for a listing's bookings.
#[derive(Debug, Serialize)]
pub struct ListingBookingListData {
    pub bookings: Vec<ListingBookingResponse>,
    pub pagination: PageInfo,
}

/// Bookings made against one of the caller's listings.
///
/// GET /api/bookings/listing/:listing_id
pub async fn listing_bookings(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(listing_id): Path<i64>,
    Query(query): Query<BookingListQuery>,
) -> Result<Json<ApiResponse<ListingBookingListData>>, ApiError> {
    let listings = ListingRepository::new(state.pool.clone());
    let host_id = listings
        .host_id_of(listing_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Listing not found".to_string()))?;

    let decision = policy::can_view_listing_bookings(auth.user_id, host_id);
    if let Some(reason) = decision.reason() {
        return Err(ApiError::Forbidden(reason.to_string()));
    }

    let status = parse_status_filter(query.status.as_deref())?;
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .normalize();

    let repo = BookingRepository::new(state.pool.clone());
    let (rows, total) = repo
        .list_for_listing(listing_id, status.map(|s| s.as_str()), page)
        .await?;

    Ok(Json(ApiResponse::data(ListingBookingListData {
        bookings: rows.into_iter().map(ListingBookingResponse::from).collect(),
        pagination: page.info(total),
    })))
}

/// `data` payload for the admin booking list.
#[derive(Debug, Serialize)]
pub struct AllBookingListData {
    pub bookings: Vec<BookingResponse>,
    pub pagination: PageInfo,
}

/// Every booking in the system. Admin only.
///
/// GET /api/bookings
pub async fn list_all_bookings(
    State(state): State<AppState>,
    auth: UserAuth,
    Query(query): Query<BookingListQuery>,
) -> Result<Json<ApiResponse<AllBookingListData>>, ApiError> {
    ensure_admin(&state, auth.user_id).await?;

    let status = parse_status_filter(query.status.as_deref())?;
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .normalize();

    let repo = BookingRepository::new(state.pool.clone());
    let (rows, total) = repo.list_all(status.map(|s| s.as_str()), page).await?;

    Ok(Json(ApiResponse::data(AllBookingListData {
        bookings: rows.into_iter().map(BookingResponse::from).collect(),
        pagination: page.info(total),
    })))
}

/// Request body for a status transition.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

/// Booking fields returned after a status transition (no joined blocks).
#[derive(Debug, Serialize)]
pub struct UpdatedBookingResponse {
    pub id: i64,
    pub listing_id: i64,
    pub guest_id: i64,
    pub booking_date: NaiveDate,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub total_price: f64,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Booking> for UpdatedBookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.id,
            listing_id: booking.listing_id,
            guest_id: booking.guest_id,
            booking_date: booking.booking_date,
            check_in_date: booking.check_in_date,
            check_out_date: booking.check_out_date,
            total_price: booking.total_price,
            status: booking.status.to_string(),
            created_at: booking.created_at.to_rfc3339(),
            updated_at: booking.updated_at.to_rfc3339(),
        }
    }
}

/// `data` payload wrapping the updated booking.
#[derive(Debug, Serialize)]
pub struct UpdatedBookingData {
    pub booking: UpdatedBookingResponse,
}

/// Transition a booking's status.
///
/// PUT /api/bookings/:id/status
///
/// The listing's host may set any status; the booking's guest may only
/// cancel; everyone else is rejected.
pub async fn update_status(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(id): Path<i64>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<UpdatedBookingData>>, ApiError> {
    let target = request
        .status
        .as_deref()
        .and_then(|s| BookingStatus::from_str(s).ok())
        .ok_or_else(|| {
            ApiError::Validation(
                "Valid status is required (pending, confirmed, cancelled, completed)".to_string(),
            )
        })?;

    let repo = BookingRepository::new(state.pool.clone());
    let parties = repo
        .parties(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Booking not found".to_string()))?;

    let relation = BookingRelation::of(auth.user_id, parties.guest_id, parties.host_id);
    let decision = policy::can_transition_booking(relation, target);
    if let Some(reason) = decision.reason() {
        return Err(ApiError::Forbidden(reason.to_string()));
    }

    let booking: Booking = repo
        .update_status(id, target.as_str())
        .await?
        .ok_or_else(|| ApiError::NotFound("Booking not found".to_string()))?
        .into();

    info!(
        booking_id = id,
        caller_id = auth.user_id,
        from = %parties.status,
        to = %target,
        "Booking status updated"
    );

    Ok(Json(ApiResponse::with_message(
        format!("Booking {} successfully", target),
        UpdatedBookingData {
            booking: booking.into(),
        },
    )))
}
