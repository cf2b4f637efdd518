//! Listing catalog routes: search, CRUD, and per-host views.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::info;
use validator::{Validate, ValidationError};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::middleware::metrics::record_listing_created;
use crate::response::ApiResponse;
use domain::models::{ListingStatus, UserSummary};
use domain::policy;
use persistence::entities::ListingEntity;
use persistence::repositories::{
    ListingFilter, ListingRepository, ListingSort, ListingWithHostRow, NewListing, SortOrder,
    UpdateListing, UserRepository,
};
use shared::pagination::{PageInfo, PageQuery};
use shared::validation::{validate_images, validate_price};

/// Listing in responses, with the owning host's identity embedded.
#[derive(Debug, Clone, Serialize)]
pub struct ListingResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub location: String,
    pub price: f64,
    pub images: Vec<String>,
    pub amenities: Vec<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
    pub host: UserSummary,
}

impl From<ListingWithHostRow> for ListingResponse {
    fn from(row: ListingWithHostRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            location: row.location,
            price: row.price,
            images: row.images.0,
            amenities: row.amenities.0,
            status: row.status,
            created_at: row.created_at.to_rfc3339(),
            updated_at: row.updated_at.to_rfc3339(),
            host: UserSummary {
                id: row.host_id,
                name: row.host_name,
                email: row.host_email,
                bio: row.host_bio,
            },
        }
    }
}

impl ListingResponse {
    fn from_entity(listing: ListingEntity, host: UserSummary) -> Self {
        Self {
            id: listing.id,
            title: listing.title,
            description: listing.description,
            location: listing.location,
            price: listing.price,
            images: listing.images.0,
            amenities: listing.amenities.0,
            status: listing.status,
            created_at: listing.created_at.to_rfc3339(),
            updated_at: listing.updated_at.to_rfc3339(),
            host,
        }
    }
}

/// `data` payload wrapping a single listing.
#[derive(Debug, Serialize)]
pub struct ListingData {
    pub listing: ListingResponse,
}

/// `data` payload for listing collections.
#[derive(Debug, Serialize)]
pub struct ListingListData {
    pub listings: Vec<ListingResponse>,
    pub pagination: PageInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<FiltersEcho>,
}

/// Echo of the filters that produced a search result page.
#[derive(Debug, Serialize)]
pub struct FiltersEcho {
    pub location: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub sort_by: &'static str,
    pub sort_order: &'static str,
}

fn field_error(err: ValidationError) -> ApiError {
    ApiError::Validation(
        err.message
            .map(|m| m.to_string())
            .unwrap_or_else(|| "Invalid value".to_string()),
    )
}

/// Request body for creating a listing.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateListingRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 5000, message = "Description must be 1-5000 characters"))]
    pub description: String,

    #[validate(length(min = 1, max = 200, message = "Location must be 1-200 characters"))]
    pub location: String,

    pub price: f64,

    #[serde(default)]
    pub images: Vec<String>,

    #[serde(default)]
    pub amenities: Vec<String>,
}

/// Create a listing owned by the caller.
///
/// POST /api/listings
pub async fn create_listing(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<CreateListingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ListingData>>), ApiError> {
    request.validate().map_err(ApiError::from)?;
    validate_price(request.price).map_err(field_error)?;
    validate_images(&request.images).map_err(field_error)?;

    let listings = ListingRepository::new(state.pool.clone());
    let listing = listings
        .create(
            auth.user_id,
            &NewListing {
                title: request.title.trim().to_string(),
                description: request.description.trim().to_string(),
                location: request.location.trim().to_string(),
                price: request.price,
                images: request.images,
                amenities: request.amenities,
            },
        )
        .await?;

    // Embed the host block the same way the detail view does
    let host = UserRepository::new(state.pool.clone())
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Internal("Listing host missing after insert".to_string()))?;

    info!(listing_id = listing.id, host_id = auth.user_id, "Listing created");
    record_listing_created();

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Listing created successfully",
            ListingData {
                listing: ListingResponse::from_entity(listing, host.into()),
            },
        )),
    ))
}

/// Query parameters for catalog search.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchListingsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub location: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// Search active listings.
///
/// GET /api/listings
///
/// Invalid sort column/direction fall back to `created_at DESC` rather
/// than erroring.
pub async fn search_listings(
    State(state): State<AppState>,
    Query(query): Query<SearchListingsQuery>,
) -> Result<Json<ApiResponse<ListingListData>>, ApiError> {
    let sort = query
        .sort_by
        .as_deref()
        .and_then(|s| ListingSort::from_str(s).ok())
        .unwrap_or_default();
    let order = query
        .sort_order
        .as_deref()
        .and_then(|s| SortOrder::from_str(s).ok())
        .unwrap_or_default();

    let filter = ListingFilter {
        location: query.location.clone(),
        min_price: query.min_price,
        max_price: query.max_price,
        sort,
        order,
    };

    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .normalize();

    let repo = ListingRepository::new(state.pool.clone());
    let (rows, total) = repo.search(&filter, page).await?;

    Ok(Json(ApiResponse::data(ListingListData {
        listings: rows.into_iter().map(ListingResponse::from).collect(),
        pagination: page.info(total),
        filters: Some(FiltersEcho {
            location: query.location,
            min_price: query.min_price,
            max_price: query.max_price,
            sort_by: match sort {
                ListingSort::CreatedAt => "created_at",
                ListingSort::Price => "price",
                ListingSort::Title => "title",
            },
            sort_order: match order {
                SortOrder::Asc => "ASC",
                SortOrder::Desc => "DESC",
            },
        }),
    })))
}

/// Fetch a listing by id, any status.
///
/// GET /api/listings/:id
pub async fn get_listing(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ListingData>>, ApiError> {
    let repo = ListingRepository::new(state.pool.clone());
    let row = repo
        .find_with_host(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Listing not found".to_string()))?;

    Ok(Json(ApiResponse::data(ListingData {
        listing: row.into(),
    })))
}

/// Request body for listing updates. Omitted fields keep their value.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateListingRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 5000, message = "Description must be 1-5000 characters"))]
    pub description: Option<String>,

    #[validate(length(min = 1, max = 200, message = "Location must be 1-200 characters"))]
    pub location: Option<String>,

    pub price: Option<f64>,

    pub images: Option<Vec<String>>,

    pub amenities: Option<Vec<String>>,

    pub status: Option<String>,
}

/// Update a listing. Owner only; ownership is re-read from the store
/// immediately before the mutation.
///
/// PUT /api/listings/:id
pub async fn update_listing(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(id): Path<i64>,
    Json(request): Json<UpdateListingRequest>,
) -> Result<Json<ApiResponse<ListingData>>, ApiError> {
    request.validate().map_err(ApiError::from)?;

    if let Some(price) = request.price {
        validate_price(price).map_err(field_error)?;
    }
    if let Some(ref images) = request.images {
        validate_images(images).map_err(field_error)?;
    }
    let status = match request.status.as_deref() {
        Some(raw) => Some(
            ListingStatus::from_str(raw)
                .map_err(|_| ApiError::Validation("Invalid status value".to_string()))?,
        ),
        None => None,
    };

    let repo = ListingRepository::new(state.pool.clone());
    let host_id = repo
        .host_id_of(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Listing not found".to_string()))?;

    let decision = policy::can_mutate_listing(auth.user_id, host_id);
    if let Some(reason) = decision.reason() {
        return Err(ApiError::Forbidden(reason.to_string()));
    }

    let update = UpdateListing {
        title: request.title.map(|t| t.trim().to_string()),
        description: request.description.map(|d| d.trim().to_string()),
        location: request.location.map(|l| l.trim().to_string()),
        price: request.price,
        images: request.images,
        amenities: request.amenities,
        status: status.map(|s| s.as_str().to_string()),
    };

    let listing = repo
        .update(id, &update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Listing not found".to_string()))?;

    let host = UserRepository::new(state.pool.clone())
        .find_by_id(host_id)
        .await?
        .ok_or_else(|| ApiError::Internal("Listing host missing".to_string()))?;

    info!(listing_id = id, host_id, "Listing updated");

    Ok(Json(ApiResponse::with_message(
        "Listing updated successfully",
        ListingData {
            listing: ListingResponse::from_entity(listing, host.into()),
        },
    )))
}

/// Delete a listing. Owner only.
///
/// DELETE /api/listings/:id
pub async fn delete_listing(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let repo = ListingRepository::new(state.pool.clone());
    let host_id = repo
        .host_id_of(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Listing not found".to_string()))?;

    let decision = policy::can_mutate_listing(auth.user_id, host_id);
    if let Some(reason) = decision.reason() {
        return Err(ApiError::Forbidden(reason.to_string()));
    }

    repo.delete(id).await?;

    info!(listing_id = id, host_id, "Listing deleted");

    Ok(Json(ApiResponse::message("Listing deleted successfully")))
}

/// Query parameters for a host's listings.
#[derive(Debug, Deserialize)]
pub struct HostListingsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
}

/// List a host's listings, any status.
///
/// GET /api/listings/host/:host_id
pub async fn host_listings(
    State(state): State<AppState>,
    Path(host_id): Path<i64>,
    Query(query): Query<HostListingsQuery>,
) -> Result<Json<ApiResponse<ListingListData>>, ApiError> {
    let status = match query.status.as_deref() {
        Some(raw) => Some(
            ListingStatus::from_str(raw)
                .map_err(|_| ApiError::Validation("Invalid status value".to_string()))?,
        ),
        None => None,
    };

    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .normalize();

    let repo = ListingRepository::new(state.pool.clone());
    let (rows, total) = repo
        .by_host(host_id, status.map(|s| s.as_str()), page)
        .await?;

    Ok(Json(ApiResponse::data(ListingListData {
        listings: rows.into_iter().map(ListingResponse::from).collect(),
        pagination: page.info(total),
        filters: None,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_listing_request_valid() {
        let request = CreateListingRequest {
            title: "Seaside cottage".to_string(),
            description: "Two bedrooms by the shore".to_string(),
            location: "Brighton".to_string(),
            price: 120.0,
            images: vec!["a.jpg".to_string()],
            amenities: vec!["wifi".to_string()],
        };
        assert!(request.validate().is_ok());
        assert!(validate_price(request.price).is_ok());
    }

    #[test]
    fn test_create_listing_request_empty_title() {
        let request = CreateListingRequest {
            title: "".to_string(),
            description: "desc".to_string(),
            location: "loc".to_string(),
            price: 120.0,
            images: vec![],
            amenities: vec![],
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_price_zero_rejected() {
        assert!(validate_price(0.0).is_err());
        assert!(validate_price(-10.0).is_err());
    }

    #[test]
    fn test_search_query_camel_case_params() {
        let query: SearchListingsQuery = serde_json::from_str(
            r#"{"minPrice": 50.0, "maxPrice": 200.0, "sortBy": "price", "sortOrder": "asc"}"#,
        )
        .unwrap();

        assert_eq!(query.min_price, Some(50.0));
        assert_eq!(query.max_price, Some(200.0));
        assert_eq!(query.sort_by.as_deref(), Some("price"));
        assert_eq!(query.sort_order.as_deref(), Some("asc"));
    }

    #[test]
    fn test_update_listing_request_partial() {
        let request = UpdateListingRequest {
            title: None,
            description: None,
            location: None,
            price: Some(99.0),
            images: None,
            amenities: None,
            status: Some("inactive".to_string()),
        };
        assert!(request.validate().is_ok());
    }
}
