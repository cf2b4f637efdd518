//! Listing repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use std::str::FromStr;

use crate::entities::ListingEntity;
use crate::metrics::QueryTimer;
use shared::pagination::PageSelection;

/// Allow-listed sort columns for the listing catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingSort {
    #[default]
    CreatedAt,
    Price,
    Title,
}

impl ListingSort {
    fn column(&self) -> &'static str {
        match self {
            ListingSort::CreatedAt => "created_at",
            ListingSort::Price => "price",
            ListingSort::Title => "title",
        }
    }
}

impl FromStr for ListingSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created_at" => Ok(ListingSort::CreatedAt),
            "price" => Ok(ListingSort::Price),
            "title" => Ok(ListingSort::Title),
            _ => Err(format!("Invalid sort column: {}", s)),
        }
    }
}

/// Sort direction; anything unrecognized falls back to descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ASC" => Ok(SortOrder::Asc),
            "DESC" => Ok(SortOrder::Desc),
            _ => Err(format!("Invalid sort order: {}", s)),
        }
    }
}

/// Catalog search predicates. Only active listings are searched.
#[derive(Debug, Clone, Default)]
pub struct ListingFilter {
    /// Case-insensitive substring match on location.
    pub location: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub sort: ListingSort,
    pub order: SortOrder,
}

/// Fields for a new listing.
#[derive(Debug, Clone)]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub location: String,
    pub price: f64,
    pub images: Vec<String>,
    pub amenities: Vec<String>,
}

/// Optional listing fields; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdateListing {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub price: Option<f64>,
    pub images: Option<Vec<String>>,
    pub amenities: Option<Vec<String>>,
    pub status: Option<String>,
}

/// Listing row joined with the owning host's identity.
#[derive(Debug, Clone, FromRow)]
pub struct ListingWithHostRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub location: String,
    pub price: f64,
    pub images: Json<Vec<String>>,
    pub amenities: Json<Vec<String>>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub host_id: i64,
    pub host_name: String,
    pub host_email: String,
    pub host_bio: Option<String>,
}

const LISTING_COLUMNS: &str = "id, host_id, title, description, location, price, \
     images, amenities, status, created_at, updated_at";

/// Repository for listing-related database operations.
#[derive(Clone)]
pub struct ListingRepository {
    pool: PgPool,
}

impl ListingRepository {
    /// Creates a new ListingRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a listing owned by `host_id`. Status starts as `active`.
    pub async fn create(
        &self,
        host_id: i64,
        listing: &NewListing,
    ) -> Result<ListingEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_listing");
        let result = sqlx::query_as::<_, ListingEntity>(&format!(
            r#"
            INSERT INTO listings (host_id, title, description, location, price, images, amenities)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {LISTING_COLUMNS}
            "#,
        ))
        .bind(host_id)
        .bind(&listing.title)
        .bind(&listing.description)
        .bind(&listing.location)
        .bind(listing.price)
        .bind(Json(&listing.images))
        .bind(Json(&listing.amenities))
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a listing by id.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<ListingEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_listing_by_id");
        let result = sqlx::query_as::<_, ListingEntity>(&format!(
            "SELECT {LISTING_COLUMNS} FROM listings WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a listing joined with its host identity.
    pub async fn find_with_host(
        &self,
        id: i64,
    ) -> Result<Option<ListingWithHostRow>, sqlx::Error> {
        let timer = QueryTimer::new("find_listing_with_host");
        let result = sqlx::query_as::<_, ListingWithHostRow>(
            r#"
            SELECT l.id, l.title, l.description, l.location, l.price,
                   l.images, l.amenities, l.status, l.created_at, l.updated_at,
                   u.id AS host_id, u.name AS host_name, u.email AS host_email,
                   u.bio AS host_bio
            FROM listings l
            JOIN users u ON l.host_id = u.id
            WHERE l.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Fresh ownership lookup used by mutation guards.
    pub async fn host_id_of(&self, id: i64) -> Result<Option<i64>, sqlx::Error> {
        let timer = QueryTimer::new("listing_host_id");
        let row: Option<(i64,)> = sqlx::query_as("SELECT host_id FROM listings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        timer.record();
        Ok(row.map(|(host_id,)| host_id))
    }

    /// Search active listings with catalog filters and pagination.
    ///
    /// The sort column and direction come from allow-listed enums, never
    /// from raw client input.
    pub async fn search(
        &self,
        filter: &ListingFilter,
        page: PageSelection,
    ) -> Result<(Vec<ListingWithHostRow>, i64), sqlx::Error> {
        let timer = QueryTimer::new("search_listings");

        let location_pattern = filter.location.as_ref().map(|loc| format!("%{}%", loc));

        let query = format!(
            r#"
            SELECT l.id, l.title, l.description, l.location, l.price,
                   l.images, l.amenities, l.status, l.created_at, l.updated_at,
                   u.id AS host_id, u.name AS host_name, u.email AS host_email,
                   u.bio AS host_bio
            FROM listings l
            JOIN users u ON l.host_id = u.id
            WHERE l.status = 'active'
              AND ($1::text IS NULL OR l.location ILIKE $1)
              AND ($2::float8 IS NULL OR l.price >= $2)
              AND ($3::float8 IS NULL OR l.price <= $3)
            ORDER BY l.{} {}
            LIMIT $4 OFFSET $5
            "#,
            filter.sort.column(),
            filter.order.keyword(),
        );

        let listings = sqlx::query_as::<_, ListingWithHostRow>(&query)
            .bind(&location_pattern)
            .bind(filter.min_price)
            .bind(filter.max_price)
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM listings l
            WHERE l.status = 'active'
              AND ($1::text IS NULL OR l.location ILIKE $1)
              AND ($2::float8 IS NULL OR l.price >= $2)
              AND ($3::float8 IS NULL OR l.price <= $3)
            "#,
        )
        .bind(&location_pattern)
        .bind(filter.min_price)
        .bind(filter.max_price)
        .fetch_one(&self.pool)
        .await?;

        timer.record();
        Ok((listings, total))
    }

    /// List a host's listings, any status, with an optional status filter.
    pub async fn by_host(
        &self,
        host_id: i64,
        status: Option<&str>,
        page: PageSelection,
    ) -> Result<(Vec<ListingWithHostRow>, i64), sqlx::Error> {
        let timer = QueryTimer::new("listings_by_host");

        let listings = sqlx::query_as::<_, ListingWithHostRow>(
            r#"
            SELECT l.id, l.title, l.description, l.location, l.price,
                   l.images, l.amenities, l.status, l.created_at, l.updated_at,
                   u.id AS host_id, u.name AS host_name, u.email AS host_email,
                   u.bio AS host_bio
            FROM listings l
            JOIN users u ON l.host_id = u.id
            WHERE l.host_id = $1
              AND ($2::text IS NULL OR l.status = $2)
            ORDER BY l.created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(host_id)
        .bind(status)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM listings
            WHERE host_id = $1 AND ($2::text IS NULL OR status = $2)
            "#,
        )
        .bind(host_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        timer.record();
        Ok((listings, total))
    }

    /// Update listing fields, keeping the stored value for omitted fields.
    pub async fn update(
        &self,
        id: i64,
        update: &UpdateListing,
    ) -> Result<Option<ListingEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_listing");
        let result = sqlx::query_as::<_, ListingEntity>(&format!(
            r#"
            UPDATE listings
            SET title = COALESCE($1, title),
                description = COALESCE($2, description),
                location = COALESCE($3, location),
                price = COALESCE($4, price),
                images = COALESCE($5, images),
                amenities = COALESCE($6, amenities),
                status = COALESCE($7, status),
                updated_at = now()
            WHERE id = $8
            RETURNING {LISTING_COLUMNS}
            "#,
        ))
        .bind(&update.title)
        .bind(&update.description)
        .bind(&update.location)
        .bind(update.price)
        .bind(update.images.as_ref().map(Json))
        .bind(update.amenities.as_ref().map(Json))
        .bind(&update.status)
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Delete a listing. Returns false when no row matched.
    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_listing");
        let result = sqlx::query("DELETE FROM listings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_column_allow_list() {
        assert_eq!(ListingSort::from_str("price").unwrap(), ListingSort::Price);
        assert_eq!(ListingSort::from_str("title").unwrap(), ListingSort::Title);
        assert_eq!(
            ListingSort::from_str("created_at").unwrap(),
            ListingSort::CreatedAt
        );
        assert!(ListingSort::from_str("host_id; DROP TABLE users").is_err());
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!(SortOrder::from_str("asc").unwrap(), SortOrder::Asc);
        assert_eq!(SortOrder::from_str("DESC").unwrap(), SortOrder::Desc);
        assert!(SortOrder::from_str("sideways").is_err());
    }

    #[test]
    fn test_default_sort_is_created_at_desc() {
        let filter = ListingFilter::default();
        assert_eq!(filter.sort, ListingSort::CreatedAt);
        assert_eq!(filter.order, SortOrder::Desc);
        assert_eq!(filter.sort.column(), "created_at");
        assert_eq!(filter.order.keyword(), "DESC");
    }
}
