//! Listing entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use std::str::FromStr;

/// Database row mapping for the listings table.
///
/// Images and amenities are stored as JSONB arrays of strings.
#[derive(Debug, Clone, FromRow)]
pub struct ListingEntity {
    pub id: i64,
    pub host_id: i64,
    pub title: String,
    pub description: String,
    pub location: String,
    pub price: f64,
    pub images: Json<Vec<String>>,
    pub amenities: Json<Vec<String>>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ListingEntity> for domain::models::Listing {
    fn from(entity: ListingEntity) -> Self {
        Self {
            id: entity.id,
            host_id: entity.host_id,
            title: entity.title,
            description: entity.description,
            location: entity.location,
            price: entity.price,
            images: entity.images.0,
            amenities: entity.amenities.0,
            status: domain::models::ListingStatus::from_str(&entity.status)
                .unwrap_or(domain::models::ListingStatus::Inactive),
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

impl From<ListingEntity> for domain::models::ListingSummary {
    fn from(entity: ListingEntity) -> Self {
        Self {
            id: entity.id,
            title: entity.title,
            location: entity.location,
            price: entity.price,
            images: entity.images.0,
        }
    }
}
