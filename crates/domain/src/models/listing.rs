//! Property listing domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A bookable property owned by a host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: i64,
    pub host_id: i64,
    pub title: String,
    pub description: String,
    /// Free-text location, matched by case-insensitive substring in search.
    pub location: String,
    /// Nightly price; always > 0.
    pub price: f64,
    pub images: Vec<String>,
    pub amenities: Vec<String>,
    pub status: ListingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    /// Whether the listing currently accepts bookings.
    pub fn is_bookable(&self) -> bool {
        self.status == ListingStatus::Active
    }
}

/// Listing availability status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Active,
    Inactive,
    Pending,
    Suspended,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Active => "active",
            ListingStatus::Inactive => "inactive",
            ListingStatus::Pending => "pending",
            ListingStatus::Suspended => "suspended",
        }
    }
}

impl FromStr for ListingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(ListingStatus::Active),
            "inactive" => Ok(ListingStatus::Inactive),
            "pending" => Ok(ListingStatus::Pending),
            "suspended" => Ok(ListingStatus::Suspended),
            _ => Err(format!("Invalid listing status: {}", s)),
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Compact listing block embedded in booking responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingSummary {
    pub id: i64,
    pub title: String,
    pub location: String,
    pub price: f64,
    pub images: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_status_round_trip() {
        for status in [
            ListingStatus::Active,
            ListingStatus::Inactive,
            ListingStatus::Pending,
            ListingStatus::Suspended,
        ] {
            assert_eq!(ListingStatus::from_str(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn test_listing_status_from_str_case_insensitive() {
        assert_eq!(
            ListingStatus::from_str("ACTIVE").unwrap(),
            ListingStatus::Active
        );
        assert!(ListingStatus::from_str("archived").is_err());
    }

    #[test]
    fn test_is_bookable_only_when_active() {
        let mut listing = Listing {
            id: 1,
            host_id: 2,
            title: "Seaside cottage".to_string(),
            description: "Two bedrooms by the shore".to_string(),
            location: "Brighton".to_string(),
            price: 120.0,
            images: vec![],
            amenities: vec!["wifi".to_string()],
            status: ListingStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(listing.is_bookable());

        for status in [
            ListingStatus::Inactive,
            ListingStatus::Pending,
            ListingStatus::Suspended,
        ] {
            listing.status = status;
            assert!(!listing.is_bookable());
        }
    }
}
