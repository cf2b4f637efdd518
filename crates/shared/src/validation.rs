//! Common validation utilities.

use validator::ValidationError;

/// Maximum number of images accepted on a listing.
const MAX_LISTING_IMAGES: usize = 10;

/// Validates that a nightly price is strictly positive and finite.
pub fn validate_price(price: f64) -> Result<(), ValidationError> {
    if price.is_finite() && price > 0.0 {
        Ok(())
    } else {
        let mut err = ValidationError::new("price_positive");
        err.message = Some("Price must be greater than 0".into());
        Err(err)
    }
}

/// Validates a listing image list (bounded, non-empty entries).
pub fn validate_images(images: &[String]) -> Result<(), ValidationError> {
    if images.len() > MAX_LISTING_IMAGES {
        let mut err = ValidationError::new("images_count");
        err.message = Some("A listing may carry at most 10 images".into());
        return Err(err);
    }
    if images.iter().any(|url| url.trim().is_empty()) {
        let mut err = ValidationError::new("images_empty_entry");
        err.message = Some("Image entries must not be empty".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_positive() {
        assert!(validate_price(0.01).is_ok());
        assert!(validate_price(100.0).is_ok());
    }

    #[test]
    fn test_price_zero_rejected() {
        assert!(validate_price(0.0).is_err());
    }

    #[test]
    fn test_price_negative_rejected() {
        assert!(validate_price(-5.0).is_err());
    }

    #[test]
    fn test_price_nan_rejected() {
        assert!(validate_price(f64::NAN).is_err());
        assert!(validate_price(f64::INFINITY).is_err());
    }

    #[test]
    fn test_images_within_bounds() {
        let images = vec!["a.jpg".to_string(), "b.jpg".to_string()];
        assert!(validate_images(&images).is_ok());
    }

    #[test]
    fn test_images_too_many() {
        let images = vec!["x.jpg".to_string(); 11];
        assert!(validate_images(&images).is_err());
    }

    #[test]
    fn test_images_empty_entry_rejected() {
        let images = vec!["ok.jpg".to_string(), "  ".to_string()];
        assert!(validate_images(&images).is_err());
    }
}
