//! # Validation Module
//!
//! Input validation for sale requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP boundary (serde)                                         │
//! │  ├── Type validation (deserialization)                                  │
//! │  └── Unknown payment methods rejected before the engine sees them       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation                        │
//! │  ├── Non-empty line items, positive quantities                          │
//! │  └── Well-formed ids, non-negative money                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                             │
//! │  ├── NOT NULL / CHECK constraints                                       │
//! │  └── The conditional stock update (the authoritative check)             │
//! │                                                                         │
//! │  Defense in depth: each layer catches different errors                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::{MAX_ITEM_QUANTITY, MAX_SALE_ITEMS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line item quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a money amount that must not be negative (prices, discounts).
///
/// ## Rules
/// - Must be >= 0; zero is allowed (free items, no discount)
pub fn validate_non_negative_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates an amount paid.
///
/// ## Rules
/// - Must be positive; whether it covers the grand total is checked after
///   the server-side recompute, not here.
pub fn validate_amount_paid(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amountPaid".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the line item collection of a sale request.
///
/// ## Rules
/// - Must not be empty
/// - Must not exceed MAX_SALE_ITEMS (100)
pub fn validate_line_item_count(count: usize) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::Empty {
            field: "lineItems".to_string(),
        });
    }

    if count > MAX_SALE_ITEMS {
        return Err(ValidationError::TooMany {
            field: "lineItems".to_string(),
            max: MAX_SALE_ITEMS,
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates optional free-text customer fields.
///
/// ## Rules
/// - May be absent; when present, at most 200 characters
pub fn validate_customer_field(field: &str, value: Option<&str>) -> ValidationResult<()> {
    if let Some(value) = value {
        if value.len() > 200 {
            return Err(ValidationError::TooLong {
                field: field.to_string(),
                max: 200,
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(100).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_non_negative_cents() {
        assert!(validate_non_negative_cents("discount", 0).is_ok());
        assert!(validate_non_negative_cents("discount", 1099).is_ok());
        assert!(validate_non_negative_cents("discount", -100).is_err());
    }

    #[test]
    fn test_validate_line_item_count() {
        assert!(validate_line_item_count(1).is_ok());
        assert!(validate_line_item_count(100).is_ok());

        assert!(validate_line_item_count(0).is_err());
        assert!(validate_line_item_count(101).is_err());
    }

    #[test]
    fn test_validate_customer_field() {
        assert!(validate_customer_field("customerName", None).is_ok());
        assert!(validate_customer_field("customerName", Some("Ada")).is_ok());
        assert!(validate_customer_field("customerName", Some(&"x".repeat(300))).is_err());
    }
}
