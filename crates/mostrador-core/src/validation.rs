//! # Validation Module
//!
//! Input validation for ledger operations and tenant configuration.
//!
//! ## Where Validation Happens
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Request (open session, create transaction, ...)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  THIS MODULE: amounts, quantities, free text, ids                       │
//! │       │         └── failure → ValidationError, nothing written          │
//! │       ▼                                                                 │
//! │  Business rules (ledger / services): sessions, stock, customers         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite: CHECK constraints, partial unique index, foreign keys          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use mostrador_core::money::Money;
//! use mostrador_core::validation::{validate_cash_amount, validate_quantity};
//!
//! assert!(validate_cash_amount("opening_cash", Money::from_units(1000)).is_ok());
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY, MAX_MONEY_CENTS, MAX_NOTES_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of a UI label in the business configuration.
pub const MAX_LABEL_LENGTH: usize = 40;

/// Maximum length of a free-text customer name.
pub const MAX_CUSTOMER_NAME_LENGTH: usize = 120;

// =============================================================================
// Money Validators
// =============================================================================

/// Validates a counted drawer amount (opening or closing cash).
///
/// ## Rules
/// - Must be non-negative; zero is a valid (empty) drawer
/// - Must not exceed MAX_MONEY_CENTS
///
/// ## Example
/// ```rust
/// use mostrador_core::money::Money;
/// use mostrador_core::validation::validate_cash_amount;
///
/// assert!(validate_cash_amount("closing_cash", Money::zero()).is_ok());
/// assert!(validate_cash_amount("closing_cash", Money::from_cents(-1)).is_err());
/// ```
pub fn validate_cash_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    if amount.cents() > MAX_MONEY_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_MONEY_CENTS,
        });
    }

    Ok(())
}

/// Validates a line's unit price snapshot. Free items are allowed.
pub fn validate_unit_price(price: Money) -> ValidationResult<()> {
    validate_cash_amount("unit_price", price)
}

/// Validates a per-unit line discount.
///
/// A discount larger than the price is accepted; the line subtotal is
/// clamped at zero instead.
pub fn validate_discount(discount: Money) -> ValidationResult<()> {
    validate_cash_amount("discount", discount)
}

// =============================================================================
// Quantity Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ## User Workflow
/// ```text
/// Cashier types quantity 5
///      │
///      ▼
/// validate_quantity(5) ← THIS FUNCTION
///      ├── qty <= 0?  → "quantity must be positive"
///      ├── qty > 999? → "quantity must be between 1 and 999"
///      └── OK → cart line updated
/// ```
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

/// Validates the number of distinct lines in a submitted cart.
pub fn validate_line_count(lines: usize) -> ValidationResult<()> {
    if lines == 0 {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if lines > MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Text Validators
// =============================================================================

/// Validates an optional free-text note and returns it trimmed.
///
/// Blank notes collapse to `None`.
pub fn validate_notes(notes: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(notes) = notes.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };

    if notes.chars().count() > MAX_NOTES_LENGTH {
        return Err(ValidationError::TooLong {
            field: "notes".to_string(),
            max: MAX_NOTES_LENGTH,
        });
    }

    Ok(Some(notes.to_string()))
}

/// Validates an optional customer name and returns it trimmed.
pub fn validate_customer_name(name: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };

    if name.chars().count() > MAX_CUSTOMER_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "customer_name".to_string(),
            max: MAX_CUSTOMER_NAME_LENGTH,
        });
    }

    Ok(Some(name.to_string()))
}

/// Validates a configuration UI label.
///
/// ## Rules
/// - Must not be blank
/// - At most 40 characters (counted as chars, not bytes: "Recetas médicas")
pub fn validate_label(field: &str, label: &str) -> ValidationResult<()> {
    if label.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if label.chars().count() > MAX_LABEL_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_LABEL_LENGTH,
        });
    }

    Ok(())
}

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates that a required reference is present.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a UUID string.
///
/// ## Example
/// ```rust
/// use mostrador_core::validation::validate_uuid;
///
/// assert!(validate_uuid("session_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("session_id", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    validate_required(field, id)?;

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_cash_amount() {
        assert!(validate_cash_amount("opening_cash", Money::zero()).is_ok());
        assert!(validate_cash_amount("opening_cash", Money::from_units(1000)).is_ok());

        let err = validate_cash_amount("opening_cash", Money::from_cents(-1)).unwrap_err();
        assert_eq!(err.to_string(), "opening_cash cannot be negative");

        assert!(validate_cash_amount("opening_cash", Money::from_cents(MAX_MONEY_CENTS)).is_ok());
        let err = validate_cash_amount("opening_cash", Money::from_cents(MAX_MONEY_CENTS + 1)).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { max: MAX_MONEY_CENTS, .. }));
        assert!(validate_unit_price(Money::from_cents(i64::MAX / 2)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_line_count() {
        assert!(validate_line_count(1).is_ok());
        assert!(validate_line_count(MAX_CART_ITEMS).is_ok());
        assert!(validate_line_count(0).is_err());
        assert!(validate_line_count(MAX_CART_ITEMS + 1).is_err());
    }

    #[test]
    fn test_validate_notes() {
        assert_eq!(validate_notes(None).unwrap(), None);
        assert_eq!(validate_notes(Some("   ")).unwrap(), None);
        assert_eq!(
            validate_notes(Some("  drawer jammed ")).unwrap(),
            Some("drawer jammed".to_string())
        );
        assert!(validate_notes(Some(&"x".repeat(MAX_NOTES_LENGTH + 1))).is_err());
    }

    #[test]
    fn test_validate_label() {
        assert!(validate_label("products", "Productos").is_ok());
        assert!(validate_label("products", "").is_err());
        assert!(validate_label("products", "   ").is_err());
        assert!(validate_label("products", &"é".repeat(40)).is_ok());
        assert!(validate_label("products", &"é".repeat(41)).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("id", "").is_err());
        assert!(validate_uuid("id", "123").is_err());
    }
}
