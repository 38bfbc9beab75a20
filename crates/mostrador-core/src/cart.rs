//! # Cart
//!
//! Client-side cart and the transaction totals derived from it.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cashier Action           Cart Method              Effect               │
//! │  ──────────────           ───────────              ──────               │
//! │  Tap product ───────────► add_item() ────────────► push or qty += n     │
//! │  Change quantity ───────► update_quantity() ─────► qty = n (0 removes)  │
//! │  Apply discount ────────► set_discount() ────────► per-unit discount    │
//! │  Remove line ───────────► remove_item() ─────────► line dropped         │
//! │  Charge ────────────────► totals() ──────────────► TransactionTotals    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Totals
//! The three header amounts are summed independently over the lines:
//! ```text
//! subtotal = Σ unit_price × qty
//! discount = Σ discount × qty
//! total    = Σ max(0, (unit_price − discount) × qty)
//! ```
//! `total` is not `subtotal − discount`: a line whose discount exceeds its
//! price contributes zero to `total` but its full discount to `discount`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Product;
use crate::validation::{validate_discount, validate_quantity, validate_unit_price};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Cart Item
// =============================================================================

/// A cart line. The product name and price are frozen when the line is
/// added, so later catalog edits do not change an open cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: String,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: i64,
    /// Discount per unit.
    #[serde(default)]
    pub discount: Money,
}

impl CartItem {
    pub fn new(
        product_id: impl Into<String>,
        product_name: impl Into<String>,
        unit_price: Money,
        quantity: i64,
    ) -> Self {
        CartItem {
            product_id: product_id.into(),
            product_name: product_name.into(),
            unit_price,
            quantity,
            discount: Money::zero(),
        }
    }

    /// Snapshots a catalog product.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartItem::new(&product.id, &product.name, product.price, quantity)
    }

    pub fn with_discount(mut self, discount: Money) -> Self {
        self.discount = discount;
        self
    }

    /// `max(0, (unit_price − discount) × quantity)`.
    ///
    /// ## Example
    /// ```rust
    /// use mostrador_core::{CartItem, Money};
    ///
    /// let item = CartItem::new("p-1", "Coffee", Money::from_units(100), 2)
    ///     .with_discount(Money::from_units(10));
    /// assert_eq!(item.subtotal(), Money::from_units(180));
    /// ```
    pub fn subtotal(&self) -> Money {
        (self.unit_price - self.discount)
            .multiply_quantity(self.quantity)
            .clamp_non_negative()
    }

    /// Price before discounts.
    pub fn gross(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    pub fn discount_total(&self) -> Money {
        self.discount.multiply_quantity(self.quantity)
    }

    /// Checks quantity and amounts of a submitted line.
    pub fn validate(&self) -> CoreResult<()> {
        if self.product_id.trim().is_empty() {
            return Err(CoreError::ProductNotFound(self.product_id.clone()));
        }
        validate_quantity(self.quantity)?;
        validate_unit_price(self.unit_price)?;
        validate_discount(self.discount)?;
        Ok(())
    }
}

// =============================================================================
// Transaction Totals
// =============================================================================

/// Header amounts of a transaction built from a set of lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TransactionTotals {
    pub subtotal: Money,
    pub discount: Money,
    /// Always zero; taxes are not modelled.
    pub tax: Money,
    pub total: Money,
}

impl TransactionTotals {
    pub fn from_items(items: &[CartItem]) -> Self {
        TransactionTotals {
            subtotal: items.iter().map(CartItem::gross).sum(),
            discount: items.iter().map(CartItem::discount_total).sum(),
            tax: Money::zero(),
            total: items.iter().map(CartItem::subtotal).sum(),
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The working cart of a cashier.
///
/// ## Invariants
/// - Lines are unique by `product_id` (adding again increases quantity)
/// - Quantity stays within 1..=999
/// - At most 100 lines
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Cart::default()
    }

    /// Adds a product, or increases the quantity of its existing line.
    pub fn add_item(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        validate_quantity(quantity)?;

        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product.id) {
            let new_qty = item.quantity + quantity;
            if new_qty > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            item.quantity = new_qty;
            return Ok(());
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge { max: MAX_CART_ITEMS });
        }

        self.items.push(CartItem::from_product(product, quantity));
        Ok(())
    }

    /// Sets a line's quantity. Zero removes the line.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_item(product_id);
        }
        validate_quantity(quantity)?;

        let item = self.line_mut(product_id)?;
        item.quantity = quantity;
        Ok(())
    }

    /// Sets the per-unit discount of a line.
    pub fn set_discount(&mut self, product_id: &str, discount: Money) -> CoreResult<()> {
        validate_discount(discount)?;

        let item = self.line_mut(product_id)?;
        item.discount = discount;
        Ok(())
    }

    pub fn remove_item(&mut self, product_id: &str) -> CoreResult<()> {
        let initial_len = self.items.len();
        self.items.retain(|i| i.product_id != product_id);

        if self.items.len() == initial_len {
            Err(CoreError::ProductNotInCart(product_id.to_string()))
        } else {
            Ok(())
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn totals(&self) -> TransactionTotals {
        TransactionTotals::from_items(&self.items)
    }

    /// Consumes the cart into the lines submitted with a transaction.
    pub fn into_items(self) -> Vec<CartItem> {
        self.items
    }

    fn line_mut(&mut self, product_id: &str) -> CoreResult<&mut CartItem> {
        self.items
            .iter_mut()
            .find(|i| i.product_id == product_id)
            .ok_or_else(|| CoreError::ProductNotInCart(product_id.to_string()))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use chrono::Utc;

    fn test_product(id: &str, price: Money) -> Product {
        Product {
            id: id.to_string(),
            business_id: "b-1".to_string(),
            name: format!("Product {}", id),
            price,
            track_stock: false,
            stock: 0,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_line_subtotal_with_discount() {
        let item = CartItem::new("p-1", "Latte", Money::from_cents(100), 2)
            .with_discount(Money::from_cents(10));
        assert_eq!(item.subtotal(), Money::from_cents(180));

        let totals = TransactionTotals::from_items(&[item]);
        assert_eq!(totals.subtotal, Money::from_cents(200));
        assert_eq!(totals.discount, Money::from_cents(20));
        assert_eq!(totals.total, Money::from_cents(180));
        assert!(totals.tax.is_zero());
    }

    #[test]
    fn test_discount_above_price_clamps_line() {
        let item = CartItem::new("p-1", "Sticker", Money::from_cents(50), 3)
            .with_discount(Money::from_cents(80));
        assert_eq!(item.subtotal(), Money::zero());

        let totals = TransactionTotals::from_items(&[item]);
        assert_eq!(totals.total, Money::zero());
        assert_eq!(totals.subtotal - totals.discount, Money::from_cents(-90));
    }

    #[test]
    fn test_add_same_product_increases_quantity() {
        let mut cart = Cart::new();
        let product = test_product("1", Money::from_cents(999));

        cart.add_item(&product, 2).unwrap();
        cart.add_item(&product, 3).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 5);
        assert_eq!(cart.totals().total, Money::from_cents(4995));
    }

    #[test]
    fn test_quantity_limits() {
        let mut cart = Cart::new();
        let product = test_product("1", Money::from_cents(100));

        cart.add_item(&product, 999).unwrap();
        assert!(matches!(
            cart.add_item(&product, 1),
            Err(CoreError::QuantityTooLarge { .. })
        ));
        assert!(cart.update_quantity("1", 1000).is_err());
        assert!(cart.add_item(&product, 0).is_err());
    }

    #[test]
    fn test_update_and_remove() {
        let mut cart = Cart::new();
        cart.add_item(&test_product("1", Money::from_cents(100)), 1).unwrap();
        cart.add_item(&test_product("2", Money::from_cents(200)), 1).unwrap();

        cart.update_quantity("2", 4).unwrap();
        cart.set_discount("2", Money::from_cents(50)).unwrap();
        assert_eq!(cart.totals().total, Money::from_cents(100 + 600));

        cart.update_quantity("1", 0).unwrap();
        assert_eq!(cart.item_count(), 1);

        assert!(matches!(
            cart.remove_item("1"),
            Err(CoreError::ProductNotInCart(_))
        ));
        assert!(cart.set_discount("2", Money::from_cents(-1)).is_err());

        cart.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_cart_size_limit() {
        let mut cart = Cart::new();
        for i in 0..MAX_CART_ITEMS {
            cart.add_item(&test_product(&i.to_string(), Money::from_cents(1)), 1)
                .unwrap();
        }
        assert!(matches!(
            cart.add_item(&test_product("overflow", Money::from_cents(1)), 1),
            Err(CoreError::CartTooLarge { .. })
        ));
    }

    #[test]
    fn test_item_validation() {
        assert!(CartItem::new("p-1", "Tea", Money::from_cents(0), 1).validate().is_ok());
        assert!(CartItem::new("p-1", "Tea", Money::from_cents(-1), 1).validate().is_err());
        assert!(CartItem::new("p-1", "Tea", Money::from_cents(10), 0).validate().is_err());
        assert!(CartItem::new("", "Tea", Money::from_cents(10), 1).validate().is_err());
    }

    #[test]
    fn test_oversized_price_rejected_and_totals_saturate() {
        let item = CartItem::new("p-1", "Big", Money::from_cents(i64::MAX / 2), 3);
        let err = item.validate().unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { .. })
        ));

        let totals = TransactionTotals::from_items(&[item.clone(), item]);
        assert_eq!(totals.total, Money::from_cents(i64::MAX));

        let largest = CartItem::new("p-1", "Big", Money::from_cents(crate::MAX_MONEY_CENTS), MAX_ITEM_QUANTITY);
        assert!(largest.validate().is_ok());
        let full: Vec<CartItem> = (0..MAX_CART_ITEMS).map(|_| largest.clone()).collect();
        let totals = TransactionTotals::from_items(&full);
        assert_eq!(
            totals.total.cents(),
            crate::MAX_MONEY_CENTS * MAX_ITEM_QUANTITY * MAX_CART_ITEMS as i64
        );
    }
}
