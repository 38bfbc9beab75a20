//! # Product Repository
//!
//! Catalog rows used to snapshot line items and to check stock.
//!
//! ## Stock Model
//! ```text
//! track_stock = 0   stock column ignored, always sellable
//! track_stock = 1   sale decrements stock inside the sale's db transaction;
//!                   CHECK (stock >= 0) rejects an oversell that slipped
//!                   past the service-level check
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use mostrador_core::{Money, Product};

const SELECT_PRODUCT: &str = "SELECT id, business_id, name, price, track_stock, stock, \
     is_active, created_at, updated_at FROM products";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!("{} WHERE id = ?", SELECT_PRODUCT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Inserts a product. `stock: Some(n)` turns stock tracking on.
    pub async fn insert(
        &self,
        business_id: &str,
        name: &str,
        price: Money,
        stock: Option<i64>,
    ) -> DbResult<Product> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        debug!(id = %id, business_id = %business_id, name = %name, "Inserting product");

        sqlx::query(
            "INSERT INTO products (id, business_id, name, price, track_stock, stock, is_active, \
             created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?)",
        )
        .bind(&id)
        .bind(business_id)
        .bind(name)
        .bind(price)
        .bind(stock.is_some())
        .bind(stock.unwrap_or(0))
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get_by_id(&id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Active products of a business, by name.
    pub async fn list_active(&self, business_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "{} WHERE business_id = ? AND is_active = 1 ORDER BY name",
            SELECT_PRODUCT
        ))
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    pub async fn count(&self, business_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE business_id = ?")
            .bind(business_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Sets the counted stock (inventory adjustment).
    pub async fn set_stock(&self, id: &str, stock: i64) -> DbResult<()> {
        let result = sqlx::query("UPDATE products SET stock = ?, updated_at = ? WHERE id = ?")
            .bind(stock)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }
        Ok(())
    }

    /// Changes the catalog price. Existing line items keep their snapshot.
    pub async fn update_price(&self, id: &str, price: Money) -> DbResult<()> {
        let result = sqlx::query("UPDATE products SET price = ?, updated_at = ? WHERE id = ?")
            .bind(price)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }
        Ok(())
    }

    pub async fn set_active(&self, id: &str, is_active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE products SET is_active = ?, updated_at = ? WHERE id = ?")
            .bind(is_active)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::{business, product, test_db};

    #[tokio::test]
    async fn test_insert_tracked_and_untracked() {
        let db = test_db().await;
        let business = business(&db, "pharmacy").await;

        let tracked = product(&db, &business.id, "Ibuprofeno 400mg", Money::from_cents(450), Some(12)).await;
        let service = product(&db, &business.id, "Toma de presión", Money::from_units(30), None).await;

        assert!(tracked.track_stock);
        assert_eq!(tracked.stock, 12);
        assert!(!service.track_stock);
        assert!(service.can_sell(10_000));
        assert_eq!(db.products().count(&business.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_list_active_sorted() {
        let db = test_db().await;
        let business = business(&db, "retail").await;
        let b = product(&db, &business.id, "Bolsa", Money::from_cents(100), None).await;
        product(&db, &business.id, "Agua", Money::from_cents(150), None).await;

        db.products().set_active(&b.id, false).await.unwrap();

        let names: Vec<String> = db
            .products()
            .list_active(&business.id)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Agua"]);
    }

    #[tokio::test]
    async fn test_negative_stock_rejected() {
        let db = test_db().await;
        let business = business(&db, "retail").await;
        let p = product(&db, &business.id, "Pila AA", Money::from_cents(300), Some(1)).await;

        let result = db.products().set_stock(&p.id, -1).await;
        assert!(matches!(result, Err(DbError::CheckViolation { .. })));

        db.products().update_price(&p.id, Money::from_cents(350)).await.unwrap();
        let loaded = db.products().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(loaded.price, Money::from_cents(350));
        assert_eq!(loaded.stock, 1);
    }
}
