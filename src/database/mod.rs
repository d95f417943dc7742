use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::api::{DeliveryOption, Order, OrderItem, OrderStatus, Product};
use crate::errors::{Error, Result};

pub mod mock;
pub mod sqlite;

pub use mock::MockDb;
pub use sqlite::SqliteDb;

/// An order about to be persisted. The store assigns the id.
#[derive(Debug, Clone)]
pub struct NewOrderRecord {
    pub name: String,
    pub phone_number: String,
    pub items: Vec<OrderItem>,
    pub total: Decimal,
    pub status: OrderStatus,
    pub delivery_option: DeliveryOption,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Trait hiding the persistence implementation.
///
/// The SQLite implementation backs the real server; the mock keeps everything
/// in vectors for unit tests. The trait allows swapping one for the other
/// without touching the rest of the code.
pub trait Database {
    /// Create a new empty in-memory database
    fn new() -> Result<Self>
    where
        Self: Sized;

    /// The full product catalog
    fn get_products(&self) -> Result<Vec<Product>>;

    /// Retrieve a single product by id.
    ///
    /// Returns a NotFound error when no product carries this id.
    fn get_product(&self, id: &str) -> Result<Product>;

    /// Insert a product into the catalog
    fn insert_product(&mut self, product: &Product) -> Result<()>;

    /// Persist a new order atomically and return it with its assigned id
    fn insert_order(&mut self, order: NewOrderRecord) -> Result<Order>;

    /// All orders, newest first, optionally restricted to one customer phone
    fn get_orders(&self, phone: Option<&str>) -> Result<Vec<Order>>;

    /// Retrieve a single order by id.
    ///
    /// Returns a NotFound error when no order carries this id.
    fn get_order(&self, order_id: u32) -> Result<Order>;

    /// Overwrite the status of an existing order and return the updated record
    fn update_status(&mut self, order_id: u32, status: OrderStatus) -> Result<Order>;
}

/// Run a storage operation with a bounded number of attempts.
///
/// Only persistence failures are retried; validation and not-found errors
/// pass through immediately since retrying cannot change their outcome.
pub fn with_retries<T>(attempts: u32, mut op: impl FnMut() -> Result<T>) -> Result<T> {
    let mut last_err = None;
    for attempt in 1..=attempts.max(1) {
        match op() {
            Ok(value) => return Ok(value),
            Err(err @ Error::Persistence(_)) => {
                if attempt < attempts {
                    tracing::warn!(attempt, error = %err, "storage operation failed, retrying");
                }
                last_err = Some(err);
            }
            Err(err) => return Err(err),
        }
    }
    Err(last_err.unwrap_or_else(|| Error::Persistence("no attempts made".to_string())))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_with_retries_recovers_from_transient_failure() {
        let mut calls = 0;
        let result = with_retries(3, || {
            calls += 1;
            if calls < 3 {
                Err(Error::Persistence("database is locked".to_string()))
            } else {
                Ok(42)
            }
        });
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_with_retries_gives_up_after_attempts() {
        let mut calls = 0;
        let result = with_retries(3, || -> Result<()> {
            calls += 1;
            Err(Error::Persistence("database is locked".to_string()))
        });
        assert!(matches!(result, Err(Error::Persistence(_))));
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_with_retries_does_not_retry_validation() {
        let mut calls = 0;
        let result = with_retries(3, || -> Result<()> {
            calls += 1;
            Err(Error::validation("bad input"))
        });
        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(calls, 1);
    }
}
