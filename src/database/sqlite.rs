use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

use crate::api::{DeliveryOption, Order, OrderItem, OrderStatus, Product};
use crate::database::{Database, NewOrderRecord};
use crate::errors::{Error, Result};
use crate::pricing::Drink;

/// Contains the SQL queries used to interact with the database
pub mod sql_queries {
    pub const CREATE_TABLES: &str = "
        CREATE TABLE IF NOT EXISTS products (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL,
            price TEXT NOT NULL,
            image TEXT NOT NULL,
            popular INTEGER NOT NULL DEFAULT 0
        );
        CREATE TABLE IF NOT EXISTS orders (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            phone_number TEXT NOT NULL,
            total TEXT NOT NULL,
            status TEXT NOT NULL,
            delivery_option TEXT NOT NULL,
            address TEXT,
            created_at TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS order_items (
            order_id INTEGER NOT NULL,
            restaurant_id TEXT NOT NULL,
            name TEXT NOT NULL,
            quantity INTEGER NOT NULL,
            unit_price TEXT NOT NULL,
            modifier_cost TEXT NOT NULL,
            line_total TEXT NOT NULL,
            drink TEXT,
            extra_cheese INTEGER NOT NULL,
            is_deal INTEGER NOT NULL
        );";

    pub const INSERT_PRODUCT: &str =
        "INSERT INTO products (id, name, description, price, image, popular) VALUES (?1, ?2, ?3, ?4, ?5, ?6)";
    pub const SELECT_PRODUCTS: &str =
        "SELECT id, name, description, price, image, popular FROM products";
    pub const SELECT_PRODUCT: &str =
        "SELECT id, name, description, price, image, popular FROM products WHERE id = ?1";

    pub const INSERT_ORDER: &str =
        "INSERT INTO orders (id, name, phone_number, total, status, delivery_option, address, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";
    pub const INSERT_ORDER_ITEM: &str =
        "INSERT INTO order_items (order_id, restaurant_id, name, quantity, unit_price, modifier_cost, line_total, drink, extra_cheese, is_deal) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)";
    pub const SELECT_ORDERS: &str =
        "SELECT id, name, phone_number, total, status, delivery_option, address, created_at FROM orders ORDER BY created_at DESC, id DESC";
    pub const SELECT_ORDERS_BY_PHONE: &str =
        "SELECT id, name, phone_number, total, status, delivery_option, address, created_at FROM orders WHERE phone_number = ?1 ORDER BY created_at DESC, id DESC";
    pub const SELECT_ORDER: &str =
        "SELECT id, name, phone_number, total, status, delivery_option, address, created_at FROM orders WHERE id = ?1";
    pub const SELECT_ORDER_ITEMS: &str =
        "SELECT restaurant_id, name, quantity, unit_price, modifier_cost, line_total, drink, extra_cheese, is_deal FROM order_items WHERE order_id = ?1";
    pub const UPDATE_ORDER_STATUS: &str = "UPDATE orders SET status = ?1 WHERE id = ?2";
    pub const MAX_ORDER_ID: &str = "SELECT COALESCE(MAX(id), 0) FROM orders";
}

pub struct SqliteDb {
    conn: Connection,

    /// The ID to assign to the next order. Managed locally because there is no
    /// great way to get the last inserted ID back from SQLite when a single
    /// order spans multiple inserted rows.
    current_id: AtomicU32,
}

impl SqliteDb {
    /// Open (or create) a database at the given path
    pub fn open(path: &str) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(sql_queries::CREATE_TABLES)?;
        let max_id: u32 = conn.query_row(sql_queries::MAX_ORDER_ID, [], |row| row.get(0))?;
        Ok(SqliteDb {
            conn,
            current_id: AtomicU32::new(max_id),
        })
    }

    fn items_for(&self, order_id: u32) -> Result<Vec<OrderItem>> {
        let raw = self
            .conn
            .prepare(sql_queries::SELECT_ORDER_ITEMS)?
            .query_map(params![order_id], map_item_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        raw.into_iter().map(ItemRow::into_item).collect()
    }
}

impl Database for SqliteDb {
    fn new() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn get_products(&self) -> Result<Vec<Product>> {
        let raw = self
            .conn
            .prepare(sql_queries::SELECT_PRODUCTS)?
            .query_map([], map_product_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        raw.into_iter().map(ProductRow::into_product).collect()
    }

    fn get_product(&self, id: &str) -> Result<Product> {
        let row = self
            .conn
            .query_row(sql_queries::SELECT_PRODUCT, params![id], map_product_row)
            .optional()?;
        match row {
            Some(raw) => raw.into_product(),
            None => Err(Error::not_found(format!("Restaurant not found for ID: {}", id))),
        }
    }

    fn insert_product(&mut self, product: &Product) -> Result<()> {
        self.conn.execute(
            sql_queries::INSERT_PRODUCT,
            params![
                product.id,
                product.name,
                product.description,
                product.price.to_string(),
                product.image,
                product.popular,
            ],
        )?;
        Ok(())
    }

    fn insert_order(&mut self, order: NewOrderRecord) -> Result<Order> {
        let id = self.current_id.fetch_add(1, Ordering::SeqCst) + 1;

        let tx = self.conn.transaction()?;
        tx.execute(
            sql_queries::INSERT_ORDER,
            params![
                id,
                order.name,
                order.phone_number,
                order.total.to_string(),
                order.status.as_str(),
                order.delivery_option.as_str(),
                order.address,
                order.created_at.to_rfc3339(),
            ],
        )?;
        insert_items(&tx, id, &order.items)?;
        tx.commit()?;

        Ok(Order {
            id,
            name: order.name,
            phone_number: order.phone_number,
            items: order.items,
            total: order.total,
            status: order.status,
            delivery_option: order.delivery_option,
            address: order.address,
            created_at: order.created_at,
        })
    }

    fn get_orders(&self, phone: Option<&str>) -> Result<Vec<Order>> {
        let raw = match phone {
            Some(phone) => self
                .conn
                .prepare(sql_queries::SELECT_ORDERS_BY_PHONE)?
                .query_map(params![phone], map_order_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
            None => self
                .conn
                .prepare(sql_queries::SELECT_ORDERS)?
                .query_map([], map_order_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
        };

        raw.into_iter()
            .map(|row| {
                let items = self.items_for(row.id)?;
                row.into_order(items)
            })
            .collect()
    }

    fn get_order(&self, order_id: u32) -> Result<Order> {
        let row = self
            .conn
            .query_row(sql_queries::SELECT_ORDER, params![order_id], map_order_row)
            .optional()?;
        match row {
            Some(raw) => {
                let items = self.items_for(raw.id)?;
                raw.into_order(items)
            }
            None => Err(Error::not_found("Order not found")),
        }
    }

    fn update_status(&mut self, order_id: u32, status: OrderStatus) -> Result<Order> {
        let updated = self.conn.execute(
            sql_queries::UPDATE_ORDER_STATUS,
            params![status.as_str(), order_id],
        )?;
        if updated == 0 {
            return Err(Error::not_found("Order not found"));
        }
        self.get_order(order_id)
    }
}

/// Insert the line items of an order inside an open transaction.
/// This exists only to make the borrow checker happy.
fn insert_items(tx: &rusqlite::Transaction, order_id: u32, items: &[OrderItem]) -> Result<()> {
    let mut stmt = tx.prepare(sql_queries::INSERT_ORDER_ITEM)?;
    for item in items {
        stmt.execute(params![
            order_id,
            item.restaurant_id,
            item.name,
            item.quantity,
            item.unit_price.to_string(),
            item.modifier_cost.to_string(),
            item.line_total.to_string(),
            item.drink.map(|d| d.as_str()),
            item.extra_cheese,
            item.is_deal,
        ])?;
    }
    Ok(())
}

// Raw rows are read as plain strings first and decoded in a second step, so
// the query_map closures only ever deal with rusqlite errors.

struct ProductRow {
    id: String,
    name: String,
    description: String,
    price: String,
    image: String,
    popular: bool,
}

fn map_product_row(row: &rusqlite::Row) -> rusqlite::Result<ProductRow> {
    Ok(ProductRow {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        price: row.get(3)?,
        image: row.get(4)?,
        popular: row.get(5)?,
    })
}

impl ProductRow {
    fn into_product(self) -> Result<Product> {
        Ok(Product {
            price: parse_decimal(&self.price)?,
            id: self.id,
            name: self.name,
            description: self.description,
            image: self.image,
            popular: self.popular,
        })
    }
}

struct OrderRow {
    id: u32,
    name: String,
    phone_number: String,
    total: String,
    status: String,
    delivery_option: String,
    address: Option<String>,
    created_at: String,
}

fn map_order_row(row: &rusqlite::Row) -> rusqlite::Result<OrderRow> {
    Ok(OrderRow {
        id: row.get(0)?,
        name: row.get(1)?,
        phone_number: row.get(2)?,
        total: row.get(3)?,
        status: row.get(4)?,
        delivery_option: row.get(5)?,
        address: row.get(6)?,
        created_at: row.get(7)?,
    })
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order> {
        Ok(Order {
            total: parse_decimal(&self.total)?,
            status: OrderStatus::parse(&self.status)
                .map_err(|_| Error::Persistence(format!("corrupt status '{}'", self.status)))?,
            delivery_option: DeliveryOption::parse(&self.delivery_option).map_err(|_| {
                Error::Persistence(format!(
                    "corrupt delivery option '{}'",
                    self.delivery_option
                ))
            })?,
            created_at: parse_timestamp(&self.created_at)?,
            id: self.id,
            name: self.name,
            phone_number: self.phone_number,
            address: self.address,
            items,
        })
    }
}

struct ItemRow {
    restaurant_id: String,
    name: String,
    quantity: u32,
    unit_price: String,
    modifier_cost: String,
    line_total: String,
    drink: Option<String>,
    extra_cheese: bool,
    is_deal: bool,
}

fn map_item_row(row: &rusqlite::Row) -> rusqlite::Result<ItemRow> {
    Ok(ItemRow {
        restaurant_id: row.get(0)?,
        name: row.get(1)?,
        quantity: row.get(2)?,
        unit_price: row.get(3)?,
        modifier_cost: row.get(4)?,
        line_total: row.get(5)?,
        drink: row.get(6)?,
        extra_cheese: row.get(7)?,
        is_deal: row.get(8)?,
    })
}

impl ItemRow {
    fn into_item(self) -> Result<OrderItem> {
        Ok(OrderItem {
            unit_price: parse_decimal(&self.unit_price)?,
            modifier_cost: parse_decimal(&self.modifier_cost)?,
            line_total: parse_decimal(&self.line_total)?,
            drink: self.drink.as_deref().and_then(Drink::parse),
            restaurant_id: self.restaurant_id,
            name: self.name,
            quantity: self.quantity,
            extra_cheese: self.extra_cheese,
            is_deal: self.is_deal,
        })
    }
}

fn parse_decimal(s: &str) -> Result<Decimal> {
    Decimal::from_str(s).map_err(|err| Error::Persistence(format!("corrupt amount '{}': {}", s, err)))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|err| Error::Persistence(format!("corrupt timestamp '{}': {}", s, err)))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::pricing;

    fn product(id: &str, price: &str) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Burger {}", id),
            description: "A burger".to_string(),
            price: Decimal::from_str(price).unwrap(),
            image: "https://example.com/burger.jpg".to_string(),
            popular: false,
        }
    }

    fn record(phone: &str, total: &str) -> NewOrderRecord {
        NewOrderRecord {
            name: "Ada".to_string(),
            phone_number: phone.to_string(),
            items: vec![OrderItem {
                restaurant_id: "p1".to_string(),
                name: "Burger p1".to_string(),
                quantity: 2,
                unit_price: Decimal::from_str("12.99").unwrap(),
                modifier_cost: pricing::modifier_cost(Some(Drink::Cola), true),
                line_total: Decimal::from_str(total).unwrap(),
                drink: Some(Drink::Cola),
                extra_cheese: true,
                is_deal: false,
            }],
            total: Decimal::from_str(total).unwrap(),
            status: OrderStatus::Pending,
            delivery_option: DeliveryOption::Pickup,
            address: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_product_roundtrip() {
        let mut db = SqliteDb::new().unwrap();
        db.insert_product(&product("p1", "12.99")).unwrap();
        db.insert_product(&product("p2", "14.99")).unwrap();

        assert_eq!(db.get_products().unwrap().len(), 2);
        let found = db.get_product("p2").unwrap();
        assert_eq!(found.price, Decimal::from_str("14.99").unwrap());
        assert!(matches!(
            db.get_product("missing"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_order_roundtrip() {
        let mut db = SqliteDb::new().unwrap();
        let saved = db.insert_order(record("0123456789", "32.98")).unwrap();
        assert_eq!(saved.id, 1);
        assert_eq!(saved.status, OrderStatus::Pending);

        let loaded = db.get_order(saved.id).unwrap();
        assert_eq!(loaded.total, Decimal::from_str("32.98").unwrap());
        assert_eq!(loaded.items.len(), 1);
        assert_eq!(loaded.items[0].drink, Some(Drink::Cola));
        assert!(loaded.items[0].extra_cheese);
        assert_eq!(loaded.phone_number, "0123456789");
    }

    #[test]
    fn test_orders_newest_first_and_phone_filter() {
        let mut db = SqliteDb::new().unwrap();
        let first = db.insert_order(record("1111111111", "32.98")).unwrap();
        let second = db.insert_order(record("2222222222", "11.99")).unwrap();
        let third = db.insert_order(record("1111111111", "14.99")).unwrap();

        let all = db.get_orders(None).unwrap();
        assert_eq!(
            all.iter().map(|o| o.id).collect::<Vec<_>>(),
            vec![third.id, second.id, first.id]
        );

        let mine = db.get_orders(Some("1111111111")).unwrap();
        assert_eq!(
            mine.iter().map(|o| o.id).collect::<Vec<_>>(),
            vec![third.id, first.id]
        );
    }

    #[test]
    fn test_update_status() {
        let mut db = SqliteDb::new().unwrap();
        let saved = db.insert_order(record("0123456789", "32.98")).unwrap();

        let updated = db
            .update_status(saved.id, OrderStatus::Confirmed)
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Confirmed);
        assert_eq!(updated.created_at, saved.created_at);

        assert!(matches!(
            db.update_status(999, OrderStatus::Delivered),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_ids_resume_after_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.db");
        let path = path.to_str().unwrap();

        let mut db = SqliteDb::open(path).unwrap();
        let saved = db.insert_order(record("0123456789", "32.98")).unwrap();
        drop(db);

        let mut db = SqliteDb::open(path).unwrap();
        let next = db.insert_order(record("0123456789", "11.99")).unwrap();
        assert_eq!(next.id, saved.id + 1);
    }
}
