//! Order pricing, validation and catalog operations.
//!
//! This is the authoritative side of the application: whatever prices a client
//! computed for display, totals are recomputed here from the catalog before an
//! order is persisted. Validation runs to completion before any persistence
//! attempt, so a rejected order never partially commits.

use std::str::FromStr;

use chrono::Utc;
use rand::Rng;
use rust_decimal::Decimal;
use tracing::info;

use crate::api::{
    DeliveryOption, NewOrderRequest, NewProduct, Order, OrderItem, OrderStatus, Product,
};
use crate::database::{with_retries, Database, NewOrderRecord};
use crate::errors::{Error, Result};
use crate::pricing;

/// Attempts made against the store for each persistence call
const STORAGE_ATTEMPTS: u32 = 3;

/// Image assigned to products created through the API
const DEFAULT_PRODUCT_IMAGE: &str =
    "https://images.unsplash.com/photo-1568901346375-23c9450c58cd?q=80&w=400&h=300&auto=format&fit=crop&ixlib=rb-4.0.3";

/// Price a submitted cart, validate it and persist the resulting order.
///
/// Catalog items are re-priced from the catalog; deals (fixed-price bundles)
/// keep their embedded price. A single unresolvable product aborts the whole
/// order.
pub fn place_order(db: &mut dyn Database, request: &NewOrderRequest) -> Result<Order> {
    if request.name.trim().is_empty() {
        return Err(Error::validation("Name is required"));
    }
    if request.phone_number.trim().is_empty() {
        return Err(Error::validation("Phone number is required"));
    }
    if request.cart.is_empty() {
        return Err(Error::validation(
            "Cart is required with at least one item",
        ));
    }
    let address = match request.delivery_option {
        DeliveryOption::Delivery => {
            let address = request
                .address
                .as_deref()
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .ok_or_else(|| Error::validation("Address is required for delivery orders"))?;
            Some(address.to_string())
        }
        DeliveryOption::Pickup => None,
    };

    let mut items = Vec::with_capacity(request.cart.len());
    for item in &request.cart {
        let quantity = match item.quantity {
            Some(quantity) if quantity >= 1 => quantity,
            _ => {
                return Err(Error::validation(
                    "Each cart item must have a valid restaurantId and quantity (minimum 1)",
                ))
            }
        };
        let product_id = item
            .restaurant_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                Error::validation(
                    "Each cart item must have a valid restaurantId and quantity (minimum 1)",
                )
            })?;

        // Deals carry their agreed price; everything else is re-priced from
        // the catalog and any client-supplied price is ignored.
        let (name, unit_price, is_deal) = if item.is_deal.unwrap_or(false) {
            let name = item
                .name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .ok_or_else(|| Error::validation("Deal items must include a name and price"))?;
            let price = item
                .price
                .ok_or_else(|| Error::validation("Deal items must include a name and price"))?;
            (name.to_string(), price, true)
        } else {
            let product = db.get_product(product_id)?;
            (product.name, product.price, false)
        };

        let drink = item.drink;
        let extra_cheese = item.extra_cheese.unwrap_or(false);
        items.push(OrderItem {
            restaurant_id: product_id.to_string(),
            name,
            quantity,
            unit_price,
            modifier_cost: pricing::modifier_cost(drink, extra_cheese),
            line_total: pricing::line_total(unit_price, drink, extra_cheese, quantity),
            drink,
            extra_cheese,
            is_deal,
        });
    }

    let record = NewOrderRecord {
        name: request.name.trim().to_string(),
        phone_number: request.phone_number.trim().to_string(),
        total: pricing::order_total(items.iter().map(|i| i.line_total)),
        items,
        status: OrderStatus::Pending,
        delivery_option: request.delivery_option,
        address,
        created_at: Utc::now(),
    };

    let order = with_retries(STORAGE_ATTEMPTS, || db.insert_order(record.clone()))?;
    info!(order_id = order.id, total = %order.total, "order placed");
    Ok(order)
}

/// All orders, newest first, optionally scoped to one customer phone number
pub fn get_orders(db: &dyn Database, phone: Option<&str>) -> Result<Vec<Order>> {
    with_retries(STORAGE_ATTEMPTS, || db.get_orders(phone))
}

/// Overwrite the status of an order.
///
/// Any status may replace any other; there is deliberately no transition
/// table (see DESIGN.md).
pub fn update_status(db: &mut dyn Database, order_id: u32, status: OrderStatus) -> Result<Order> {
    let order = with_retries(STORAGE_ATTEMPTS, || db.update_status(order_id, status))?;
    info!(order_id, status = status.as_str(), "order status updated");
    Ok(order)
}

/// The full product catalog
pub fn get_products(db: &dyn Database) -> Result<Vec<Product>> {
    with_retries(STORAGE_ATTEMPTS, || db.get_products())
}

/// Create a catalog product from operator input.
///
/// The price is accepted as text with an optional leading `$` and thousands
/// separators, matching what gets pasted into the admin form.
pub fn add_product(db: &mut dyn Database, new: &NewProduct) -> Result<Product> {
    if new.name.trim().is_empty() || new.description.trim().is_empty() {
        return Err(Error::validation(
            "Name, description, and price are required",
        ));
    }
    let cleaned = new.price.trim().replace('$', "").replace(',', "");
    let price = Decimal::from_str(&cleaned)
        .ok()
        .filter(|p| *p > Decimal::ZERO)
        .ok_or_else(|| Error::validation("Invalid price format"))?;

    let product = Product {
        id: generate_product_id(),
        name: new.name.trim().to_string(),
        description: new.description.trim().to_string(),
        price: price.round_dp(2),
        image: DEFAULT_PRODUCT_IMAGE.to_string(),
        popular: new.popular,
    };
    with_retries(STORAGE_ATTEMPTS, || db.insert_product(&product))?;
    info!(product_id = %product.id, "product added to catalog");
    Ok(product)
}

/// Fill an empty catalog with the standard menu. Returns how many products
/// were inserted; a non-empty catalog is left untouched.
pub fn seed_catalog(db: &mut dyn Database) -> Result<usize> {
    if !get_products(db)?.is_empty() {
        return Ok(0);
    }
    let menu = [
        ("Classic Cheese", "Beef patty, cheddar, pickles and house sauce", "12.99"),
        ("BBQ Bacon", "Beef patty, bacon, crispy onions and BBQ sauce", "14.99"),
        ("Mushroom Swiss", "Beef patty, swiss cheese and roasted mushrooms", "13.99"),
        ("Spicy Jalapeño", "Beef patty, jalapeños, pepper jack and chipotle mayo", "15.99"),
        ("Veggie Delight", "Veggie patty, lettuce, tomato and herb dressing", "11.99"),
        ("Double Decker", "Double patty, double cheese, the works", "16.99"),
        ("Cheeseburger", "Cheeseburger with fries on the side", "10.99"),
    ];
    for (name, description, price) in &menu {
        let product = Product {
            id: generate_product_id(),
            name: (*name).to_string(),
            description: (*description).to_string(),
            price: Decimal::from_str(price)
                .map_err(|err| Error::Persistence(format!("bad seed price: {}", err)))?,
            image: DEFAULT_PRODUCT_IMAGE.to_string(),
            popular: true,
        };
        db.insert_product(&product)?;
    }
    info!(count = menu.len(), "seeded product catalog");
    Ok(menu.len())
}

/// 12 random bytes, hex encoded
fn generate_product_id() -> String {
    let bytes: [u8; 12] = rand::thread_rng().gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
