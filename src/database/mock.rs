use crate::api::{Order, OrderStatus, Product};
use crate::database::{Database, NewOrderRecord};
use crate::errors::{Error, Result};

/// Vector-backed database for unit tests
#[derive(Default)]
pub struct MockDb {
    products: Vec<Product>,
    orders: Vec<Order>,
    next_id: u32,
}

impl Database for MockDb {
    fn new() -> Result<Self> {
        Ok(MockDb::default())
    }

    fn get_products(&self) -> Result<Vec<Product>> {
        Ok(self.products.clone())
    }

    fn get_product(&self, id: &str) -> Result<Product> {
        self.products
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("Restaurant not found for ID: {}", id)))
    }

    fn insert_product(&mut self, product: &Product) -> Result<()> {
        self.products.push(product.clone());
        Ok(())
    }

    fn insert_order(&mut self, order: NewOrderRecord) -> Result<Order> {
        self.next_id += 1;
        let order = Order {
            id: self.next_id,
            name: order.name,
            phone_number: order.phone_number,
            items: order.items,
            total: order.total,
            status: order.status,
            delivery_option: order.delivery_option,
            address: order.address,
            created_at: order.created_at,
        };
        self.orders.push(order.clone());
        Ok(order)
    }

    fn get_orders(&self, phone: Option<&str>) -> Result<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|o| phone.map_or(true, |p| o.phone_number == p))
            .cloned()
            .collect();
        orders.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(orders)
    }

    fn get_order(&self, order_id: u32) -> Result<Order> {
        self.orders
            .iter()
            .find(|o| o.id == order_id)
            .cloned()
            .ok_or_else(|| Error::not_found("Order not found"))
    }

    fn update_status(&mut self, order_id: u32, status: OrderStatus) -> Result<Order> {
        let order = self
            .orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or_else(|| Error::not_found("Order not found"))?;
        order.status = status;
        Ok(order.clone())
    }
}
