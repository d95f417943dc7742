// This file contains the basic types used to communicate through the API
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};
use crate::pricing::Drink;

/// A catalog product, as stored and returned by the API.
///
/// The `price` here is the authoritative one. Whatever price a client sends
/// along with a cart item is ignored for catalog products.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique ID, generated by the server on creation
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image: String,
    #[serde(default)]
    pub popular: bool,
}

/// Body of a product creation request
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    /// Price as entered by an operator; a leading `$` is tolerated
    pub price: String,
    #[serde(default)]
    pub popular: bool,
}

/// One entry of a submitted cart.
///
/// Everything except the quantity is optional at the wire level; the service
/// decides what is actually required (bundles must carry their own name and
/// price, catalog items only need a resolvable id).
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct CartItemPayload {
    #[serde(default)]
    pub restaurant_id: Option<String>,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub drink: Option<Drink>,
    #[serde(default)]
    pub extra_cheese: Option<bool>,
    #[serde(default)]
    pub is_deal: Option<bool>,
    #[serde(default)]
    pub name: Option<String>,
    /// Advisory only, except for deals where it is the agreed bundle price
    #[serde(default)]
    pub price: Option<Decimal>,
}

/// Body of a new order request
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderRequest {
    pub name: String,
    pub phone_number: String,
    pub cart: Vec<CartItemPayload>,
    pub delivery_option: DeliveryOption,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryOption {
    Delivery,
    Pickup,
}

impl DeliveryOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryOption::Delivery => "delivery",
            DeliveryOption::Pickup => "pickup",
        }
    }

    pub fn parse(s: &str) -> Result<DeliveryOption> {
        match s {
            "delivery" => Ok(DeliveryOption::Delivery),
            "pickup" => Ok(DeliveryOption::Pickup),
            other => Err(Error::validation(format!(
                "Invalid delivery option: {}",
                other
            ))),
        }
    }
}

/// Lifecycle states of an order. New orders always start as `Pending`.
///
/// Any status may move to any other status; there is deliberately no
/// transition table (see DESIGN.md).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Result<OrderStatus> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(Error::validation(format!("Invalid status: {}", other))),
        }
    }
}

/// A fully resolved order line, with server-computed prices
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub restaurant_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub modifier_cost: Decimal,
    pub line_total: Decimal,
    #[serde(default)]
    pub drink: Option<Drink>,
    #[serde(default)]
    pub extra_cheese: bool,
    #[serde(default)]
    pub is_deal: bool,
}

/// A persisted order, as returned by the API
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Unique ID, given by the server on creation
    pub id: u32,
    pub name: String,
    pub phone_number: String,
    pub items: Vec<OrderItem>,
    pub total: Decimal,
    pub status: OrderStatus,
    pub delivery_option: DeliveryOption,
    #[serde(default)]
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Body of a status update request
#[derive(Serialize, Deserialize, Debug)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

/// Envelope for successful order creation and status updates
#[derive(Serialize, Deserialize, Debug)]
pub struct OrderEnvelope {
    pub message: String,
    pub order: Order,
}

/// Body of every error response
#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_order_request_wire_format() {
        let json = r#"{
            "name": "Ada",
            "phoneNumber": "0123456789",
            "cart": [
                {"restaurantId": "p1", "quantity": 2, "drink": "cola", "extraCheese": true},
                {"restaurantId": "deal-family", "quantity": 1, "isDeal": true,
                 "name": "Family Feast", "price": "39.99"}
            ],
            "deliveryOption": "delivery",
            "address": "1 Main St"
        }"#;
        let req: NewOrderRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.cart.len(), 2);
        assert_eq!(req.cart[0].drink, Some(Drink::Cola));
        assert_eq!(req.cart[0].extra_cheese, Some(true));
        assert_eq!(req.cart[1].is_deal, Some(true));
        assert_eq!(req.delivery_option, DeliveryOption::Delivery);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(OrderStatus::parse("pending").unwrap(), OrderStatus::Pending);
        assert_eq!(
            OrderStatus::parse("cancelled").unwrap(),
            OrderStatus::Cancelled
        );
        assert!(OrderStatus::parse("shipped").is_err());
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()).unwrap(), status);
        }
    }
}
