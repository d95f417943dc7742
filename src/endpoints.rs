//! HTTP handlers, glueing the router to the order and catalog operations.
//!
//! Handlers parse the request body, delegate to [`crate::orders`] and
//! serialize the result. Error-to-status mapping happens in one place, when
//! the server turns a handler error into a response.

use crate::api::{NewOrderRequest, NewProduct, OrderEnvelope, StatusUpdate};
use crate::database::Database;
use crate::errors::{Error, Result};
use crate::http::{Request, Response};
use crate::orders;
use crate::routes::{endpoints, params, HttpParams, HttpRouter};

/// Build the application router with every endpoint wired in
pub fn create_http_router() -> Result<HttpRouter> {
    let mut router = HttpRouter::new()?;

    router.add_route("GET", endpoints::RESTAURANTS, get_restaurants);
    router.add_route("POST", endpoints::RESTAURANTS, add_restaurant);
    router.add_route("POST", endpoints::ORDERS, place_order);
    router.add_route("GET", endpoints::ORDERS, get_orders);
    router.add_route("PATCH", endpoints::ORDER_STATUS, update_order_status);

    Ok(router)
}

fn get_restaurants(_: Request, _: HttpParams, db: &mut dyn Database) -> Result<Response> {
    let products = orders::get_products(db)?;
    Response::json(200, &products)
}

fn add_restaurant(request: Request, _: HttpParams, db: &mut dyn Database) -> Result<Response> {
    let new: NewProduct = serde_json::from_str(&request.body)?;
    let product = orders::add_product(db, &new)?;
    Response::json(201, &product)
}

fn place_order(request: Request, _: HttpParams, db: &mut dyn Database) -> Result<Response> {
    let order_request: NewOrderRequest = serde_json::from_str(&request.body)?;
    let order = orders::place_order(db, &order_request)?;
    Response::json(
        201,
        &OrderEnvelope {
            message: "Order placed successfully".to_string(),
            order,
        },
    )
}

fn get_orders(_: Request, http_params: HttpParams, db: &mut dyn Database) -> Result<Response> {
    let phone = http_params.get(params::PHONE).map(String::as_str);
    let orders = orders::get_orders(db, phone)?;
    Response::json(200, &orders)
}

fn update_order_status(
    request: Request,
    http_params: HttpParams,
    db: &mut dyn Database,
) -> Result<Response> {
    let order_id = http_params
        .get(params::ORDER_ID)
        .and_then(|id| id.parse::<u32>().ok())
        .ok_or_else(|| Error::validation("Invalid order id"))?;
    let update: StatusUpdate = serde_json::from_str(&request.body)?;
    let order = orders::update_status(db, order_id, update.status)?;
    Response::json(
        200,
        &OrderEnvelope {
            message: "Order status updated".to_string(),
            order,
        },
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    use crate::api::{Order, OrderStatus, Product};
    use crate::database::MockDb;
    use crate::routes::{order_status, paths};

    fn db_with_catalog() -> MockDb {
        let mut db = MockDb::new().unwrap();
        db.insert_product(&Product {
            id: "p1".to_string(),
            name: "Classic Cheese".to_string(),
            description: "Beef patty, cheddar".to_string(),
            price: Decimal::from_str("12.99").unwrap(),
            image: "img".to_string(),
            popular: true,
        })
        .unwrap();
        db
    }

    fn order_body(phone: &str) -> String {
        format!(
            r#"{{"name": "Ada", "phoneNumber": "{}",
                "cart": [{{"restaurantId": "p1", "quantity": 2, "drink": "cola", "extraCheese": true}}],
                "deliveryOption": "pickup"}}"#,
            phone
        )
    }

    #[test]
    fn test_place_and_list_orders() {
        let mut db = db_with_catalog();
        let router = create_http_router().unwrap();

        let response = router
            .route(
                Request::post(paths::ORDERS, order_body("0123456789")),
                &mut db,
            )
            .unwrap();
        assert_eq!(response.status, Some(201));
        let envelope: OrderEnvelope = serde_json::from_str(&response.body).unwrap();
        assert_eq!(envelope.message, "Order placed successfully");
        assert_eq!(
            envelope.order.total,
            Decimal::from_str("32.98").unwrap()
        );

        let response = router.route(Request::get(paths::ORDERS), &mut db).unwrap();
        let orders: Vec<Order> = serde_json::from_str(&response.body).unwrap();
        assert_eq!(orders.len(), 1);
    }

    #[test]
    fn test_orders_filtered_by_phone() {
        let mut db = db_with_catalog();
        let router = create_http_router().unwrap();

        router
            .route(
                Request::post(paths::ORDERS, order_body("1111111111")),
                &mut db,
            )
            .unwrap();
        router
            .route(
                Request::post(paths::ORDERS, order_body("2222222222")),
                &mut db,
            )
            .unwrap();

        let response = router
            .route(Request::get("/orders?phone=1111111111"), &mut db)
            .unwrap();
        let orders: Vec<Order> = serde_json::from_str(&response.body).unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].phone_number, "1111111111");
    }

    #[test]
    fn test_place_order_rejects_malformed_body() {
        let mut db = db_with_catalog();
        let router = create_http_router().unwrap();

        let result = router.route(
            Request::post(paths::ORDERS, "not json".to_string()),
            &mut db,
        );
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_place_order_unknown_product_is_not_found() {
        let mut db = db_with_catalog();
        let router = create_http_router().unwrap();

        let body = r#"{"name": "Ada", "phoneNumber": "0123456789",
            "cart": [{"restaurantId": "ghost", "quantity": 1}],
            "deliveryOption": "pickup"}"#;
        let result = router.route(Request::post(paths::ORDERS, body.to_string()), &mut db);
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_status_update_endpoint() {
        let mut db = db_with_catalog();
        let router = create_http_router().unwrap();

        let response = router
            .route(
                Request::post(paths::ORDERS, order_body("0123456789")),
                &mut db,
            )
            .unwrap();
        let envelope: OrderEnvelope = serde_json::from_str(&response.body).unwrap();

        let response = router
            .route(
                Request::patch(
                    &order_status(envelope.order.id),
                    r#"{"status": "confirmed"}"#.to_string(),
                ),
                &mut db,
            )
            .unwrap();
        assert_eq!(response.status, Some(200));
        let envelope: OrderEnvelope = serde_json::from_str(&response.body).unwrap();
        assert_eq!(envelope.order.status, OrderStatus::Confirmed);

        let result = router.route(
            Request::patch(&order_status(999), r#"{"status": "confirmed"}"#.to_string()),
            &mut db,
        );
        assert!(matches!(result, Err(Error::NotFound(_))));

        let result = router.route(
            Request::patch(
                &order_status(envelope.order.id),
                r#"{"status": "shipped"}"#.to_string(),
            ),
            &mut db,
        );
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_catalog_endpoints() {
        let mut db = MockDb::new().unwrap();
        let router = create_http_router().unwrap();

        let body = r#"{"name": "Smash Burger", "description": "Crispy edges", "price": "$9.99"}"#;
        let response = router
            .route(
                Request::post(paths::RESTAURANTS, body.to_string()),
                &mut db,
            )
            .unwrap();
        assert_eq!(response.status, Some(201));
        let product: Product = serde_json::from_str(&response.body).unwrap();
        assert_eq!(product.price, Decimal::from_str("9.99").unwrap());

        let response = router
            .route(Request::get(paths::RESTAURANTS), &mut db)
            .unwrap();
        let products: Vec<Product> = serde_json::from_str(&response.body).unwrap();
        assert_eq!(products.len(), 1);
    }
}
