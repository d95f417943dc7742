use common::api::{
    DeliveryOption, ErrorBody, NewOrderRequest, Order, OrderEnvelope, OrderStatus, Product,
    StatusUpdate,
};
use common::cart::{CartStore, FileCartStorage, LineItem};
use common::cli::{self, validate_address, CLIError, DEFAULT_ADDRESS};
use common::errors::{Error, Result};
use common::http::{HttpClient, Response};
use common::pricing::Drink;
use common::routes::{order_status, paths};

#[derive(Debug)]
enum Action {
    Menu,
    Add,
    Deal,
    Cart,
    Remove,
    Set,
    Clear,
    Checkout,
    Orders,
    Status,
}

#[derive(Debug)]
struct CLIOptions {
    target: String,
    action: Action,
    args: Vec<String>,
}

fn parse_action(action: &str) -> std::result::Result<Action, CLIError> {
    match action.to_ascii_lowercase().as_str() {
        "menu" => Ok(Action::Menu),
        "add" => Ok(Action::Add),
        "deal" => Ok(Action::Deal),
        "cart" => Ok(Action::Cart),
        "remove" => Ok(Action::Remove),
        "set" => Ok(Action::Set),
        "clear" => Ok(Action::Clear),
        "checkout" => Ok(Action::Checkout),
        "orders" => Ok(Action::Orders),
        "status" => Ok(Action::Status),
        other => Err(CLIError::InvalidParameter(other.to_string())),
    }
}

fn parse_cli_args<I>(mut args: I) -> std::result::Result<CLIOptions, CLIError>
where
    I: Iterator<Item = String>,
{
    args.next().ok_or(CLIError::MissingParameter("argv[0]"))?;
    let maybe_target = args
        .next()
        .ok_or(CLIError::MissingParameter("target or action"))?;

    let (target, action) = match validate_address(&maybe_target) {
        Ok(target) => {
            let action = args
                .next()
                .ok_or(CLIError::MissingParameter("action"))
                .and_then(|a| parse_action(&a))?;
            (target.to_string(), action)
        }
        Err(_) => (DEFAULT_ADDRESS.to_string(), parse_action(&maybe_target)?),
    };

    Ok(CLIOptions {
        target,
        action,
        args: args.collect(),
    })
}

/// Interpret trailing arguments as line item modifiers.
///
/// A drink name selects the drink, `cheese` selects extra cheese, a number
/// sets the quantity. A malformed number counts as 1.
fn parse_modifiers(args: &[String]) -> (Option<Drink>, bool, u32) {
    let mut drink = None;
    let mut extra_cheese = false;
    let mut quantity = 1;
    for arg in args {
        if let Some(d) = Drink::parse(arg) {
            drink = Some(d);
        } else if arg == "cheese" {
            extra_cheese = true;
        } else {
            quantity = arg.parse::<u32>().unwrap_or(1).max(1);
        }
    }
    (drink, extra_cheese, quantity)
}

fn open_cart() -> Result<CartStore<FileCartStorage>> {
    CartStore::new(FileCartStorage::new(cli::cart_path()))
}

/// Print the server's error message verbatim, as the checkout panel would
fn print_error(response: &Response) {
    match serde_json::from_str::<ErrorBody>(&response.body) {
        Ok(body) => eprintln!("Error: {}", body.error),
        Err(_) => eprintln!(
            "Error: unexpected response ({})",
            response.status.unwrap_or(0)
        ),
    }
}

fn fetch_menu(client: &mut HttpClient) -> Result<Vec<Product>> {
    let response = client.send("GET", paths::RESTAURANTS, "")?;
    if response.status != Some(200) {
        print_error(&response);
        return Err(Error::NoResponse);
    }
    Ok(serde_json::from_str(&response.body)?)
}

fn print_cart(cart: &CartStore<FileCartStorage>) {
    if cart.is_empty() {
        println!("Your cart is empty");
        return;
    }
    for item in cart.items() {
        let mut extras = Vec::new();
        if let Some(drink) = item.drink {
            extras.push(drink.as_str().to_string());
        }
        if item.extra_cheese {
            extras.push("extra cheese".to_string());
        }
        let extras = if extras.is_empty() {
            String::new()
        } else {
            format!(" ({})", extras.join(", "))
        };
        println!(
            "{} x{}{} - {}",
            item.name,
            item.quantity,
            extras,
            item.display_total()
        );
    }
    println!("Total: {}", cart.display_total());
}

fn print_order(order: &Order) {
    println!(
        "Order #{} [{}] {} - total {}",
        order.id,
        order.status.as_str(),
        order.created_at.format("%Y-%m-%d %H:%M"),
        order.total
    );
    for item in &order.items {
        println!("  {} x{} - {}", item.name, item.quantity, item.line_total);
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(std::env::args())
        .map_err(|err| Error::validation(err.to_string()))?;

    match options.action {
        Action::Menu => {
            let mut client = HttpClient::new(&options.target)?;
            for product in fetch_menu(&mut client)? {
                println!("{}: {} - {}", product.id, product.name, product.price);
                println!("    {}", product.description);
            }
        }
        Action::Add => {
            let product_id = options
                .args
                .first()
                .ok_or_else(|| Error::validation("Missing parameter 'product id'"))?;
            let (drink, extra_cheese, quantity) = parse_modifiers(&options.args[1..]);

            // Creating a cart entry needs the product's name and price
            let mut client = HttpClient::new(&options.target)?;
            let product = fetch_menu(&mut client)?
                .into_iter()
                .find(|p| &p.id == product_id)
                .ok_or_else(|| {
                    Error::not_found(format!("Restaurant not found for ID: {}", product_id))
                })?;

            let mut cart = open_cart()?;
            cart.add(LineItem {
                product_id: product.id,
                name: product.name,
                unit_price: product.price,
                quantity,
                drink,
                extra_cheese,
                is_bundle: false,
            })?;
            print_cart(&cart);
        }
        Action::Deal => {
            let name = options
                .args
                .first()
                .ok_or_else(|| Error::validation("Missing parameter 'deal name'"))?;
            let price = options
                .args
                .get(1)
                .and_then(|p| p.trim_start_matches('$').parse::<rust_decimal::Decimal>().ok())
                .ok_or_else(|| Error::validation("Missing or invalid parameter 'deal price'"))?;

            let mut cart = open_cart()?;
            cart.add(LineItem {
                product_id: format!("deal-{}", name.to_ascii_lowercase().replace(' ', "-")),
                name: name.clone(),
                unit_price: price,
                quantity: 1,
                drink: None,
                extra_cheese: false,
                is_bundle: true,
            })?;
            print_cart(&cart);
        }
        Action::Cart => print_cart(&open_cart()?),
        Action::Remove => {
            let product_id = options
                .args
                .first()
                .ok_or_else(|| Error::validation("Missing parameter 'product id'"))?;
            let (drink, extra_cheese, _) = parse_modifiers(&options.args[1..]);

            let mut cart = open_cart()?;
            cart.remove_one(product_id, drink, extra_cheese)?;
            print_cart(&cart);
        }
        Action::Set => {
            let product_id = options
                .args
                .first()
                .ok_or_else(|| Error::validation("Missing parameter 'product id'"))?;
            let (drink, extra_cheese, quantity) = parse_modifiers(&options.args[1..]);

            let mut cart = open_cart()?;
            if !cart.set_quantity(product_id, quantity, drink, extra_cheese)? {
                eprintln!("No such item in the cart; use 'add' to add it first");
            }
            print_cart(&cart);
        }
        Action::Clear => {
            let mut cart = open_cart()?;
            cart.clear()?;
            println!("Cart cleared");
        }
        Action::Checkout => {
            let name = options
                .args
                .first()
                .ok_or_else(|| Error::validation("Missing parameter 'name'"))?;
            let phone = options
                .args
                .get(1)
                .ok_or_else(|| Error::validation("Missing parameter 'phone number'"))?;
            let delivery_option = options
                .args
                .get(2)
                .map(|o| DeliveryOption::parse(o))
                .transpose()?
                .unwrap_or(DeliveryOption::Pickup);
            let address = options.args.get(3..).filter(|rest| !rest.is_empty());

            let mut cart = open_cart()?;
            if cart.is_empty() {
                println!("Your cart is empty");
                return Ok(());
            }

            let request = NewOrderRequest {
                name: name.clone(),
                phone_number: phone.clone(),
                cart: cart.to_payload(),
                delivery_option,
                address: address.map(|rest| rest.join(" ")),
            };

            let mut client = HttpClient::new(&options.target)?;
            let response = client.send(
                "POST",
                paths::ORDERS,
                &serde_json::to_string(&request)?,
            )?;

            if response.status == Some(201) {
                let envelope: OrderEnvelope = serde_json::from_str(&response.body)?;
                println!("{}", envelope.message);
                print_order(&envelope.order);
                // The order went through, the cart is done
                cart.clear()?;
            } else {
                print_error(&response);
            }
        }
        Action::Orders => {
            let mut client = HttpClient::new(&options.target)?;
            let path = match options.args.first() {
                Some(phone) => format!("{}?phone={}", paths::ORDERS, phone),
                None => paths::ORDERS.to_string(),
            };
            let response = client.send("GET", &path, "")?;
            if response.status != Some(200) {
                print_error(&response);
                return Ok(());
            }
            let orders: Vec<Order> = serde_json::from_str(&response.body)?;
            if orders.is_empty() {
                println!("No orders");
            }
            for order in &orders {
                print_order(order);
            }
        }
        Action::Status => {
            let order_id = options
                .args
                .first()
                .and_then(|id| id.parse::<u32>().ok())
                .ok_or_else(|| Error::validation("Missing or invalid parameter 'order id'"))?;
            let status = options
                .args
                .get(1)
                .map(|s| OrderStatus::parse(s))
                .transpose()?
                .ok_or_else(|| Error::validation("Missing parameter 'status'"))?;

            let mut client = HttpClient::new(&options.target)?;
            let body = serde_json::to_string(&StatusUpdate { status })?;
            let response = client.send("PATCH", &order_status(order_id), &body)?;
            if response.status == Some(200) {
                let envelope: OrderEnvelope = serde_json::from_str(&response.body)?;
                println!("{}", envelope.message);
                print_order(&envelope.order);
            } else {
                print_error(&response);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn opts(args: &[&str]) -> std::result::Result<CLIOptions, CLIError> {
        parse_cli_args(
            std::iter::once("client".to_string()).chain(args.iter().map(|s| s.to_string())),
        )
    }

    #[test]
    fn test_parse_action_with_default_target() {
        let options = opts(&["menu"]).unwrap();
        assert_eq!(options.target, DEFAULT_ADDRESS);
        assert!(matches!(options.action, Action::Menu));
    }

    #[test]
    fn test_parse_explicit_target() {
        let options = opts(&["10.0.0.1:8000", "orders", "0123456789"]).unwrap();
        assert_eq!(options.target, "10.0.0.1:8000");
        assert!(matches!(options.action, Action::Orders));
        assert_eq!(options.args, vec!["0123456789"]);
    }

    #[test]
    fn test_parse_rejects_unknown_action() {
        assert!(opts(&["teleport"]).is_err());
        assert!(opts(&[]).is_err());
    }

    #[test]
    fn test_parse_modifiers() {
        let args: Vec<String> = vec!["cola".to_string(), "cheese".to_string(), "3".to_string()];
        assert_eq!(parse_modifiers(&args), (Some(Drink::Cola), true, 3));

        // Malformed quantities fall back to 1
        let args: Vec<String> = vec!["many".to_string()];
        assert_eq!(parse_modifiers(&args), (None, false, 1));

        assert_eq!(parse_modifiers(&[]), (None, false, 1));
    }
}
