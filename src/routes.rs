use std::collections::HashMap;

use crate::database::Database;
use crate::errors::{Error, Result};
use crate::http::{Request, Response};
use matchit::Router;

/// Utility macro generating a constant for the HTTP endpoint, and associate it
/// with an identifier. Matchit requires both
macro_rules! make_paths {
        ($($name:ident: $path:expr,)*) => {

        pub mod paths {
                    $(
                        pub const $name: &str = $path;
                    )*
        }
        pub mod endpoints {
            $(
                pub const $name: &str = stringify!($name);
            )*
        }

        }
    }

make_paths! {
    RESTAURANTS: "/restaurants",
    ORDERS: "/orders",
    ORDER_STATUS: "/orders/{order_id}/status",
}

/// Utility to add a list of paths to the router automatically
macro_rules! add_path{
    ($router:ident $(, $path:ident)*) => {
        $(
            $router.insert(paths::$path, endpoints::$path)?;
        )*
    }
}

/// Names of the parameters passed to handlers, either extracted from the HTTP
/// path or from the query string
pub mod params {
    /// Key of order ids in HTTP paths
    pub const ORDER_ID: &str = "order_id";

    /// Key of the optional phone filter on order listings
    pub const PHONE: &str = "phone";
}

/// Return the HTTP path for an order status update based on the order id
pub fn order_status(order_id: u32) -> String {
    paths::ORDER_STATUS.replace("{order_id}", &order_id.to_string())
}

// spurious warning, I am using this in tests
#[allow(unused_macros)]
/// Utility to create easily hashmaps of parameters for testing
macro_rules! make_params {
    () => {
        std::collections::HashMap::new()
    };
    ($name:ident: $value:expr $(, $name2:ident: $value2:expr)* ) => {
        {
            let mut map = std::collections::HashMap::new();
            map.insert(params::$name.to_string(), $value.to_string());
            $(
                map.insert(params::$name2.to_string(), $value2.to_string());
            )*
            map
        }
        }
    }

#[allow(unused_imports)]
pub(crate) use make_params;

/// Create a new router with the paths defined in this module
///
/// Errors from this functions are programming errors, most likely steming from
/// a misuse of matchit
fn new_router() -> Result<Router<&'static str>> {
    let mut router = Router::new();
    add_path!(router, RESTAURANTS, ORDERS, ORDER_STATUS);
    Ok(router)
}

/// Split a request path into its route part and its query parameters.
///
/// Keys and values are taken as-is; nothing in this API needs percent
/// decoding.
fn split_query(path: &str) -> (&str, Vec<(String, String)>) {
    let Some((route, query)) = path.split_once('?') else {
        return (path, Vec::new());
    };
    let pairs = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect();
    (route, pairs)
}

/// Type of the object containing the HTTP path parameters passed to handlers
pub type HttpParams = HashMap<String, String>;
/// Type of the function that handles HTTP requests
pub type HttpHandler = fn(Request, HttpParams, &mut dyn Database) -> Result<Response>;

/// The router is in charge of taking in raw HTTP requests and to dispatch them
/// to the appropriate handler function.
pub struct HttpRouter {
    routes: Router<&'static str>,
    handlers: HashMap<&'static str, HashMap<&'static str, HttpHandler>>,
}

impl HttpRouter {
    /// Creates a new empty router
    ///
    /// Although the matchit router is not empty, there are no methods
    /// associated to the routes yet, so no request can be processed.
    /// Errors in this function are programming errors.
    pub fn new() -> Result<Self> {
        let routes = new_router()?;
        Ok(HttpRouter {
            routes,
            handlers: HashMap::new(),
        })
    }

    /// Add a new route to the router
    pub fn add_route(&mut self, method: &'static str, route: &'static str, handler: HttpHandler) {
        let method_to_handler = self.handlers.entry(route).or_default();
        method_to_handler.insert(method, handler);
    }

    /// Sends a request to the appropriate handler if it exists
    ///
    /// The query string is stripped from the path before matching; query
    /// parameters and path parameters end up merged in the same map handed to
    /// the handler. If no route is defined for this request, return a NotFound
    /// error.
    ///
    /// Checking that all parameters are presents and that the body is correct
    /// is the responsibility of the handler
    pub fn route(&self, request: Request, db: &mut dyn Database) -> Result<Response> {
        let (path, query) = split_query(&request.path);
        let route = self
            .routes
            .at(path)
            .map_err(|err| Error::not_found(err.to_string()))?;
        let method_to_handler = self.handlers.get(route.value).ok_or_else(|| {
            Error::not_found(format!(
                "No method associated to this route: {}",
                route.value
            ))
        })?;
        let handler = method_to_handler
            .get(request.method.as_str())
            .ok_or_else(|| {
                Error::not_found(format!(
                    "No handler for {} {}",
                    request.method.as_str(),
                    route.value
                ))
            })?;

        let mut params: HashMap<String, String> = route
            .params
            .iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        params.extend(query);
        handler(request, params, db)
    }
}
