use regex::Regex;

/// Default address for both the client and the server
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:9898";

/// Environment variable overriding the listen/connect address
pub const ADDRESS_ENV: &str = "BURGERBITE_ADDR";

/// Environment variable pointing the server at a SQLite file. Unset means an
/// in-memory database that disappears with the process.
pub const DB_ENV: &str = "BURGERBITE_DB";

/// Environment variable overriding where the client keeps its cart snapshot
pub const CART_ENV: &str = "BURGERBITE_CART";

/// Default location of the cart snapshot
pub const DEFAULT_CART_PATH: &str = "burgerbite-cart.json";

/// Errors that can occur when parsing the command line arguments
#[derive(Debug, Clone)]
pub enum CLIError {
    InvalidAddressFormat,
    MissingParameter(&'static str),
    InvalidParameter(String),
}

impl std::fmt::Display for CLIError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            CLIError::InvalidAddressFormat => {
                write!(f, "Invalid target format. Should be <host>:<port>")
            }
            CLIError::MissingParameter(missing) => write!(f, "Missing parameter '{}'", missing),
            CLIError::InvalidParameter(param) => write!(f, "Invalid parameter '{}'", param),
        }
    }
}

impl std::error::Error for CLIError {}

/// Validate the format of the TCP address provided by the user
///
/// Returns its input if the address is in the format <host>:<port>, otherwise
/// InvalidAddressFormat
pub fn validate_address(addr: &str) -> std::result::Result<&str, CLIError> {
    let re = Regex::new(r"^[a-zA-Z0-9\.\-]+:\d{1,5}$").map_err(|_| CLIError::InvalidAddressFormat)?;
    if re.is_match(addr) {
        Ok(addr)
    } else {
        Err(CLIError::InvalidAddressFormat)
    }
}

/// The address to listen on / connect to, from the environment or the default
pub fn server_address() -> std::result::Result<String, CLIError> {
    match std::env::var(ADDRESS_ENV) {
        Ok(addr) => validate_address(&addr).map(str::to_string),
        Err(_) => Ok(DEFAULT_ADDRESS.to_string()),
    }
}

/// Where the client persists its cart snapshot
pub fn cart_path() -> String {
    std::env::var(CART_ENV).unwrap_or_else(|_| DEFAULT_CART_PATH.to_string())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_validate_address() {
        assert!(validate_address("127.0.0.1:9898").is_ok());
        assert!(validate_address("burgerbite.local:80").is_ok());
        assert!(validate_address("127.0.0.1").is_err());
        assert!(validate_address("127.0.0.1:notaport").is_err());
        assert!(validate_address("http://127.0.0.1:80").is_err());
    }
}
