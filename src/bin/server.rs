use std::sync::{Arc, Mutex};

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use common::cli;
use common::database::{Database, SqliteDb};
use common::endpoints::create_http_router;
use common::errors::{Error, Result};
use common::http::{HttpServer, Response};
use common::orders;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run() {
        error!(error = %err, "server failed to start");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let addr = cli::server_address().map_err(|err| Error::validation(err.to_string()))?;

    let mut db = match std::env::var(cli::DB_ENV) {
        Ok(path) => {
            info!(path = %path, "opening database");
            SqliteDb::open(&path)?
        }
        Err(_) => {
            info!("no database path configured, orders will not survive a restart");
            SqliteDb::new()?
        }
    };
    orders::seed_catalog(&mut db)?;

    let router = Arc::new(create_http_router()?);
    let db = Arc::new(Mutex::new(db));

    let server = HttpServer::new(&addr)?;
    info!(addr = %addr, "listening");

    server.serve(move |request| {
        let mut db = match db.lock() {
            Ok(guard) => guard,
            Err(_) => {
                return Response::from_error(&Error::Persistence(
                    "database lock poisoned".to_string(),
                ))
            }
        };
        match router.route(request, &mut *db) {
            Ok(response) => response,
            Err(err) => Response::from_error(&err),
        }
    });

    Ok(())
}
