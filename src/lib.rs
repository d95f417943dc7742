pub mod api;
pub mod cart;
pub mod cli;
pub mod database;
pub mod endpoints;
pub mod errors;
pub mod http;
pub mod orders;
pub mod pricing;
pub mod routes;
pub mod threadpool;
