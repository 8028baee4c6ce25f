pub mod config;
pub mod error;
pub mod state;
pub mod router;
pub mod openapi;
pub mod middleware;
pub mod handlers;
pub mod routes;
