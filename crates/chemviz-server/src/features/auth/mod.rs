//! Token feature: obtain a token pair, refresh the access token

pub mod commands;
pub mod routes;

pub use routes::auth_routes;
