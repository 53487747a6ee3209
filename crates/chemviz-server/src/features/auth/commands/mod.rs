//! Token commands

pub mod obtain_token;
pub mod refresh_token;

pub use obtain_token::{ObtainTokenCommand, ObtainTokenError};
pub use refresh_token::{RefreshTokenCommand, RefreshTokenError};
