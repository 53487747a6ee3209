use chemviz_common::types::TokenPair;
use serde::{Deserialize, Serialize};

use crate::auth::{AuthError, TokenService};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObtainTokenCommand {
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ObtainTokenError {
    #[error("Username is required and cannot be empty")]
    UsernameRequired,
    #[error("Password is required and cannot be empty")]
    PasswordRequired,
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl ObtainTokenCommand {
    pub fn validate(&self) -> Result<(), ObtainTokenError> {
        if self.username.trim().is_empty() {
            return Err(ObtainTokenError::UsernameRequired);
        }
        if self.password.is_empty() {
            return Err(ObtainTokenError::PasswordRequired);
        }
        Ok(())
    }
}

#[tracing::instrument(skip(tokens, command), fields(username = %command.username))]
pub async fn handle(
    tokens: TokenService,
    command: ObtainTokenCommand,
) -> Result<TokenPair, ObtainTokenError> {
    command.validate()?;
    Ok(tokens.issue(&command.username, &command.password).await?)
}
