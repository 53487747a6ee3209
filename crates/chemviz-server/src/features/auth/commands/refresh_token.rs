use chemviz_common::types::AccessToken;
use serde::{Deserialize, Serialize};

use crate::auth::{AuthError, TokenService};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenCommand {
    #[serde(default)]
    pub refresh: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RefreshTokenError {
    #[error("Refresh token is required")]
    RefreshRequired,
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl RefreshTokenCommand {
    pub fn validate(&self) -> Result<(), RefreshTokenError> {
        if self.refresh.trim().is_empty() {
            return Err(RefreshTokenError::RefreshRequired);
        }
        Ok(())
    }
}

#[tracing::instrument(skip(tokens, command))]
pub async fn handle(
    tokens: TokenService,
    command: RefreshTokenCommand,
) -> Result<AccessToken, RefreshTokenError> {
    command.validate()?;
    let access = tokens.refresh(command.refresh.trim()).await?;
    Ok(AccessToken { access })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation() {
        let empty = RefreshTokenCommand {
            refresh: String::new(),
        };
        assert!(matches!(empty.validate(), Err(RefreshTokenError::RefreshRequired)));

        let ok = RefreshTokenCommand {
            refresh: "abc".to_string(),
        };
        assert!(ok.validate().is_ok());
    }
}
