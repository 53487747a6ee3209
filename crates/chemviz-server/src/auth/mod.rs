//! Token issuing, refresh and validation
//!
//! Tokens are opaque UUIDv4 strings held in memory. An access token is short
//! lived; the refresh token outlives it and can mint new access tokens until
//! it expires itself. Restarting the server invalidates every token.

use chemviz_common::types::TokenPair;
use chrono::{DateTime, Duration, Utc};
use std::{collections::HashMap, sync::Arc};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::AuthConfig;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("No active account found with the given credentials")]
    InvalidCredentials,
    #[error("Authentication credentials were not provided")]
    MissingToken,
    #[error("Token is invalid or expired")]
    InvalidToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone)]
struct TokenEntry {
    kind: TokenKind,
    username: String,
    expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct TokenService {
    username: String,
    password: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
    tokens: Arc<RwLock<HashMap<String, TokenEntry>>>,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("username", &self.username)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            username: config.username.clone(),
            password: config.password.clone(),
            access_ttl: Duration::seconds(config.access_ttl_secs as i64),
            refresh_ttl: Duration::seconds(config.refresh_ttl_secs as i64),
            tokens: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Exchange credentials for an access/refresh pair
    pub async fn issue(&self, username: &str, password: &str) -> Result<TokenPair, AuthError> {
        if username != self.username || password != self.password {
            tracing::warn!(username, "Rejected credentials");
            return Err(AuthError::InvalidCredentials);
        }

        let now = Utc::now();
        let access = Uuid::new_v4().to_string();
        let refresh = Uuid::new_v4().to_string();

        let mut tokens = self.tokens.write().await;
        tokens.retain(|_, entry| entry.expires_at > now);
        tokens.insert(access.clone(), self.entry(TokenKind::Access, username, now));
        tokens.insert(refresh.clone(), self.entry(TokenKind::Refresh, username, now));

        tracing::info!(username, "Issued token pair");
        Ok(TokenPair { access, refresh })
    }

    /// Mint a new access token from a live refresh token
    pub async fn refresh(&self, refresh: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let username = {
            let tokens = self.tokens.read().await;
            match tokens.get(refresh) {
                Some(entry) if entry.kind == TokenKind::Refresh && entry.expires_at > now => {
                    entry.username.clone()
                },
                _ => return Err(AuthError::InvalidToken),
            }
        };

        let access = Uuid::new_v4().to_string();
        let mut tokens = self.tokens.write().await;
        tokens.retain(|_, entry| entry.expires_at > now);
        tokens.insert(access.clone(), self.entry(TokenKind::Access, &username, now));

        tracing::debug!(username = %username, "Refreshed access token");
        Ok(access)
    }

    /// Resolve an access token to its account name
    pub async fn validate(&self, access: &str) -> Result<String, AuthError> {
        let tokens = self.tokens.read().await;
        match tokens.get(access) {
            Some(entry) if entry.kind == TokenKind::Access && entry.expires_at > Utc::now() => {
                Ok(entry.username.clone())
            },
            _ => Err(AuthError::InvalidToken),
        }
    }

    fn entry(&self, kind: TokenKind, username: &str, now: DateTime<Utc>) -> TokenEntry {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        TokenEntry {
            kind,
            username: username.to_string(),
            expires_at: now + ttl,
        }
    }

    #[cfg(test)]
    async fn expire(&self, token: &str) {
        if let Some(entry) = self.tokens.write().await.get_mut(token) {
            entry.expires_at = Utc::now() - Duration::seconds(1);
        }
    }

    #[cfg(test)]
    async fn stored(&self) -> usize {
        self.tokens.read().await.len()
    }

    #[cfg(test)]
    async fn expire_all(&self) {
        let past = Utc::now() - Duration::seconds(1);
        for entry in self.tokens.write().await.values_mut() {
            entry.expires_at = past;
        }
    }
}
