//! Bearer authentication for dataset routes

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::auth::{AuthError, TokenService};
use crate::error::AppError;

/// Account name resolved from the access token, placed in request extensions
/// for handlers that record who acted
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

/// Reject requests without a live `Authorization: Bearer <access>` header
pub async fn require_bearer(
    State(tokens): State<TokenService>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request).ok_or(AuthError::MissingToken)?;
    let username = tokens.validate(token).await?;

    request.extensions_mut().insert(AuthUser(username));
    Ok(next.run(request).await)
}

fn bearer_token(request: &Request) -> Option<&str> {
    let value = request.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Unauthorized(err.to_string())
    }
}
