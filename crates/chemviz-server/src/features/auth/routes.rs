use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};

use super::commands::{
    obtain_token, refresh_token, ObtainTokenCommand, ObtainTokenError, RefreshTokenCommand,
    RefreshTokenError,
};
use crate::auth::TokenService;
use crate::error::AppError;

/// Token routes, relative to the API root; these need no bearer token
pub fn auth_routes() -> Router<TokenService> {
    Router::new()
        .route("/token/", post(obtain_token_pair))
        .route("/token/refresh/", post(refresh_access_token))
}

/// POST /token/ {username, password}
async fn obtain_token_pair(
    State(tokens): State<TokenService>,
    body: Result<Json<ObtainTokenCommand>, JsonRejection>,
) -> Result<Response, AuthApiError> {
    let Json(command) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let pair = obtain_token::handle(tokens, command).await?;
    Ok((StatusCode::OK, Json(pair)).into_response())
}

/// POST /token/refresh/ {refresh}
async fn refresh_access_token(
    State(tokens): State<TokenService>,
    body: Result<Json<RefreshTokenCommand>, JsonRejection>,
) -> Result<Response, AuthApiError> {
    let Json(command) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let access = refresh_token::handle(tokens, command).await?;
    Ok((StatusCode::OK, Json(access)).into_response())
}

#[derive(Debug)]
enum AuthApiError {
    Obtain(ObtainTokenError),
    Refresh(RefreshTokenError),
    Request(AppError),
}

impl From<ObtainTokenError> for AuthApiError {
    fn from(err: ObtainTokenError) -> Self {
        Self::Obtain(err)
    }
}

impl From<RefreshTokenError> for AuthApiError {
    fn from(err: RefreshTokenError) -> Self {
        Self::Refresh(err)
    }
}

impl From<AppError> for AuthApiError {
    fn from(err: AppError) -> Self {
        Self::Request(err)
    }
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let err = match self {
            AuthApiError::Obtain(ObtainTokenError::Auth(e))
            | AuthApiError::Refresh(RefreshTokenError::Auth(e)) => AppError::from(e),
            AuthApiError::Obtain(e) => AppError::Validation(e.to_string()),
            AuthApiError::Refresh(e) => AppError::Validation(e.to_string()),
            AuthApiError::Request(e) => e,
        };
        err.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthError;

    #[test]
    fn test_error_status_mapping() {
        let response = AuthApiError::from(ObtainTokenError::Auth(AuthError::InvalidCredentials))
            .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AuthApiError::from(RefreshTokenError::RefreshRequired).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response =
            AuthApiError::from(RefreshTokenError::Auth(AuthError::InvalidToken)).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
