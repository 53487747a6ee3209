//! HTTP API client for the chemviz server
//!
//! The client owns the [`Session`]. Every authenticated call goes through
//! [`ApiClient::send_with_refresh`]: a 401 triggers exactly one token refresh
//! and one retry of the original request. A failed refresh, or a second 401,
//! clears the session and ends in [`CliError::Auth`].

use crate::api::endpoints;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::session::Session;
use chemviz_common::types::{
    AccessToken, DatasetListItem, ErrorBody, LatestSummaryResponse, RefreshRequest, TokenPair,
    TokenRequest, UploadResponse,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::path::PathBuf;
use std::time::Duration;

/// Reported when the refresh token is rejected, or a refreshed token is too.
pub const REFRESH_FAILED_MESSAGE: &str = "Token refresh failed - login required";

/// API client for the chemviz server
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Option<Session>,
    session_path: PathBuf,
}

impl ApiClient {
    /// Create a client from the CLI configuration, picking up a saved session.
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()?;
        let session = Session::load(&config.session_file)?;

        Ok(Self {
            client,
            base_url: config.server_url().to_string(),
            session,
            session_path: config.session_file.clone(),
        })
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Obtain a token pair and persist it as the session
    pub async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let url = endpoints::token_url(&self.base_url);
        let request = TokenRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        let response = self.client.post(&url).json(&request).send().await?;
        let pair: TokenPair = check(response).await?.json().await?;

        let session = Session::new(pair.access, pair.refresh);
        session.save(&self.session_path)?;
        self.session = Some(session);

        tracing::info!(username, "Logged in");
        Ok(())
    }

    /// Forget the session, in memory and on disk
    pub fn logout(&mut self) -> Result<()> {
        self.session = None;
        Session::clear(&self.session_path)
    }

    /// Upload a CSV file
    pub async fn upload(&mut self, file_name: &str, content: Vec<u8>) -> Result<UploadResponse> {
        let url = endpoints::upload_url(&self.base_url);
        let file_name = file_name.to_string();

        // Forms are consumed on send, so each attempt builds its own.
        let response = self
            .send_with_refresh(|client, token| {
                let part = Part::bytes(content.clone()).file_name(file_name.clone());
                client
                    .post(&url)
                    .bearer_auth(token)
                    .multipart(Form::new().part("file", part))
            })
            .await?;

        Ok(response.json().await?)
    }

    /// List datasets, most recent first
    pub async fn list_datasets(&mut self, limit: Option<usize>) -> Result<Vec<DatasetListItem>> {
        let url = endpoints::datasets_url(&self.base_url, limit);

        let response = self
            .send_with_refresh(|client, token| client.get(&url).bearer_auth(token))
            .await?;

        Ok(response.json().await?)
    }

    /// Fetch the raw CSV text of one dataset
    pub async fn download(&mut self, id: i64) -> Result<String> {
        let url = endpoints::download_url(&self.base_url, id);

        let response = self
            .send_with_refresh(|client, token| client.get(&url).bearer_auth(token))
            .await?;

        Ok(response.text().await?)
    }

    /// Summary of the most recent upload
    pub async fn latest_summary(&mut self) -> Result<LatestSummaryResponse> {
        let url = endpoints::latest_summary_url(&self.base_url);

        let response = self
            .send_with_refresh(|client, token| client.get(&url).bearer_auth(token))
            .await?;

        Ok(response.json().await?)
    }

    /// Send an authenticated request, refreshing the access token once on 401.
    ///
    /// `build` is called once per attempt with the current access token.
    pub async fn send_with_refresh<F>(&mut self, build: F) -> Result<Response>
    where
        F: Fn(&Client, &str) -> RequestBuilder,
    {
        let access = match &self.session {
            Some(session) => session.access.clone(),
            None => return Err(CliError::auth("not logged in")),
        };

        let response = build(&self.client, &access).send().await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return check(response).await;
        }

        tracing::debug!("Access token rejected, refreshing");
        let access = match self.refresh().await? {
            Some(access) => access,
            None => return self.expire_session(),
        };

        let retried = build(&self.client, &access).send().await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!("Refreshed access token rejected");
            return self.expire_session();
        }
        check(retried).await
    }

    /// Exchange the refresh token for a new access token.
    ///
    /// `Ok(None)` means the server refused the refresh token.
    async fn refresh(&mut self) -> Result<Option<String>> {
        let Some(session) = self.session.as_mut() else {
            return Ok(None);
        };

        let url = endpoints::token_refresh_url(&self.base_url);
        let request = RefreshRequest {
            refresh: session.refresh.clone(),
        };

        let response = self.client.post(&url).json(&request).send().await?;
        if !response.status().is_success() {
            tracing::warn!(status = response.status().as_u16(), "Token refresh rejected");
            return Ok(None);
        }

        let token: AccessToken = response.json().await?;
        session.access = token.access.clone();
        session.save(&self.session_path)?;

        Ok(Some(token.access))
    }

    fn expire_session<T>(&mut self) -> Result<T> {
        self.logout()?;
        Err(CliError::auth(REFRESH_FAILED_MESSAGE))
    }
}

/// Turn a non-success response into the matching [`CliError`].
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or_else(|_| {
            if text.trim().is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                text
            }
        });

    Err(match status {
        StatusCode::UNAUTHORIZED => CliError::auth(message),
        StatusCode::NOT_FOUND => CliError::not_found(message),
        _ => CliError::api(status.as_u16(), message),
    })
}
