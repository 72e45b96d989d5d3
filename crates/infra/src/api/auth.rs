//! Session authentication with JWT access and refresh tokens
//!
//! The session moves between three states: unauthenticated, authenticated
//! and expired. Expiry is only detected reactively, when the server answers
//! 401 with an expired-token message; the dispatcher then asks for exactly
//! one refresh.

use std::fmt;

use async_trait::async_trait;
use qcportal_domain::constants::{ENDPOINT_LOGIN, ENDPOINT_REFRESH};
use qcportal_domain::{PortalError, Result};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use super::errors::request_error;
use crate::http::{decode_response, HttpClient, PreparedRequest};

/// Trait for providing access tokens
///
/// This trait allows dependency injection and testing with mock providers.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Token for the next request; `None` for an anonymous session
    async fn access_token(&self) -> Option<String>;

    /// Replace an expired access token and return the new one
    ///
    /// A failure here is fatal for the session.
    async fn refresh_access_token(&self) -> Result<String>;
}

/// Observable session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated,
    Expired,
}

#[derive(Clone)]
struct Tokens {
    access: String,
    refresh: String,
}

enum Session {
    Unauthenticated,
    Authenticated(Tokens),
    Expired(Tokens),
}

impl Session {
    const fn state(&self) -> AuthState {
        match self {
            Self::Unauthenticated => AuthState::Unauthenticated,
            Self::Authenticated(_) => AuthState::Authenticated,
            Self::Expired(_) => AuthState::Expired,
        }
    }
}

#[derive(Serialize)]
struct LoginBody<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    access_token: String,
    refresh_token: String,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: String,
}

/// Owner of the session's token pair
pub struct AuthManager {
    http: HttpClient,
    session: RwLock<Session>,
}

impl fmt::Debug for AuthManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthManager").field("address", &self.http.address()).finish_non_exhaustive()
    }
}

impl AuthManager {
    /// Anonymous session over `http`
    pub fn new(http: HttpClient) -> Self {
        Self { http, session: RwLock::new(Session::Unauthenticated) }
    }

    pub async fn state(&self) -> AuthState {
        self.session.read().await.state()
    }

    /// Exchange credentials for a token pair
    ///
    /// A rejected login is an authentication failure; connectivity
    /// failures pass through unchanged.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let body = self.http.encoding().encode(&LoginBody { username, password })?;
        let request = PreparedRequest::new(Method::POST, ENDPOINT_LOGIN).with_body(body);
        let response = self.http.send(&request, None).await?;

        if !response.is_success() {
            let err = request_error(&response);
            warn!(status = response.status, "login rejected");
            return Err(PortalError::Authentication(err.message));
        }

        let tokens: LoginResponse =
            decode_response(response.content_type.as_deref(), &response.body)?;
        *self.session.write().await = Session::Authenticated(Tokens {
            access: tokens.access_token,
            refresh: tokens.refresh_token,
        });

        info!("logged in");
        Ok(())
    }

    /// Obtain a new access token with the stored refresh token
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<String> {
        let refresh_token = {
            let mut session = self.session.write().await;
            let tokens = match &*session {
                Session::Authenticated(tokens) | Session::Expired(tokens) => tokens.clone(),
                Session::Unauthenticated => {
                    return Err(PortalError::TokenRefresh(
                        "no refresh token; the session never logged in".into(),
                    ))
                }
            };
            let refresh = tokens.refresh.clone();
            *session = Session::Expired(tokens);
            refresh
        };

        debug!("access token expired; refreshing");
        let request = PreparedRequest::new(Method::POST, ENDPOINT_REFRESH);
        let response = self.http.send(&request, Some(&refresh_token)).await?;

        if !response.is_success() {
            let err = request_error(&response);
            warn!(status = response.status, "token refresh rejected");
            return Err(PortalError::TokenRefresh(err.message));
        }

        let refreshed: RefreshResponse =
            decode_response(response.content_type.as_deref(), &response.body)?;
        let access = refreshed.access_token;
        *self.session.write().await =
            Session::Authenticated(Tokens { access: access.clone(), refresh: refresh_token });

        info!("access token refreshed");
        Ok(access)
    }
}

#[async_trait]
impl AccessTokenProvider for AuthManager {
    async fn access_token(&self) -> Option<String> {
        match &*self.session.read().await {
            Session::Authenticated(tokens) | Session::Expired(tokens) => {
                Some(tokens.access.clone())
            }
            Session::Unauthenticated => None,
        }
    }

    async fn refresh_access_token(&self) -> Result<String> {
        self.refresh().await
    }
}
