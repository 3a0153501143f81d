//! HTTP client for the dashboard backend's auth endpoints.
//!
//! Three calls, all `POST`:
//!
//! | Path               | Auth                    | Body            |
//! |--------------------|-------------------------|-----------------|
//! | `/api/auth/login`  | none                    | `{"api_key"}`   |
//! | `/api/auth/verify` | `Authorization: Bearer` | empty           |
//! | `/api/auth/logout` | `Authorization: Bearer` | empty           |
//!
//! Only `verify` sits on the navigation path. Login and logout are here so
//! a caller has one client for the whole session lifecycle.

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

use crate::{Verifier, VerifierConfig, VerifyError, VerifyOutcome};

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const VERIFY_PATH: &str = "/api/auth/verify";
pub const LOGOUT_PATH: &str = "/api/auth/logout";

#[derive(Serialize)]
struct LoginRequest<'a> {
    api_key: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    success: bool,
    #[serde(default)]
    message: String,
    token: Option<String>,
}

/// Error body of the backend (`{"detail": "..."}`).
#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

/// Talks to the backend's auth endpoints.
///
/// Cheap to clone: the underlying `reqwest::Client` is reference counted
/// and pools connections.
#[derive(Debug, Clone)]
pub struct AuthClient {
    client: Client,
    config: VerifierConfig,
}

impl AuthClient {
    /// Builds a client with `config.timeout` applied to every request.
    ///
    /// # Errors
    /// [`VerifyError::Client`] if the HTTP client can't be constructed.
    pub fn new(config: VerifierConfig) -> Result<Self, VerifyError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .build()
            .map_err(VerifyError::Client)?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Exchanges an API key for a session token.
    ///
    /// The caller records the token with
    /// `routegate_session::begin_session`.
    ///
    /// # Errors
    /// - [`VerifyError::Request`]: no response
    /// - [`VerifyError::Rejected`]: wrong key (401) or other non-2xx
    /// - [`VerifyError::InvalidResponse`]: 2xx without a token
    pub async fn login(&self, api_key: &str) -> Result<String, VerifyError> {
        let resp = self
            .client
            .post(self.config.endpoint(LOGIN_PATH))
            .json(&LoginRequest { api_key })
            .send()
            .await
            .map_err(VerifyError::Request)?;
        let resp = ensure_success(resp).await?;

        let body: LoginResponse = resp
            .json()
            .await
            .map_err(|e| VerifyError::InvalidResponse(e.to_string()))?;
        match body {
            LoginResponse {
                success: true,
                token: Some(token),
                ..
            } if !token.is_empty() => {
                tracing::info!("login succeeded");
                Ok(token)
            }
            LoginResponse { message, .. } => Err(VerifyError::InvalidResponse(format!(
                "login response without token: {message}"
            ))),
        }
    }

    /// Tells the backend to forget `token`.
    ///
    /// The local session should be cleared whatever this returns.
    pub async fn logout(&self, token: &str) -> Result<(), VerifyError> {
        let resp = self
            .client
            .post(self.config.endpoint(LOGOUT_PATH))
            .bearer_auth(token)
            .send()
            .await
            .map_err(VerifyError::Request)?;
        ensure_success(resp).await?;
        tracing::info!("logged out on server");
        Ok(())
    }
}

impl Verifier for AuthClient {
    async fn verify(&self, token: &str) -> VerifyOutcome {
        let result = self
            .client
            .post(self.config.endpoint(VERIFY_PATH))
            .bearer_auth(token)
            .send()
            .await;

        let outcome = match result {
            Ok(resp) if resp.status().is_success() => VerifyOutcome::Accepted,
            Ok(resp) => VerifyOutcome::Rejected {
                status: resp.status().as_u16(),
            },
            Err(e) => VerifyOutcome::NetworkError(e.to_string()),
        };
        tracing::debug!(%outcome, "token verification finished");
        outcome
    }
}

/// Passes 2xx responses through and turns anything else into
/// [`VerifyError::Rejected`], using the backend's `detail` when present.
async fn ensure_success(resp: Response) -> Result<Response, VerifyError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&text)
        .map(|b| b.detail)
        .unwrap_or(text);
    Err(VerifyError::Rejected {
        status: status.as_u16(),
        detail,
    })
}
