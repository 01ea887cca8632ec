use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use warden_issues::issue_model::parse_rfc3339_to_unix_ms;

use crate::error::{truncate_for_error, GithubError, ERROR_BODY_MAX_CHARS};

/// Lifetime of the signed app assertion exchanged for an installation token.
pub const APP_JWT_TTL_SECONDS: u64 = 600;

/// Issued-at is backdated to absorb clock drift between us and the tracker.
const APP_JWT_BACKDATE_SECONDS: u64 = 60;

#[derive(Debug, Clone)]
/// App identity and key material read once at startup.
pub struct AppAuthConfig {
    pub app_id: String,
    pub installation_id: String,
    pub private_key_pem: String,
    pub api_base: String,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone)]
/// Installation access token plus its expiry instant.
pub struct InstallationToken {
    pub token: String,
    pub expires_unix_ms: u64,
}

#[async_trait]
/// Trait contract for `TokenMinter` behavior.
pub trait TokenMinter: Send + Sync {
    async fn mint_token(&self, now_unix_ms: u64) -> Result<InstallationToken, GithubError>;
}

/// Mints installation tokens via the tracker's app-auth endpoint: a signed
/// RS256 assertion (`iss` = app id, expiry 600s) is exchanged for an
/// installation-scoped access token.
pub struct AppTokenProvider {
    config: AppAuthConfig,
    http: reqwest::Client,
}

impl AppTokenProvider {
    pub fn new(config: AppAuthConfig) -> Result<Self, GithubError> {
        if config.app_id.trim().is_empty() {
            return Err(GithubError::AuthFailure {
                message: "app id must not be empty".to_string(),
            });
        }
        if config.installation_id.trim().is_empty() {
            return Err(GithubError::AuthFailure {
                message: "installation id must not be empty".to_string(),
            });
        }
        if config.private_key_pem.trim().is_empty() {
            return Err(GithubError::AuthFailure {
                message: "private key must not be empty".to_string(),
            });
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()?;
        Ok(Self { config, http })
    }

    fn generate_jwt(&self, now_unix: u64) -> Result<String, GithubError> {
        #[derive(Debug, Serialize)]
        struct Claims {
            iat: u64,
            exp: u64,
            iss: String,
        }

        let claims = Claims {
            iat: now_unix.saturating_sub(APP_JWT_BACKDATE_SECONDS),
            exp: now_unix + APP_JWT_TTL_SECONDS,
            iss: self.config.app_id.clone(),
        };
        let key = EncodingKey::from_rsa_pem(self.config.private_key_pem.as_bytes()).map_err(
            |error| GithubError::AuthFailure {
                message: format!("invalid app private key: {error}"),
            },
        )?;
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key).map_err(|error| {
            GithubError::AuthFailure {
                message: format!("failed to sign app assertion: {error}"),
            }
        })
    }
}

#[async_trait]
impl TokenMinter for AppTokenProvider {
    async fn mint_token(&self, now_unix_ms: u64) -> Result<InstallationToken, GithubError> {
        #[derive(Debug, Deserialize)]
        struct InstallationTokenResponse {
            token: String,
            expires_at: String,
        }

        let jwt = self.generate_jwt(now_unix_ms / 1_000)?;
        let endpoint = format!(
            "{}/app/installations/{}/access_tokens",
            self.config.api_base.trim_end_matches('/'),
            self.config.installation_id
        );
        let response = self
            .http
            .post(endpoint)
            .header(reqwest::header::USER_AGENT, "warden-backlog-bot")
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header("x-github-api-version", "2022-11-28")
            .bearer_auth(jwt)
            .send()
            .await
            .map_err(|error| GithubError::AuthFailure {
                message: format!("token exchange request failed: {error}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GithubError::AuthFailure {
                message: format!(
                    "token exchange failed with status {}: {}",
                    status.as_u16(),
                    truncate_for_error(&body, ERROR_BODY_MAX_CHARS)
                ),
            });
        }
        let payload: InstallationTokenResponse =
            response
                .json()
                .await
                .map_err(|error| GithubError::AuthFailure {
                    message: format!("failed to decode token exchange response: {error}"),
                })?;
        let expires_unix_ms =
            parse_rfc3339_to_unix_ms(&payload.expires_at).ok_or_else(|| GithubError::AuthFailure {
                message: format!("invalid token expiry '{}'", payload.expires_at),
            })?;
        Ok(InstallationToken {
            token: payload.token,
            expires_unix_ms,
        })
    }
}
