use std::sync::{Arc, Mutex};

use warden_core::is_expired_unix;

use crate::app_token::TokenMinter;
use crate::error::GithubError;
use crate::github_api_client::{GithubApiClient, RepoRef};

/// How long a minted client is reused before the next caller re-mints.
pub const CLIENT_CACHE_TTL_MS: u64 = 10_000;

struct CachedClient {
    client: GithubApiClient,
    expires_unix_ms: u64,
}

/// Process-wide cached credential component.
///
/// `get_or_refresh(now)` returns the cached authenticated client while the
/// entry is fresh and otherwise mints a new installation token. Minting
/// happens outside the lock: two callers racing past expiry may both mint,
/// and the last writer wins. The clock is injected as a parameter.
pub struct ClientProvider {
    minter: Arc<dyn TokenMinter>,
    repo: RepoRef,
    api_base: String,
    request_timeout_ms: u64,
    cached: Mutex<Option<CachedClient>>,
}

impl ClientProvider {
    pub fn new(
        minter: Arc<dyn TokenMinter>,
        repo: RepoRef,
        api_base: String,
        request_timeout_ms: u64,
    ) -> Self {
        Self {
            minter,
            repo,
            api_base,
            request_timeout_ms,
            cached: Mutex::new(None),
        }
    }

    pub fn repo(&self) -> &RepoRef {
        &self.repo
    }

    pub async fn get_or_refresh(&self, now_unix_ms: u64) -> Result<GithubApiClient, GithubError> {
        if let Some(client) = self.fresh_client(now_unix_ms) {
            return Ok(client);
        }
        let minted = self.minter.mint_token(now_unix_ms).await?;
        let client = GithubApiClient::new(
            self.api_base.clone(),
            minted.token,
            self.repo.clone(),
            self.request_timeout_ms,
        )?;
        self.store(client.clone(), now_unix_ms + CLIENT_CACHE_TTL_MS);
        Ok(client)
    }

    fn fresh_client(&self, now_unix_ms: u64) -> Option<GithubApiClient> {
        let guard = self.cached.lock().ok()?;
        let entry = guard.as_ref()?;
        if is_expired_unix(Some(entry.expires_unix_ms), now_unix_ms) {
            return None;
        }
        Some(entry.client.clone())
    }

    fn store(&self, client: GithubApiClient, expires_unix_ms: u64) {
        if let Ok(mut guard) = self.cached.lock() {
            *guard = Some(CachedClient {
                client,
                expires_unix_ms,
            });
        }
    }
}
