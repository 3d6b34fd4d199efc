//! Volatile bearer-token session store.
//!
//! Maps an opaque token to the single station id it may read. Entries live
//! until explicitly destroyed; there is no time-based expiry here — the
//! transport layer above owns cookie lifetimes.

use crate::session::error::SessionError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::TryRngCore;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Raw entropy per token before encoding.
const TOKEN_BYTES: usize = 32;

/// Concurrent map of session token to station id.
///
/// Lookups take a shared read lock and run in parallel; generation,
/// destruction, and updates take the write lock exclusively.
#[derive(Default)]
pub struct SessionStore {
    inner: RwLock<HashMap<String, String>>,
}

impl SessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints a fresh token bound to `station_id` and returns it.
    ///
    /// The token is 32 bytes of operating-system entropy, base64-url
    /// encoded. If the entropy source fails, no token is stored and the
    /// failure surfaces as [`SessionError::Entropy`]; a predictable token is
    /// never handed out.
    pub async fn generate(&self, station_id: &str) -> Result<String, SessionError> {
        let mut raw = [0u8; TOKEN_BYTES];
        OsRng
            .try_fill_bytes(&mut raw)
            .map_err(SessionError::Entropy)?;
        let token = URL_SAFE_NO_PAD.encode(raw);

        self.inner
            .write()
            .await
            .insert(token.clone(), station_id.to_owned());
        Ok(token)
    }

    /// Returns the station id bound to `token`, if the session is live.
    pub async fn get(&self, token: &str) -> Option<String> {
        self.inner.read().await.get(token).cloned()
    }

    /// Removes the session for `token`. A no-op when the token is unknown.
    pub async fn destroy(&self, token: &str) {
        self.inner.write().await.remove(token);
    }

    /// Overwrites `token` with a mapping onto itself.
    ///
    /// Idempotent; used when the store is keyed by the bearer token itself
    /// rather than a derived id.
    pub async fn update(&self, token: &str) {
        self.inner
            .write()
            .await
            .insert(token.to_owned(), token.to_owned());
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// `true` when no session is live.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}
