use crate::error::{ApiError, ApiResult};
use multicare_core::{Connection, CoreConfig, CoreResult, Store};
use std::sync::Arc;

/// Shared state for request handlers.
///
/// Configuration is resolved once at startup. Each request opens its own store connection.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<CoreConfig>,
    pub store: Store,
}

impl AppState {
    pub fn new(cfg: Arc<CoreConfig>, store: Store) -> Self {
        Self { cfg, store }
    }

    /// Runs `work` on a fresh connection on the blocking pool.
    ///
    /// SQLite calls and PBKDF2 hashing both block, so they never run on the async workers.
    pub async fn run<T, F>(&self, work: F) -> ApiResult<T>
    where
        F: FnOnce(&mut Connection, &CoreConfig) -> CoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.store.clone();
        let cfg = self.cfg.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            let mut conn = store.connection()?;
            work(&mut conn, &cfg)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("blocking task failed: {e}")))?;
        Ok(outcome?)
    }
}
