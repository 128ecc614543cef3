//! Lifecycle of the single shared database handle.
//!
//! Exactly one `ConnectionManager` is created by the process entry point
//! and handed to dependents behind an `Arc`; there is no globally reachable
//! instance. The state machine is `Disconnected -> Connecting -> Connected`,
//! with `Connected <-> Degraded` driven by the health probe and a final
//! `-> Disconnected` on shutdown. All transitions happen under a write
//! lock, so concurrent first use cannot open two pools.

use crate::error::StoreError;
use configuration::DatabaseSettings;
use dotenvy::dotenv;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

/// Where the shared connection currently stands in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// Still holding a pool, but the last health probe failed.
    Degraded,
}

#[derive(Debug)]
struct Inner {
    state: ConnectionState,
    pool: Option<PgPool>,
}

/// Owns the one live `PgPool` per process and exposes its readiness.
#[derive(Debug)]
pub struct ConnectionManager {
    settings: DatabaseSettings,
    inner: RwLock<Inner>,
}

impl ConnectionManager {
    pub fn new(settings: DatabaseSettings) -> Self {
        Self {
            settings,
            inner: RwLock::new(Inner {
                state: ConnectionState::Disconnected,
                pool: None,
            }),
        }
    }

    pub async fn state(&self) -> ConnectionState {
        self.inner.read().await.state
    }

    /// Opens the connection pool. Idempotent: a manager that is already
    /// connected (even degraded) returns immediately. On failure the state
    /// stays `Disconnected` and the error surfaces to the caller.
    pub async fn connect(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if matches!(
            inner.state,
            ConnectionState::Connected | ConnectionState::Degraded
        ) {
            return Ok(());
        }

        inner.state = ConnectionState::Connecting;
        let started = Instant::now();
        match self.open_pool().await {
            Ok(pool) => {
                inner.pool = Some(pool);
                inner.state = ConnectionState::Connected;
                info!(
                    event = "connect",
                    duration_ms = started.elapsed().as_millis() as u64,
                    detail = "connected to database"
                );
                Ok(())
            }
            Err(err) => {
                inner.pool = None;
                inner.state = ConnectionState::Disconnected;
                error!(
                    event = "error",
                    duration_ms = started.elapsed().as_millis() as u64,
                    detail = %err,
                    "failed to connect to database"
                );
                Err(err)
            }
        }
    }

    /// Reads the `DATABASE_URL` from the environment (loading `.env` when
    /// present) and builds the pool with the configured limits.
    async fn open_pool(&self) -> Result<PgPool, StoreError> {
        dotenv().ok();
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| StoreError::Config("DATABASE_URL must be set".to_string()))?;

        PgPoolOptions::new()
            .max_connections(self.settings.max_connections)
            .acquire_timeout(Duration::from_secs(self.settings.acquire_timeout_secs))
            .connect(&database_url)
            .await
            .map_err(StoreError::from_sqlx)
    }

    /// Closes the pool. Idempotent and best-effort: the state ends up
    /// `Disconnected` no matter what, and a second call is a no-op. The
    /// process shutdown path calls this exactly once.
    pub async fn disconnect(&self) {
        let mut inner = self.inner.write().await;
        if inner.state == ConnectionState::Disconnected {
            return;
        }

        let started = Instant::now();
        let pool = inner.pool.take();
        inner.state = ConnectionState::Disconnected;
        drop(inner);

        if let Some(pool) = pool {
            pool.close().await;
        }
        info!(
            event = "disconnect",
            duration_ms = started.elapsed().as_millis() as u64,
            detail = "disconnected from database"
        );
    }

    /// Runs a minimal `SELECT 1` round trip. Never errors: any failure is
    /// logged and reported as `false`, and the state drops to `Degraded`
    /// until a later probe succeeds.
    pub async fn health_check(&self) -> bool {
        let pool = {
            let inner = self.inner.read().await;
            match &inner.pool {
                Some(pool) => pool.clone(),
                None => {
                    warn!(event = "warn", detail = "health check while disconnected");
                    return false;
                }
            }
        };

        let started = Instant::now();
        match sqlx::query("SELECT 1").execute(&pool).await {
            Ok(_) => {
                let mut inner = self.inner.write().await;
                if inner.state == ConnectionState::Degraded {
                    inner.state = ConnectionState::Connected;
                }
                info!(
                    event = "health",
                    duration_ms = started.elapsed().as_millis() as u64,
                    detail = "health probe ok"
                );
                true
            }
            Err(err) => {
                let mut inner = self.inner.write().await;
                if inner.state == ConnectionState::Connected {
                    inner.state = ConnectionState::Degraded;
                }
                error!(
                    event = "error",
                    duration_ms = started.elapsed().as_millis() as u64,
                    detail = %err,
                    "database health check failed"
                );
                false
            }
        }
    }

    /// Hands out the shared pool. `PgPool` is a cheap clone over one
    /// underlying pool, safe for concurrent use; callers never open their
    /// own connection.
    pub async fn pool(&self) -> Result<PgPool, StoreError> {
        let inner = self.inner.read().await;
        match (&inner.state, &inner.pool) {
            (ConnectionState::Connected | ConnectionState::Degraded, Some(pool)) => {
                Ok(pool.clone())
            }
            _ => Err(StoreError::Connection(
                "database connection is not established".to_string(),
            )),
        }
    }
}

/// Applies the embedded schema migrations for the `soil_reports` table.
/// Useful for ensuring the fixture schema exists when the application or
/// the integration tests start.
pub async fn run_migrations(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ConnectionManager {
        ConnectionManager::new(DatabaseSettings::default())
    }

    #[tokio::test]
    async fn starts_disconnected() {
        assert_eq!(manager().state().await, ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn pool_is_unavailable_before_connect() {
        let err = manager().pool().await.unwrap_err();
        assert!(matches!(err, StoreError::Connection(_)));
    }

    #[tokio::test]
    async fn health_check_without_a_pool_is_false_not_an_error() {
        assert!(!manager().health_check().await);
    }

    #[tokio::test]
    async fn disconnect_when_already_disconnected_is_a_noop() {
        let manager = manager();
        manager.disconnect().await;
        manager.disconnect().await;
        assert_eq!(manager.state().await, ConnectionState::Disconnected);
    }
}
