use serde::Deserialize;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub retry: RetrySettings,
}

/// Connection-pool tuning for the shared database handle. The connection
/// URL itself comes from the `DATABASE_URL` environment variable, never
/// from a checked-in file.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Upper bound on pooled connections shared by all concurrent callers.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// How long to wait for a pooled connection before giving up, in seconds.
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

/// Bounds for the retry executor that wraps every data operation.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySettings {
    /// Total attempts per operation, counting the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout_secs() -> u64 {
    5
}

fn default_max_attempts() -> u32 {
    3
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
        }
    }
}
