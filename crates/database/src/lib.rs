//! # Soiltrack Database Crate
//!
//! The resilient data-access layer for soil report records. It owns the
//! database connection lifecycle, retries transient failures, and turns
//! caller-supplied filter/pagination input into bounded, deterministic
//! queries.
//!
//! ## Architectural Principles
//!
//! - **Single shared handle:** one `ConnectionManager` per process holds
//!   the `PgPool`; dependents receive it by `Arc` rather than reaching for
//!   a global.
//! - **Validation before I/O:** payloads and filter input are checked in
//!   full (every violation reported) before a connection is ever touched,
//!   and permanent failures are never retried.
//! - **Bounded retries:** every data operation runs through the retry
//!   executor with exponential backoff; the final attempt's own error is
//!   what the caller sees.
//!
//! ## Public API
//!
//! - `ConnectionManager`: lifecycle and health of the shared pool.
//! - `SoilReportRepository`: the CRUD surface (`find_all`, `find_by_id`,
//!   `create`, `update`, `delete`).
//! - `ReportFilter` / `Page` / `Slice`: the closed filter and pagination
//!   vocabulary.
//! - `StoreError`: the error taxonomy callers match on.
//! - `run_migrations`: applies the fixture schema.
//! - `fixtures`: sample data for seeding and tests.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod fixtures;
pub mod observe;
pub mod query;
pub mod repository;
pub mod retry;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{ConnectionManager, ConnectionState, run_migrations};
pub use error::StoreError;
pub use query::{Page, QueryPlan, ReportFilter, Slice};
pub use repository::SoilReportRepository;
pub use retry::{DEFAULT_MAX_ATTEMPTS, Transient, execute_with_retry};
