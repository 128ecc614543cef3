use crate::connection::ConnectionManager;
use crate::error::StoreError;
use crate::observe;
use crate::query::{self, Page, ReportFilter, Slice};
use crate::retry::execute_with_retry;
use chrono::Utc;
use configuration::RetrySettings;
use core_types::{NewSoilReport, SoilReport, SoilReportPatch, validate_new_report, validate_patch};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

const REPORT_COLUMNS: &str =
    "id, state, district, village, ph, nitrogen, phosphorus, potassium, timestamp";

/// The `SoilReportRepository` is the CRUD surface over `soil_reports` and
/// the only component that mutates persisted state. It composes the
/// connection manager, the query translator and the retry executor:
/// validation runs first (and never touches the connection), then the
/// operation executes through the retry bound.
#[derive(Debug, Clone)]
pub struct SoilReportRepository {
    manager: Arc<ConnectionManager>,
    max_attempts: u32,
}

impl SoilReportRepository {
    pub fn new(manager: Arc<ConnectionManager>, retry: &RetrySettings) -> Self {
        Self {
            manager,
            max_attempts: retry.max_attempts,
        }
    }

    /// Fetches one page of reports plus the total number of records
    /// matching the filter (ignoring pagination), so callers can compute
    /// page counts. Ordering is always newest first.
    pub async fn find_all(
        &self,
        filter: &ReportFilter,
        page: Page,
    ) -> Result<(Vec<SoilReport>, u64), StoreError> {
        let plan = query::plan(filter, page)?;
        observe::timed(
            "find_all",
            execute_with_retry("find_all", self.max_attempts, || {
                let plan = plan.clone();
                async move {
                    let pool = self.manager.pool().await?;

                    let mut count_query =
                        QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM soil_reports");
                    query::push_where(&mut count_query, &plan.predicates);
                    let total = count_query
                        .build_query_scalar::<i64>()
                        .fetch_one(&pool)
                        .await
                        .map_err(StoreError::from_sqlx)?;

                    let mut select_query = QueryBuilder::<Postgres>::new(format!(
                        "SELECT {REPORT_COLUMNS} FROM soil_reports"
                    ));
                    query::push_where(&mut select_query, &plan.predicates);
                    query::push_order_and_bounds(&mut select_query, &plan);
                    let records = select_query
                        .build_query_as::<SoilReport>()
                        .fetch_all(&pool)
                        .await
                        .map_err(StoreError::from_sqlx)?;

                    Ok((records, total as u64))
                }
            }),
        )
        .await
    }

    /// Fetches a bare slice of reports for internal bulk callers, skipping
    /// the page math and the total count.
    pub async fn find_slice(
        &self,
        filter: &ReportFilter,
        slice: Slice,
    ) -> Result<Vec<SoilReport>, StoreError> {
        let plan = query::plan_slice(filter, slice)?;
        observe::timed(
            "find_slice",
            execute_with_retry("find_slice", self.max_attempts, || {
                let plan = plan.clone();
                async move {
                    let pool = self.manager.pool().await?;
                    let mut select_query = QueryBuilder::<Postgres>::new(format!(
                        "SELECT {REPORT_COLUMNS} FROM soil_reports"
                    ));
                    query::push_where(&mut select_query, &plan.predicates);
                    query::push_order_and_bounds(&mut select_query, &plan);
                    select_query
                        .build_query_as::<SoilReport>()
                        .fetch_all(&pool)
                        .await
                        .map_err(StoreError::from_sqlx)
                }
            }),
        )
        .await
    }

    /// Fetches a single report by id, or `NotFound` if no such record
    /// exists (indistinguishable from "never existed").
    pub async fn find_by_id(&self, id: Uuid) -> Result<SoilReport, StoreError> {
        observe::timed(
            "find_by_id",
            execute_with_retry("find_by_id", self.max_attempts, || async move {
                let pool = self.manager.pool().await?;
                fetch_by_id(&pool, id).await
            }),
        )
        .await
    }

    /// Validates and persists a new report. The id and timestamp are
    /// assigned here, never by the caller, and decimals are rounded to the
    /// 2 fractional digits the wire contract promises. A single INSERT
    /// keeps the create atomic: a partially-applied record is never
    /// observable.
    pub async fn create(&self, payload: &NewSoilReport) -> Result<SoilReport, StoreError> {
        let data = validate_new_report(payload)?;
        let id = Uuid::new_v4();
        let timestamp = Utc::now();
        observe::timed(
            "create",
            execute_with_retry("create", self.max_attempts, || {
                let data = data.clone();
                async move {
                    let pool = self.manager.pool().await?;
                    sqlx::query_as::<_, SoilReport>(
                        "INSERT INTO soil_reports \
                         (id, state, district, village, ph, nitrogen, phosphorus, potassium, timestamp) \
                         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
                         RETURNING id, state, district, village, ph, nitrogen, phosphorus, potassium, timestamp",
                    )
                    .bind(id)
                    .bind(data.state)
                    .bind(data.district)
                    .bind(data.village)
                    .bind(data.ph.round_dp(2))
                    .bind(data.nitrogen.round_dp(2))
                    .bind(data.phosphorus.round_dp(2))
                    .bind(data.potassium.round_dp(2))
                    .bind(timestamp)
                    .fetch_one(&pool)
                    .await
                    .map_err(StoreError::from_sqlx)
                }
            }),
        )
        .await
    }

    /// Applies a partial update. Existence is confirmed first (reusing the
    /// `find_by_id` semantics), only the supplied fields are written, and
    /// `id`/`timestamp` cannot change because the patch cannot carry them.
    /// Concurrent updates are last-write-wins.
    pub async fn update(
        &self,
        id: Uuid,
        patch: &SoilReportPatch,
    ) -> Result<SoilReport, StoreError> {
        let patch = validate_patch(patch)?;
        observe::timed(
            "update",
            execute_with_retry("update", self.max_attempts, || {
                let patch = patch.clone();
                async move {
                    let pool = self.manager.pool().await?;
                    let existing = fetch_by_id(&pool, id).await?;
                    if patch.is_empty() {
                        return Ok(existing);
                    }

                    let mut update_query = QueryBuilder::<Postgres>::new("UPDATE soil_reports SET ");
                    {
                        let mut assignments = update_query.separated(", ");
                        if let Some(state) = patch.state {
                            assignments.push("state = ");
                            assignments.push_bind_unseparated(state);
                        }
                        if let Some(district) = patch.district {
                            assignments.push("district = ");
                            assignments.push_bind_unseparated(district);
                        }
                        if let Some(village) = patch.village {
                            assignments.push("village = ");
                            assignments.push_bind_unseparated(village);
                        }
                        if let Some(ph) = patch.ph {
                            assignments.push("ph = ");
                            assignments.push_bind_unseparated(ph.round_dp(2));
                        }
                        if let Some(nitrogen) = patch.nitrogen {
                            assignments.push("nitrogen = ");
                            assignments.push_bind_unseparated(nitrogen.round_dp(2));
                        }
                        if let Some(phosphorus) = patch.phosphorus {
                            assignments.push("phosphorus = ");
                            assignments.push_bind_unseparated(phosphorus.round_dp(2));
                        }
                        if let Some(potassium) = patch.potassium {
                            assignments.push("potassium = ");
                            assignments.push_bind_unseparated(potassium.round_dp(2));
                        }
                    }
                    update_query.push(" WHERE id = ");
                    update_query.push_bind(id);
                    update_query.push(format!(" RETURNING {REPORT_COLUMNS}"));

                    // The row can vanish between the existence check and the
                    // write; that is still a not-found, not a retryable error.
                    update_query
                        .build_query_as::<SoilReport>()
                        .fetch_optional(&pool)
                        .await
                        .map_err(StoreError::from_sqlx)?
                        .ok_or(StoreError::NotFound(id))
                }
            }),
        )
        .await
    }

    /// Permanently removes a report. `NotFound` when the id does not
    /// exist; no tombstone is left behind.
    pub async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        observe::timed(
            "delete",
            execute_with_retry("delete", self.max_attempts, || async move {
                let pool = self.manager.pool().await?;
                let result = sqlx::query("DELETE FROM soil_reports WHERE id = $1")
                    .bind(id)
                    .execute(&pool)
                    .await
                    .map_err(StoreError::from_sqlx)?;
                if result.rows_affected() == 0 {
                    return Err(StoreError::NotFound(id));
                }
                Ok(())
            }),
        )
        .await
    }

    /// Wipes the table. Fixture support for the seeder and the integration
    /// tests, not part of the CRUD contract.
    pub async fn clear(&self) -> Result<u64, StoreError> {
        observe::timed(
            "clear",
            execute_with_retry("clear", self.max_attempts, || async move {
                let pool = self.manager.pool().await?;
                let result = sqlx::query("DELETE FROM soil_reports")
                    .execute(&pool)
                    .await
                    .map_err(StoreError::from_sqlx)?;
                Ok(result.rows_affected())
            }),
        )
        .await
    }
}

async fn fetch_by_id(pool: &PgPool, id: Uuid) -> Result<SoilReport, StoreError> {
    let sql = format!("SELECT {REPORT_COLUMNS} FROM soil_reports WHERE id = $1");
    sqlx::query_as::<_, SoilReport>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(StoreError::from_sqlx)?
        .ok_or(StoreError::NotFound(id))
}
