//! Translation of untrusted filter/pagination input into a bounded,
//! deterministic query plan over the `soil_reports` table.
//!
//! The plan is a pure function of its input: the same filter and page
//! always produce the same predicates, offset and row limit. Filter text
//! only ever reaches the database as a bound parameter, never spliced into
//! the SQL string.

use chrono::{DateTime, Utc};
use core_types::{FieldViolation, ValidationError};
use rust_decimal::Decimal;
use sqlx::{Postgres, QueryBuilder};

/// The closed set of caller-selectable criteria. Every recognized option is
/// enumerated here; anything else simply cannot be expressed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportFilter {
    /// Case-insensitive substring match on the state name.
    pub state: Option<String>,
    /// Case-insensitive substring match on the district name.
    pub district: Option<String>,
    /// Case-insensitive substring match on the village name.
    pub village: Option<String>,
    pub ph_min: Option<Decimal>,
    pub ph_max: Option<Decimal>,
    pub nitrogen_min: Option<Decimal>,
    pub nitrogen_max: Option<Decimal>,
    pub phosphorus_min: Option<Decimal>,
    pub phosphorus_max: Option<Decimal>,
    pub potassium_min: Option<Decimal>,
    pub potassium_max: Option<Decimal>,
    /// Inclusive lower bound on the creation timestamp.
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the creation timestamp.
    pub end_date: Option<DateTime<Utc>>,
}

/// 1-based pagination for listing endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    pub const DEFAULT_LIMIT: u32 = 10;

    /// Builds a page request from raw caller input. A missing page defaults
    /// to 1 and a non-positive page is coerced to 1; a missing limit
    /// defaults to 10, but an explicit non-positive limit is rejected.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Result<Self, ValidationError> {
        let page = match page {
            Some(p) if p >= 1 => u32::try_from(p).unwrap_or(u32::MAX),
            _ => 1,
        };
        let limit = match limit {
            None => Self::DEFAULT_LIMIT,
            Some(l) if l >= 1 => u32::try_from(l).unwrap_or(u32::MAX),
            Some(_) => {
                return Err(ValidationError::new(vec![FieldViolation::new(
                    "limit",
                    "must be a positive integer",
                )]));
            }
        };
        Ok(Self { page, limit })
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// Raw skip/take offsets for internal bulk callers that bypass page math.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    pub skip: u64,
    pub take: u64,
}

impl Slice {
    pub const DEFAULT_TAKE: u64 = 50;

    pub fn new(skip: Option<i64>, take: Option<i64>) -> Result<Self, ValidationError> {
        let skip = match skip {
            Some(s) if s < 0 => {
                return Err(ValidationError::new(vec![FieldViolation::new(
                    "skip",
                    "cannot be negative",
                )]));
            }
            Some(s) => s as u64,
            None => 0,
        };
        let take = match take {
            None => Self::DEFAULT_TAKE,
            Some(t) if t >= 1 => t as u64,
            Some(_) => {
                return Err(ValidationError::new(vec![FieldViolation::new(
                    "take",
                    "must be a positive integer",
                )]));
            }
        };
        Ok(Self { skip, take })
    }
}

/// A column of `soil_reports` a predicate may touch. Closed set, so column
/// names in generated SQL come only from this table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    State,
    District,
    Village,
    Ph,
    Nitrogen,
    Phosphorus,
    Potassium,
    Timestamp,
}

impl Column {
    pub fn as_str(self) -> &'static str {
        match self {
            Column::State => "state",
            Column::District => "district",
            Column::Village => "village",
            Column::Ph => "ph",
            Column::Nitrogen => "nitrogen",
            Column::Phosphorus => "phosphorus",
            Column::Potassium => "potassium",
            Column::Timestamp => "timestamp",
        }
    }
}

/// One resolved WHERE condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column ILIKE '%needle%'`, with LIKE metacharacters escaped.
    TextContains { column: Column, needle: String },
    /// Inclusive numeric range; one-sided when only one bound is present.
    DecimalRange {
        column: Column,
        min: Option<Decimal>,
        max: Option<Decimal>,
    },
    /// Inclusive timestamp range on the creation time.
    TimestampRange {
        min: Option<DateTime<Utc>>,
        max: Option<DateTime<Utc>>,
    },
}

/// The bounded, ordered query shape derived from a filter and a page.
/// Ordering is fixed: `timestamp DESC, id DESC` (the id tiebreak keeps
/// pagination stable when timestamps collide).
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub predicates: Vec<Predicate>,
    pub offset: i64,
    pub limit: i64,
}

/// Translates a filter plus page-based pagination into a query plan.
pub fn plan(filter: &ReportFilter, page: Page) -> Result<QueryPlan, ValidationError> {
    Ok(QueryPlan {
        predicates: build_predicates(filter)?,
        offset: page.offset(),
        limit: i64::from(page.limit),
    })
}

/// Translates a filter plus raw skip/take offsets into a query plan.
pub fn plan_slice(filter: &ReportFilter, slice: Slice) -> Result<QueryPlan, ValidationError> {
    Ok(QueryPlan {
        predicates: build_predicates(filter)?,
        offset: slice.skip as i64,
        limit: slice.take as i64,
    })
}

fn build_predicates(filter: &ReportFilter) -> Result<Vec<Predicate>, ValidationError> {
    let mut violations = Vec::new();
    let mut predicates = Vec::new();

    for (column, text) in [
        (Column::State, &filter.state),
        (Column::District, &filter.district),
        (Column::Village, &filter.village),
    ] {
        if let Some(needle) = text {
            predicates.push(Predicate::TextContains {
                column,
                needle: needle.clone(),
            });
        }
    }

    for (column, field, min, max) in [
        (Column::Ph, "ph_min", filter.ph_min, filter.ph_max),
        (
            Column::Nitrogen,
            "nitrogen_min",
            filter.nitrogen_min,
            filter.nitrogen_max,
        ),
        (
            Column::Phosphorus,
            "phosphorus_min",
            filter.phosphorus_min,
            filter.phosphorus_max,
        ),
        (
            Column::Potassium,
            "potassium_min",
            filter.potassium_min,
            filter.potassium_max,
        ),
    ] {
        if let (Some(lo), Some(hi)) = (min, max)
            && lo > hi
        {
            violations.push(FieldViolation::new(field, "minimum exceeds maximum"));
            continue;
        }
        if min.is_some() || max.is_some() {
            predicates.push(Predicate::DecimalRange { column, min, max });
        }
    }

    if filter.start_date.is_some() || filter.end_date.is_some() {
        predicates.push(Predicate::TimestampRange {
            min: filter.start_date,
            max: filter.end_date,
        });
    }

    if violations.is_empty() {
        Ok(predicates)
    } else {
        Err(ValidationError::new(violations))
    }
}

/// Escapes LIKE metacharacters so a substring filter matches them literally.
fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Appends the plan's predicates as a WHERE clause, binding every value.
pub fn push_where(builder: &mut QueryBuilder<'_, Postgres>, predicates: &[Predicate]) {
    if predicates.is_empty() {
        return;
    }
    builder.push(" WHERE ");
    for (i, predicate) in predicates.iter().enumerate() {
        if i > 0 {
            builder.push(" AND ");
        }
        match predicate {
            Predicate::TextContains { column, needle } => {
                builder.push(column.as_str());
                builder.push(" ILIKE ");
                builder.push_bind(format!("%{}%", escape_like(needle)));
                builder.push(" ESCAPE '\\'");
            }
            Predicate::DecimalRange { column, min, max } => {
                let mut sides = 0;
                if let Some(lo) = min {
                    builder.push(column.as_str());
                    builder.push(" >= ");
                    builder.push_bind(*lo);
                    sides += 1;
                }
                if let Some(hi) = max {
                    if sides > 0 {
                        builder.push(" AND ");
                    }
                    builder.push(column.as_str());
                    builder.push(" <= ");
                    builder.push_bind(*hi);
                }
            }
            Predicate::TimestampRange { min, max } => {
                let mut sides = 0;
                if let Some(lo) = min {
                    builder.push("timestamp >= ");
                    builder.push_bind(*lo);
                    sides += 1;
                }
                if let Some(hi) = max {
                    if sides > 0 {
                        builder.push(" AND ");
                    }
                    builder.push("timestamp <= ");
                    builder.push_bind(*hi);
                }
            }
        }
    }
}

/// Appends the fixed ordering plus the plan's LIMIT/OFFSET bounds.
pub fn push_order_and_bounds(builder: &mut QueryBuilder<'_, Postgres>, plan: &QueryPlan) {
    builder.push(" ORDER BY timestamp DESC, id DESC LIMIT ");
    builder.push_bind(plan.limit);
    builder.push(" OFFSET ");
    builder.push_bind(plan.offset);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn filter_with_state_and_ph() -> ReportFilter {
        ReportFilter {
            state: Some("Maharashtra".to_string()),
            ph_min: Some(dec!(6.0)),
            ph_max: Some(dec!(7.5)),
            ..Default::default()
        }
    }

    #[test]
    fn identical_input_yields_identical_plans() {
        let filter = filter_with_state_and_ph();
        let page = Page::new(Some(2), Some(25)).unwrap();
        assert_eq!(plan(&filter, page).unwrap(), plan(&filter, page).unwrap());
    }

    #[test]
    fn offset_is_page_minus_one_times_limit() {
        let page = Page::new(Some(3), Some(10)).unwrap();
        assert_eq!(page.offset(), 20);
        let plan = plan(&ReportFilter::default(), page).unwrap();
        assert_eq!(plan.offset, 20);
        assert_eq!(plan.limit, 10);
    }

    #[test]
    fn non_positive_page_is_coerced_to_one() {
        assert_eq!(Page::new(Some(0), None).unwrap().page, 1);
        assert_eq!(Page::new(Some(-4), None).unwrap().page, 1);
        assert_eq!(Page::new(None, None).unwrap().page, 1);
    }

    #[test]
    fn missing_limit_defaults_but_zero_limit_is_rejected() {
        assert_eq!(Page::new(None, None).unwrap().limit, Page::DEFAULT_LIMIT);
        let err = Page::new(Some(1), Some(0)).unwrap_err();
        assert!(err.mentions("limit"));
    }

    #[test]
    fn slice_defaults_to_fifty_rows_from_the_start() {
        let slice = Slice::new(None, None).unwrap();
        assert_eq!(slice.skip, 0);
        assert_eq!(slice.take, Slice::DEFAULT_TAKE);
        assert!(Slice::new(Some(-1), None).is_err());
        assert!(Slice::new(None, Some(0)).is_err());
    }

    #[test]
    fn min_above_max_is_rejected_per_pair() {
        let filter = ReportFilter {
            ph_min: Some(dec!(8)),
            ph_max: Some(dec!(6)),
            nitrogen_min: Some(dec!(100)),
            nitrogen_max: Some(dec!(50)),
            ..Default::default()
        };
        let err = plan(&filter, Page::default()).unwrap_err();
        assert_eq!(err.violations.len(), 2);
        assert!(err.mentions("ph_min"));
        assert!(err.mentions("nitrogen_min"));
    }

    #[test]
    fn one_sided_bounds_are_allowed() {
        let filter = ReportFilter {
            potassium_min: Some(dec!(100)),
            ..Default::default()
        };
        let plan = plan(&filter, Page::default()).unwrap();
        assert_eq!(
            plan.predicates,
            vec![Predicate::DecimalRange {
                column: Column::Potassium,
                min: Some(dec!(100)),
                max: None,
            }]
        );
    }

    #[test]
    fn empty_filter_produces_no_predicates() {
        let plan = plan(&ReportFilter::default(), Page::default()).unwrap();
        assert!(plan.predicates.is_empty());
    }

    #[test]
    fn rendered_sql_binds_every_value() {
        let plan = plan(&filter_with_state_and_ph(), Page::default()).unwrap();
        let mut builder = QueryBuilder::new("SELECT * FROM soil_reports");
        push_where(&mut builder, &plan.predicates);
        push_order_and_bounds(&mut builder, &plan);
        assert_eq!(
            builder.sql(),
            "SELECT * FROM soil_reports WHERE state ILIKE $1 ESCAPE '\\' \
             AND ph >= $2 AND ph <= $3 \
             ORDER BY timestamp DESC, id DESC LIMIT $4 OFFSET $5"
        );
    }

    #[test]
    fn like_metacharacters_in_filters_are_escaped() {
        assert_eq!(escape_like("50%_\\"), "50\\%\\_\\\\");
    }

    #[test]
    fn no_where_clause_for_an_empty_filter() {
        let plan = plan(&ReportFilter::default(), Page::default()).unwrap();
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM soil_reports");
        push_where(&mut builder, &plan.predicates);
        assert_eq!(builder.sql(), "SELECT COUNT(*) FROM soil_reports");
    }
}
