use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A persisted soil-test report: where the sample was taken plus its
/// pH and nutrient analysis. This is the sole entity of the system.
///
/// `id` and `timestamp` are server-assigned at creation and immutable
/// afterwards. Decimal fields are stored rounded to 2 fractional digits,
/// which is the precision the wire contract promises.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct SoilReport {
    pub id: Uuid,
    /// State/province where the sample was collected.
    pub state: String,
    /// District/county where the sample was collected.
    pub district: String,
    /// Village/town where the sample was collected.
    pub village: String,
    /// pH level of the soil (0-14 scale).
    pub ph: Decimal,
    /// Nitrogen content (mg/kg).
    pub nitrogen: Decimal,
    /// Phosphorus content (mg/kg).
    pub phosphorus: Decimal,
    /// Potassium content (mg/kg).
    pub potassium: Decimal,
    /// Creation time; the default sort key (newest first).
    pub timestamp: DateTime<Utc>,
}

/// Payload for creating a report. No `id`/`timestamp`: those are assigned
/// by the store. Field invariants are enforced by [`crate::validate_new_report`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSoilReport {
    pub state: String,
    pub district: String,
    pub village: String,
    pub ph: Decimal,
    pub nitrogen: Decimal,
    pub phosphorus: Decimal,
    pub potassium: Decimal,
}

/// Partial update payload. Only present fields are validated and written;
/// `id` and `timestamp` are not representable here, so they can never be
/// changed through an update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoilReportPatch {
    pub state: Option<String>,
    pub district: Option<String>,
    pub village: Option<String>,
    pub ph: Option<Decimal>,
    pub nitrogen: Option<Decimal>,
    pub phosphorus: Option<Decimal>,
    pub potassium: Option<Decimal>,
}

impl SoilReportPatch {
    /// True when no field is present; such a patch is a no-op.
    pub fn is_empty(&self) -> bool {
        self.state.is_none()
            && self.district.is_none()
            && self.village.is_none()
            && self.ph.is_none()
            && self.nitrogen.is_none()
            && self.phosphorus.is_none()
            && self.potassium.is_none()
    }
}
