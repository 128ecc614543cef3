//! Field-level invariants for soil report payloads.
//!
//! Validation collects *every* violated field before failing, so the caller
//! can surface all problems in a single response. Creation uses the stricter
//! rules (nutrients strictly positive, location names at least 2 chars);
//! updates use the looser ones (nutrients >= 0, location names at least 1
//! char) and only check fields that are actually present.

use crate::error::{FieldViolation, ValidationError};
use crate::report::{NewSoilReport, SoilReportPatch};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Upper bound on state/district/village length, after trimming.
pub const MAX_LOCATION_LEN: usize = 100;

/// Upper bound on nutrient values (mg/kg).
pub const MAX_NUTRIENT: Decimal = dec!(999999.99);

const PH_MIN: Decimal = dec!(0);
const PH_MAX: Decimal = dec!(14);

/// True when a value carries more than 2 meaningful fractional digits.
fn exceeds_scale(value: Decimal) -> bool {
    value.normalize().scale() > 2
}

fn check_location(
    out: &mut Vec<FieldViolation>,
    field: &'static str,
    value: &str,
    min_len: usize,
) -> String {
    let trimmed = value.trim();
    if trimmed.chars().count() < min_len {
        out.push(FieldViolation::new(
            field,
            format!("must be at least {min_len} characters"),
        ));
    }
    if trimmed.chars().count() > MAX_LOCATION_LEN {
        out.push(FieldViolation::new(
            field,
            format!("cannot exceed {MAX_LOCATION_LEN} characters"),
        ));
    }
    trimmed.to_string()
}

fn check_ph(out: &mut Vec<FieldViolation>, value: Decimal) {
    if value < PH_MIN || value > PH_MAX {
        out.push(FieldViolation::new("ph", "must be between 0 and 14"));
    } else if exceeds_scale(value) {
        out.push(FieldViolation::new(
            "ph",
            "must have at most 2 decimal places",
        ));
    }
}

fn check_nutrient(
    out: &mut Vec<FieldViolation>,
    field: &'static str,
    value: Decimal,
    strictly_positive: bool,
) {
    if strictly_positive && value <= Decimal::ZERO {
        out.push(FieldViolation::new(field, "must be positive"));
    } else if value < Decimal::ZERO {
        out.push(FieldViolation::new(field, "cannot be negative"));
    } else if value > MAX_NUTRIENT {
        out.push(FieldViolation::new(field, "value too high"));
    } else if exceeds_scale(value) {
        out.push(FieldViolation::new(
            field,
            "must have at most 2 decimal places",
        ));
    }
}

/// Validates a creation payload against the strict invariants and returns
/// a normalized copy (location fields trimmed) ready for persistence.
pub fn validate_new_report(report: &NewSoilReport) -> Result<NewSoilReport, ValidationError> {
    let mut violations = Vec::new();

    let state = check_location(&mut violations, "state", &report.state, 2);
    let district = check_location(&mut violations, "district", &report.district, 2);
    let village = check_location(&mut violations, "village", &report.village, 2);
    check_ph(&mut violations, report.ph);
    check_nutrient(&mut violations, "nitrogen", report.nitrogen, true);
    check_nutrient(&mut violations, "phosphorus", report.phosphorus, true);
    check_nutrient(&mut violations, "potassium", report.potassium, true);

    if !violations.is_empty() {
        return Err(ValidationError::new(violations));
    }

    Ok(NewSoilReport {
        state,
        district,
        village,
        ph: report.ph,
        nitrogen: report.nitrogen,
        phosphorus: report.phosphorus,
        potassium: report.potassium,
    })
}

/// Validates a partial update. Only present fields are checked; a normalized
/// copy of the patch is returned on success.
pub fn validate_patch(patch: &SoilReportPatch) -> Result<SoilReportPatch, ValidationError> {
    let mut violations = Vec::new();
    let mut normalized = patch.clone();

    if let Some(state) = &patch.state {
        normalized.state = Some(check_location(&mut violations, "state", state, 1));
    }
    if let Some(district) = &patch.district {
        normalized.district = Some(check_location(&mut violations, "district", district, 1));
    }
    if let Some(village) = &patch.village {
        normalized.village = Some(check_location(&mut violations, "village", village, 1));
    }
    if let Some(ph) = patch.ph {
        check_ph(&mut violations, ph);
    }
    if let Some(nitrogen) = patch.nitrogen {
        check_nutrient(&mut violations, "nitrogen", nitrogen, false);
    }
    if let Some(phosphorus) = patch.phosphorus {
        check_nutrient(&mut violations, "phosphorus", phosphorus, false);
    }
    if let Some(potassium) = patch.potassium {
        check_nutrient(&mut violations, "potassium", potassium, false);
    }

    if violations.is_empty() {
        Ok(normalized)
    } else {
        Err(ValidationError::new(violations))
    }
}
