//! Sample soil reports for seeding a development database and for the
//! integration tests. Seven reports across seven states, exactly one of
//! them from Maharashtra.

use crate::error::StoreError;
use crate::repository::SoilReportRepository;
use core_types::{NewSoilReport, SoilReport};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::info;

fn report(
    state: &str,
    district: &str,
    village: &str,
    ph: Decimal,
    nitrogen: Decimal,
    phosphorus: Decimal,
    potassium: Decimal,
) -> NewSoilReport {
    NewSoilReport {
        state: state.to_string(),
        district: district.to_string(),
        village: village.to_string(),
        ph,
        nitrogen,
        phosphorus,
        potassium,
    }
}

/// The seven-report fixture set.
pub fn sample_reports() -> Vec<NewSoilReport> {
    vec![
        report(
            "Maharashtra",
            "Pune",
            "Wagholi",
            dec!(6.5),
            dec!(280.50),
            dec!(45.20),
            dec!(190.75),
        ),
        report(
            "Karnataka",
            "Belgaum",
            "Sankeshwar",
            dec!(7.2),
            dec!(320.25),
            dec!(52.80),
            dec!(210.40),
        ),
        report(
            "Punjab",
            "Ludhiana",
            "Sahnewal",
            dec!(7.8),
            dec!(425.60),
            dec!(62.30),
            dec!(245.90),
        ),
        report(
            "Gujarat",
            "Ahmedabad",
            "Sanand",
            dec!(7.1),
            dec!(295.40),
            dec!(48.90),
            dec!(185.60),
        ),
        report(
            "Madhya Pradesh",
            "Indore",
            "Depalpur",
            dec!(6.8),
            dec!(310.20),
            dec!(51.40),
            dec!(205.80),
        ),
        report(
            "Uttar Pradesh",
            "Agra",
            "Fatehpur Sikri",
            dec!(7.4),
            dec!(340.80),
            dec!(55.60),
            dec!(225.30),
        ),
        report(
            "Bihar",
            "Patna",
            "Danapur",
            dec!(6.9),
            dec!(290.40),
            dec!(47.80),
            dec!(195.40),
        ),
    ]
}

/// Wipes the table and inserts the fixture set through the normal create
/// path, so the seeded rows carry server-assigned ids and timestamps.
pub async fn seed(repository: &SoilReportRepository) -> Result<Vec<SoilReport>, StoreError> {
    let cleared = repository.clear().await?;
    info!(cleared, "cleared existing soil report records");

    let mut created = Vec::new();
    for payload in sample_reports() {
        created.push(repository.create(&payload).await?);
    }
    info!(count = created.len(), "seeded soil reports");
    Ok(created)
}
