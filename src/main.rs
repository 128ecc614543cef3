use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use comfy_table::Table;
use configuration::load_settings;
use database::connection::{ConnectionManager, run_migrations};
use database::repository::SoilReportRepository;
use database::{Page, ReportFilter, fixtures};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// The main entry point for the soiltrack application.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file, when one exists.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let settings = load_settings()?;

    // Bring up the single shared connection and make sure the schema exists.
    let manager = Arc::new(ConnectionManager::new(settings.database.clone()));
    manager.connect().await?;
    let pool = manager.pool().await?;
    run_migrations(&pool).await?;

    let repository = SoilReportRepository::new(manager.clone(), &settings.retry);

    let result = match cli.command {
        Commands::Health => handle_health(&manager).await,
        Commands::List(args) => handle_list(args, &repository).await,
        Commands::Seed => handle_seed(&repository).await,
    };

    // The shutdown path disconnects exactly once; a repeated call would be
    // a no-op anyway.
    manager.disconnect().await;
    result
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Record and query soil-test measurements.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe the database connection and report its readiness.
    Health,
    /// List soil reports, optionally filtered and paginated.
    List(ListArgs),
    /// Reset the table and insert the sample fixture reports.
    Seed,
}

#[derive(Parser)]
struct ListArgs {
    /// Case-insensitive substring filter on the state name.
    #[arg(long)]
    state: Option<String>,

    /// Case-insensitive substring filter on the district name.
    #[arg(long)]
    district: Option<String>,

    /// Case-insensitive substring filter on the village name.
    #[arg(long)]
    village: Option<String>,

    /// Inclusive lower bound on pH.
    #[arg(long)]
    ph_min: Option<Decimal>,

    /// Inclusive upper bound on pH.
    #[arg(long)]
    ph_max: Option<Decimal>,

    /// Inclusive lower bound on nitrogen (mg/kg).
    #[arg(long)]
    nitrogen_min: Option<Decimal>,

    /// Inclusive upper bound on nitrogen (mg/kg).
    #[arg(long)]
    nitrogen_max: Option<Decimal>,

    /// Inclusive lower bound on phosphorus (mg/kg).
    #[arg(long)]
    phosphorus_min: Option<Decimal>,

    /// Inclusive upper bound on phosphorus (mg/kg).
    #[arg(long)]
    phosphorus_max: Option<Decimal>,

    /// Inclusive lower bound on potassium (mg/kg).
    #[arg(long)]
    potassium_min: Option<Decimal>,

    /// Inclusive upper bound on potassium (mg/kg).
    #[arg(long)]
    potassium_max: Option<Decimal>,

    /// Only reports created on or after this date (format: YYYY-MM-DD).
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Only reports created on or before this date (format: YYYY-MM-DD).
    #[arg(long)]
    to: Option<NaiveDate>,

    /// 1-based page number.
    #[arg(long)]
    page: Option<i64>,

    /// Rows per page.
    #[arg(long)]
    limit: Option<i64>,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_health(manager: &ConnectionManager) -> anyhow::Result<()> {
    if manager.health_check().await {
        println!("ok");
        Ok(())
    } else {
        anyhow::bail!("database is unavailable")
    }
}

async fn handle_list(args: ListArgs, repository: &SoilReportRepository) -> anyhow::Result<()> {
    let filter = ReportFilter {
        state: args.state,
        district: args.district,
        village: args.village,
        ph_min: args.ph_min,
        ph_max: args.ph_max,
        nitrogen_min: args.nitrogen_min,
        nitrogen_max: args.nitrogen_max,
        phosphorus_min: args.phosphorus_min,
        phosphorus_max: args.phosphorus_max,
        potassium_min: args.potassium_min,
        potassium_max: args.potassium_max,
        start_date: args.from.map(start_of_day),
        end_date: args.to.map(end_of_day),
    };
    let page = Page::new(args.page, args.limit).map_err(database::StoreError::from)?;

    let (reports, total) = repository.find_all(&filter, page).await?;

    let mut table = Table::new();
    table.set_header(vec![
        "id",
        "state",
        "district",
        "village",
        "ph",
        "nitrogen",
        "phosphorus",
        "potassium",
        "created",
    ]);
    for report in &reports {
        table.add_row(vec![
            report.id.to_string(),
            report.state.clone(),
            report.district.clone(),
            report.village.clone(),
            report.ph.to_string(),
            report.nitrogen.to_string(),
            report.phosphorus.to_string(),
            report.potassium.to_string(),
            report.timestamp.to_rfc3339(),
        ]);
    }
    println!("{table}");
    println!(
        "page {} of {} ({} total)",
        page.page,
        total.div_ceil(u64::from(page.limit)).max(1),
        total
    );
    Ok(())
}

async fn handle_seed(repository: &SoilReportRepository) -> anyhow::Result<()> {
    let created = fixtures::seed(repository).await?;
    println!("seeded {} soil reports", created.len());
    Ok(())
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .expect("midnight is always a valid time")
        .and_utc()
}

// Last representable microsecond of the day, so an inclusive bound covers
// records created in the final second's sub-second range.
fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_micro_opt(23, 59, 59, 999_999)
        .expect("a valid end-of-day time")
        .and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_bounds_cover_the_whole_day() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let start = start_of_day(date);
        let end = end_of_day(date);

        let late_write = date.and_hms_micro_opt(23, 59, 59, 500_000).unwrap().and_utc();
        assert!(late_write > start);
        assert!(late_write <= end);

        let next_midnight = start_of_day(date.succ_opt().unwrap());
        assert!(end < next_midnight);
    }
}
