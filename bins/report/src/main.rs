//! Ledgerline report CLI
//!
//! Loads a JSON ledger snapshot and prints balances, reports, EMI
//! schedules and recurring due dates as JSON.

use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use ledgerline_core::emi::ScheduleRow;
use ledgerline_core::reconcile::MatchTolerance;
use ledgerline_db::MemoryStore;
use ledgerline_db::repositories::{
    EmiRepository, Grouping, RecurringPaymentRepository, ReportRepository,
};
use ledgerline_shared::AppConfig;
use ledgerline_shared::types::{EmiId, RecurringPaymentId, UserId};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ledgerline")]
#[command(about = "Ledger balances, time-series reports and EMI schedules")]
struct Cli {
    /// Path to the ledger snapshot
    #[arg(short, long, default_value = "ledger.json")]
    snapshot: PathBuf,

    /// User whose ledger is reported
    #[arg(short, long)]
    user: UserId,

    /// IANA timezone for calendar buckets (defaults to the configured one)
    #[arg(long)]
    tz: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Balances of every account and friend at an instant
    Balances {
        /// RFC 3339 instant; omitted means baselines only
        #[arg(long)]
        as_of: Option<DateTime<Utc>>,
    },
    /// Balances over one window [start, end)
    Window {
        /// Inclusive start
        #[arg(long)]
        start: Option<DateTime<Utc>>,
        /// Exclusive end
        #[arg(long)]
        end: Option<DateTime<Utc>>,
    },
    /// Time series by calendar unit, or by saved boundaries
    Buckets {
        /// day, week, month, quarter, year or boundaries
        unit: String,
        /// Inclusive start
        #[arg(long)]
        start: Option<DateTime<Utc>>,
        /// Exclusive end
        #[arg(long)]
        end: Option<DateTime<Utc>>,
    },
    /// Amortization schedule of an EMI
    Schedule {
        /// The EMI
        emi_id: EmiId,
    },
    /// Outstanding state of an EMI given its linked statements
    Status {
        /// The EMI
        emi_id: EmiId,
    },
    /// Due dates of a recurring payment, or the one a payment settles
    Due {
        /// The recurring payment
        recurring_id: RecurringPaymentId,
        /// First day listed
        #[arg(long)]
        from: NaiveDate,
        /// Last day listed
        #[arg(long)]
        to: NaiveDate,
        /// Match a payment made on this day to its due date instead
        #[arg(long)]
        paid_on: Option<NaiveDate>,
    },
}

fn grouping(unit: &str) -> Result<Grouping> {
    if unit.trim().eq_ignore_ascii_case("boundaries") {
        return Ok(Grouping::Boundaries);
    }
    Ok(Grouping::Unit(unit.parse()?))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ledgerline=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;
    let tz: Tz = match &cli.tz {
        Some(name) => name
            .parse()
            .map_err(|_| anyhow::anyhow!("unknown timezone: {name}"))?,
        None => config.engine.timezone()?,
    };

    let store = MemoryStore::open(&cli.snapshot).await?;
    info!(snapshot = %cli.snapshot.display(), %tz, "ledger loaded");

    let reports = ReportRepository::new(store.clone(), tz);
    let emis = EmiRepository::with_settings(
        store.clone(),
        MatchTolerance::from(&config.reconciliation),
        tz,
    );
    let recurring = RecurringPaymentRepository::new(store, config.recurring.match_window_days);

    let output = match cli.command {
        Command::Balances { as_of } => {
            serde_json::to_string_pretty(&reports.starting_balances(cli.user, as_of).await)?
        }
        Command::Window { start, end } => {
            serde_json::to_string_pretty(&reports.window_report(cli.user, start, end).await?)?
        }
        Command::Buckets { unit, start, end } => {
            let buckets = reports
                .bucketed_report(cli.user, grouping(&unit)?, start, end, Utc::now())
                .await?;
            serde_json::to_string_pretty(&buckets)?
        }
        Command::Schedule { emi_id } => {
            let mut schedule = emis.schedule(cli.user, emi_id).await?;
            schedule.rows = schedule.rows.iter().map(ScheduleRow::rounded).collect();
            serde_json::to_string_pretty(&schedule)?
        }
        Command::Status { emi_id } => {
            serde_json::to_string_pretty(&emis.status(cli.user, emi_id).await?)?
        }
        Command::Due {
            recurring_id,
            from,
            to,
            paid_on,
        } => match paid_on {
            Some(date) => serde_json::to_string_pretty(
                &recurring.match_due_date(cli.user, recurring_id, date).await?,
            )?,
            None => serde_json::to_string_pretty(
                &recurring.due_dates(cli.user, recurring_id, from, to).await?,
            )?,
        },
    };

    println!("{output}");
    Ok(())
}
