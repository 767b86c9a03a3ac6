use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::info;

use rentcal::config::Policy;
use rentcal::model::Outfit;
use rentcal::record::BookingRecord;
use rentcal::studio::{StudioQuery, StudioRegistry};

const STUDIO: &str = "local";

#[derive(Parser)]
#[command(name = "rentcal", about = "Check outfit availability against an order snapshot")]
struct Args {
    /// Cleaning days applied after each booking.
    #[arg(long, global = true, env = "RENTCAL_BUFFER_DAYS", default_value_t = 0)]
    buffer_days: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the verdict for the snapshot's `query` as JSON.
    Check { snapshot: PathBuf },
    /// Print the half-day colouring of one month.
    Calendar {
        snapshot: PathBuf,
        /// Month as YYYY-MM.
        #[arg(long)]
        month: String,
        #[arg(long)]
        size: Option<String>,
    },
}

/// `{ "outfits": [...], "bookings": [...], "query": {...} }`
#[derive(Deserialize)]
struct SnapshotFile {
    outfits: Vec<Outfit>,
    #[serde(default)]
    bookings: Vec<BookingRecord>,
    #[serde(default)]
    query: Option<StudioQuery>,
}

fn parse_month(s: &str) -> Option<(i32, u32)> {
    let (year, month) = s.trim().split_once('-')?;
    Some((year.parse().ok()?, month.parse().ok()?))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let policy = Policy {
        buffer_days: args.buffer_days,
    };
    info!("buffer_days: {}", policy.buffer_days);

    let path = match &args.command {
        Command::Check { snapshot } | Command::Calendar { snapshot, .. } => snapshot,
    };
    let file: SnapshotFile = serde_json::from_slice(&std::fs::read(path)?)?;

    let registry = StudioRegistry::new(policy);
    let stats = registry.load(STUDIO, &file.bookings, file.outfits)?;
    info!("loaded {} bookings, skipped {}", stats.loaded, stats.skipped);

    match &args.command {
        Command::Check { .. } => {
            let query = file.query.ok_or("snapshot has no `query`")?;
            let result = registry.check(STUDIO, &query)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Calendar { month, size, .. } => {
            let (year, month) = parse_month(month).ok_or("month must be YYYY-MM")?;
            let outfit = match &file.query {
                Some(q) => q.outfit.clone(),
                None => registry
                    .snapshot(STUDIO)
                    .and_then(|s| s.outfits().first().map(|o| o.id.clone()))
                    .ok_or("snapshot has no outfits")?,
            };
            let grid = registry.month_grid(STUDIO, &outfit, size.as_deref(), year, month)?;
            for cell in grid {
                println!("{}  AM {:<8} PM {}", cell.date, cell.am.as_str(), cell.pm.as_str());
            }
        }
    }

    Ok(())
}
