//! Operational CLI for the group register database.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use register_db::repositories::{GroupRepo, MemberRepo};
use register_db::DbPool;

mod geocode;
mod import;

use geocode::{Geocoder, RATE_LIMIT};

#[derive(Parser)]
#[command(name = "register-admin", about = "Operational tooling for the group register")]
struct Cli {
    /// Postgres connection string.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import a JSON export of the upstream group table.
    ImportGroups {
        /// Path to the JSON export (an array of row objects).
        #[arg(long)]
        file: PathBuf,
        /// Skip Nominatim lookups for in-person rows.
        #[arg(long)]
        skip_geocoding: bool,
    },
    /// Geocode in-person groups that have an address but no coordinates.
    GeocodeMissing,
    /// Hide a group from listings and check-in.
    Archive { id: Uuid },
    /// Restore an archived group.
    Unarchive { id: Uuid },
    /// Print the group table.
    ListGroups {
        /// Include archived groups.
        #[arg(long)]
        all: bool,
    },
    /// Delete members (and their orientation and attendance rows) whose
    /// email belongs to a test domain.
    ClearTestData {
        #[arg(long)]
        email_domain: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "register_admin=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let pool = register_db::create_pool(&cli.database_url)
        .await
        .context("failed to connect to database")?;
    register_db::run_migrations(&pool)
        .await
        .context("failed to run database migrations")?;

    match cli.command {
        Command::ImportGroups {
            file,
            skip_geocoding,
        } => {
            let summary = import::import_file(&pool, &file, skip_geocoding).await?;
            println!(
                "Processed {} rows: {} inserted, {} updated, {} skipped, {} geocoded",
                summary.processed,
                summary.inserted,
                summary.updated,
                summary.skipped,
                summary.geocoded
            );
        }
        Command::GeocodeMissing => geocode_missing(&pool).await?,
        Command::Archive { id } => set_archived(&pool, id, true).await?,
        Command::Unarchive { id } => set_archived(&pool, id, false).await?,
        Command::ListGroups { all } => list_groups(&pool, all).await?,
        Command::ClearTestData { email_domain } => {
            let removed = MemberRepo::purge_by_email_domain(&pool, &email_domain).await?;
            println!("Removed {removed} members with @{email_domain} emails");
        }
    }
    Ok(())
}

async fn geocode_missing(pool: &DbPool) -> anyhow::Result<()> {
    let groups = GroupRepo::list_missing_coordinates(pool).await?;
    if groups.is_empty() {
        println!("All in-person groups with an address already have coordinates");
        return Ok(());
    }

    let geocoder = Geocoder::new()?;
    let mut resolved = 0;
    for group in &groups {
        let Some(address) = group.street_address.as_deref() else {
            continue;
        };
        tokio::time::sleep(RATE_LIMIT).await;
        match geocoder.geocode(address).await {
            Ok(Some(coords)) => {
                GroupRepo::set_coordinates(pool, group.id, coords.latitude, coords.longitude)
                    .await?;
                resolved += 1;
                println!(
                    "{}: {:.6}, {:.6}",
                    group.name, coords.latitude, coords.longitude
                );
            }
            Ok(None) => println!("{}: no match for '{address}'", group.name),
            Err(error) => tracing::warn!(name = %group.name, %error, "geocoding failed"),
        }
    }
    println!("Geocoded {resolved} of {} groups", groups.len());
    Ok(())
}

async fn set_archived(pool: &DbPool, id: Uuid, archived: bool) -> anyhow::Result<()> {
    if GroupRepo::set_archived(pool, id, archived).await? {
        println!(
            "Group {id} {}",
            if archived { "archived" } else { "unarchived" }
        );
    } else {
        anyhow::bail!("no group with id {id}");
    }
    Ok(())
}

async fn list_groups(pool: &DbPool, all: bool) -> anyhow::Result<()> {
    let groups = if all {
        GroupRepo::list_all(pool).await?
    } else {
        GroupRepo::list_active(pool).await?
    };

    for group in &groups {
        let day = group
            .meeting_day
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        let time = group
            .meeting_time
            .map(|t| t.format("%H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let flags = if group.archived { " [archived]" } else { "" };
        println!(
            "{}  {:<10} day {} at {}  {}{}",
            group.id, group.format, day, time, group.name, flags
        );
    }
    println!("{} groups", groups.len());
    Ok(())
}
