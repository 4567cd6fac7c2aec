mod commands;
mod config;
mod error;
mod store;

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use clap::{Parser, Subcommand};
use freezer_core::{Freshness, ItemQuery, Location, SortOrder};

use crate::commands::{ItemChanges, NewItem};
use crate::config::{load_config, resolve_environment, resolve_store_config};
use crate::error::FrzError;
use crate::store::{AppContext, StoreType};

#[derive(Parser)]
#[command(name = "frz")]
#[command(about = "Track what is in the freezer", long_about = None)]
struct Cli {
    /// Store type: rocks or memory
    #[arg(long, global = true)]
    store_type: Option<StoreType>,

    /// Path to the item store
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List items, grouped by location
    List {
        /// Only show one location
        #[arg(short, long)]
        location: Option<Location>,

        /// Case-insensitive name search
        #[arg(short, long)]
        search: Option<String>,

        /// Only show items with this freshness: fresh, expiring-soon, expired
        #[arg(long)]
        status: Option<Freshness>,

        /// Hide a location section (repeatable)
        #[arg(long)]
        hide: Vec<Location>,

        /// Sort order: insertion, expiration, expired-first, name, added
        #[arg(long, default_value = "insertion")]
        sort: SortOrder,
    },

    /// Add an item
    Add {
        name: String,

        #[arg(short, long, default_value_t = 1.0)]
        quantity: f64,

        #[arg(short, long, default_value = "pcs")]
        unit: String,

        #[arg(short, long, default_value = "top-drawer")]
        location: Location,

        /// Expiration date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date, conflicts_with = "expires_in")]
        expires: Option<DateTime<Utc>>,

        /// Expiration as days from now
        #[arg(long)]
        expires_in: Option<i64>,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Edit an existing item
    Edit {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(short, long)]
        quantity: Option<f64>,

        #[arg(short, long)]
        unit: Option<String>,

        #[arg(short, long)]
        location: Option<Location>,

        /// Expiration date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        expires: Option<DateTime<Utc>>,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Remove an item
    Rm { id: String },

    /// Remove every item
    Clear,
}

fn parse_date(s: &str) -> Result<DateTime<Utc>, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .map_err(|e| format!("invalid date {s:?}: {e}"))
}

fn expires_after_days(now: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>, FrzError> {
    TimeDelta::try_days(days)
        .and_then(|delta| now.checked_add_signed(delta))
        .ok_or(FrzError::InvalidExpiration(days))
}

async fn run(cli: Cli) -> Result<(), FrzError> {
    let config = load_config()?;
    let environment = resolve_environment(&config)?;
    let (store_type, store_path) = resolve_store_config(&config, cli.store_type, cli.store);
    tracing::debug!(%environment, %store_type, path = %store_path.display(), "opening store");

    let ctx = AppContext::open(store_type, store_path, environment, &config.faults)?;
    ctx.view.load().await?;

    match cli.command {
        Command::List {
            location,
            search,
            status,
            hide,
            sort,
        } => {
            let mut query = ItemQuery::new().with_sort(sort);
            query.location = location;
            query.freshness = status;
            if let Some(search) = search {
                query = query.with_search(search);
            }
            for location in hide {
                query = query.hide_section(location);
            }
            commands::list(&ctx, &query);
        }
        Command::Add {
            name,
            quantity,
            unit,
            location,
            expires,
            expires_in,
            notes,
        } => {
            let expires_on = match (expires, expires_in) {
                (Some(date), _) => date,
                (None, Some(days)) => expires_after_days(Utc::now(), days)?,
                (None, None) => Utc::now(),
            };
            let new_item = NewItem {
                name,
                quantity,
                unit,
                location,
                expires_on,
                notes,
            };
            commands::add(&ctx, new_item).await?;
        }
        Command::Edit {
            id,
            name,
            quantity,
            unit,
            location,
            expires,
            notes,
        } => {
            let changes = ItemChanges {
                name,
                quantity,
                unit,
                location,
                expires_on: expires,
                notes,
            };
            commands::edit(&ctx, &id, changes).await?;
        }
        Command::Rm { id } => commands::remove(&ctx, &id).await?,
        Command::Clear => commands::clear(&ctx).await?,
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) if err.is_simulated() => {
            eprintln!("Could not save your change ({err}). Nothing was modified, please try again.");
            Ok(ExitCode::from(2))
        }
        Err(err) => Err(err.into()),
    }
}
