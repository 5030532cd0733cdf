mod render;

pub use render::render_report;

use std::path::PathBuf;

use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};

use crate::config::Settings;
use crate::services::offline::MessageOutcome;
use crate::services::{
    DataLoaderService, Destination, HttpNetwork, JsonFileStore, OfflineCache, ReportPeriod,
    Request, ResponseCacheStore, WorkerMessage,
};

/// Sales dashboard reports with an offline app-shell cache
#[derive(Parser)]
#[command(name = "bizdash")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.bizdash/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory with transactions.json, services.json and clients.json
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Offline cache directory (default: ~/.bizdash/offline)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the sales report (default)
    Report {
        /// Trailing window: 1m, 3m or 1y
        #[arg(long, short, default_value = "3m", value_parser = parse_period)]
        period: ReportPeriod,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage the offline cache
    Offline {
        #[command(subcommand)]
        action: OfflineAction,
    },
}

#[derive(Subcommand)]
enum OfflineAction {
    /// Precache the app shell
    Install,
    /// Delete caches from older versions
    Activate,
    /// Evict expired runtime entries
    Trim,
    /// List caches and their entry counts
    Status,
    /// Answer a request the way the offline cache would
    Fetch {
        /// Request path, e.g. /assets/app.js
        path: String,

        /// Request destination; guessed from the path when omitted
        #[arg(long, value_parser = parse_destination)]
        destination: Option<Destination>,

        /// Treat as a top-level page navigation
        #[arg(long)]
        navigate: bool,

        #[arg(long, default_value = "GET")]
        method: String,
    },
}

fn parse_period(s: &str) -> Result<ReportPeriod, String> {
    s.parse().map_err(|e: crate::types::BizdashError| e.to_string())
}

fn parse_destination(s: &str) -> Result<Destination, String> {
    s.parse().map_err(|e: crate::types::BizdashError| e.to_string())
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        let mut settings =
            Settings::load(self.config.as_deref()).context("failed to load settings")?;
        if let Some(dir) = self.data_dir {
            settings.data_dir = dir;
        }
        if let Some(dir) = self.cache_dir {
            settings.cache_dir = Some(dir);
        }

        match self.command {
            None => run_report(&settings, ReportPeriod::default(), false),
            Some(Commands::Report { period, json }) => run_report(&settings, period, json),
            Some(Commands::Offline { action }) => run_offline(&settings, action),
        }
    }
}

fn run_report(settings: &Settings, period: ReportPeriod, json: bool) -> anyhow::Result<()> {
    let loader = DataLoaderService::new(
        JsonFileStore::new(&settings.data_dir),
        settings.report.clone(),
    );
    let report = loader.load_or_empty(period, Local::now().date_naive());

    match (report, json) {
        (Some(report), true) => println!("{}", serde_json::to_string_pretty(&report)?),
        (Some(report), false) => print!("{}", render_report(&report)),
        (None, true) => println!("null"),
        (None, false) => println!("No report data available."),
    }
    Ok(())
}

fn run_offline(settings: &Settings, action: OfflineAction) -> anyhow::Result<()> {
    let store = match &settings.cache_dir {
        Some(dir) => ResponseCacheStore::with_cache_dir(dir.clone()),
        None => ResponseCacheStore::new()?,
    };
    let network = HttpNetwork::new(settings.origin.as_str())?;
    let cache = OfflineCache::new(store, network, settings.offline.clone());

    match action {
        OfflineAction::Install => {
            let count = cache.install()?;
            println!("Cached {} app shell entries in {}", count, cache.static_cache_name());
        }
        OfflineAction::Activate => {
            if let MessageOutcome::Activated(deleted) =
                cache.handle_message(WorkerMessage::SkipWaiting)?
            {
                println!("Deleted {} stale caches", deleted.len());
                for name in deleted {
                    println!("  {}", name);
                }
            }
        }
        OfflineAction::Trim => {
            if let MessageOutcome::Trimmed(removed) =
                cache.handle_message(WorkerMessage::TrimCache)?
            {
                println!("Removed {} expired entries", removed);
            }
        }
        OfflineAction::Status => {
            let names = cache.store().cache_names()?;
            if names.is_empty() {
                println!("No caches in {}", cache.store().cache_dir().display());
            }
            for name in names {
                println!("{:<32} {:>5} entries", name, cache.store().keys(&name).len());
            }
        }
        OfflineAction::Fetch {
            path,
            destination,
            navigate,
            method,
        } => {
            let mut request = if navigate {
                Request::navigation(path)
            } else {
                Request::get(path)
            }
            .with_method(method);
            if let Some(d) = destination {
                request = request.with_destination(d);
            }

            let response = cache.fetch(&request);
            println!("HTTP {}", response.status);
            for (name, value) in &response.headers {
                println!("{}: {}", name, value);
            }
            println!();
            println!("{}", String::from_utf8_lossy(&response.body));
            cache.settle();
        }
    }
    Ok(())
}
