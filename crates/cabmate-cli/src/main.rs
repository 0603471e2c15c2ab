mod display;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use cabmate_core::{ArityPolicy, MatchWindow, ParseOptions, RecordFilter, RecordId};
use cabmate_store::{
    JsonFileRepository, PartnerRequest, RecordStore, ServiceConfig, StoreConfig, StoreError,
    SystemClock, TargetSpec, TravelService,
};
use cabmate_sync::FeedClient;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "cabmate", version, about = "Find people sharing your trip from the travel sheet")]
struct Cli {
    /// Published CSV export of the travel sheet.
    #[arg(long, env = "CABMATE_FEED_URL")]
    feed_url: String,

    /// Seconds a fetch stays fresh before the feed is checked again.
    #[arg(long, env = "CABMATE_FRESHNESS_SECS", default_value_t = 30)]
    freshness_secs: u64,

    /// Upper bound on one feed request, in seconds.
    #[arg(long, env = "CABMATE_TIMEOUT_SECS", default_value_t = 10)]
    timeout_secs: u64,

    /// Accept rows with more fields than the header.
    #[arg(long, env = "CABMATE_LENIENT")]
    lenient: bool,

    /// JSON file mirroring the last fetched records.
    #[arg(long, env = "CABMATE_CACHE_FILE")]
    cache_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List travellers, optionally filtered.
    Records {
        /// Matches name, contact, place, or flight/train number.
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        place: Option<String>,
        /// Fetch even if the cache is fresh.
        #[arg(long)]
        refresh: bool,
        #[arg(long)]
        json: bool,
    },
    /// Report whether the feed changed since a known fingerprint.
    Check {
        #[arg(long)]
        hash: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Find compatible travel partners.
    Partners {
        /// Id of a listed record.
        #[arg(long, conflicts_with_all = ["date", "place", "time", "name"])]
        id: Option<String>,
        #[arg(long, required_unless_present = "id")]
        date: Option<String>,
        #[arg(long, required_unless_present = "id")]
        place: Option<String>,
        /// HH:MM[:SS]; leave out for a flexible departure.
        #[arg(long)]
        time: Option<String>,
        /// Your name as entered in the sheet, to leave yourself out.
        #[arg(long)]
        name: Option<String>,
        #[arg(long, value_enum, default_value_t = WindowPreset::Tight)]
        window: WindowPreset,
        /// Minutes earlier a partner may leave (custom window).
        #[arg(long)]
        before: Option<u32>,
        /// Minutes later a partner may leave (custom window).
        #[arg(long)]
        after: Option<u32>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Poll the feed and report each change.
    Watch {
        #[arg(long, default_value_t = 30)]
        interval_secs: u64,
        /// Fingerprint already seen.
        #[arg(long)]
        hash: Option<String>,
    },
    /// Show cache state for this process (after loading the cache file).
    Status {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum WindowPreset {
    /// ±30 minutes.
    Tight,
    /// ±1 hour.
    OneHour,
    /// ±2 hours.
    TwoHours,
    /// 2 hours before to 1 hour after.
    Legacy,
    /// --before / --after.
    Custom,
}

fn resolve_window(
    preset: WindowPreset,
    before: Option<u32>,
    after: Option<u32>,
) -> anyhow::Result<MatchWindow> {
    let window = match preset {
        WindowPreset::Tight => MatchWindow::tight(),
        WindowPreset::OneHour => MatchWindow::one_hour(),
        WindowPreset::TwoHours => MatchWindow::two_hours(),
        WindowPreset::Legacy => MatchWindow::legacy(),
        WindowPreset::Custom => {
            let (Some(before), Some(after)) = (before, after) else {
                anyhow::bail!("--window custom needs both --before and --after");
            };
            return Ok(MatchWindow::custom(before, after));
        }
    };
    anyhow::ensure!(
        before.is_none() && after.is_none(),
        "--before/--after only apply to --window custom"
    );
    Ok(window)
}

async fn build_service(cli: &Cli) -> anyhow::Result<TravelService> {
    let timeout = Duration::from_secs(cli.timeout_secs);
    let client = FeedClient::new(cli.feed_url.clone(), timeout).context("building feed client")?;

    let config = StoreConfig {
        freshness: Duration::from_secs(cli.freshness_secs),
        fetch_timeout: timeout,
        parse: ParseOptions {
            arity: if cli.lenient {
                ArityPolicy::Lenient
            } else {
                ArityPolicy::Strict
            },
        },
    };
    let mut store = RecordStore::new(Arc::new(client), Arc::new(SystemClock), config);
    if let Some(path) = &cli.cache_file {
        store = store.with_repository(Arc::new(JsonFileRepository::new(path)));
    }
    store
        .warm_start()
        .await
        .context("loading cache file")?;

    Ok(TravelService::new(Arc::new(store), ServiceConfig::default()))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let cli = Cli::parse();
    info!("cabmate v{}", env!("CARGO_PKG_VERSION"));

    let service = build_service(&cli).await?;

    match cli.command {
        Command::Records {
            search,
            date,
            place,
            refresh,
            json,
        } => {
            let fetched = if refresh {
                service.refresh().await
            } else {
                service.get_records().await
            };
            let snapshot = match fetched {
                Ok(snapshot) => snapshot,
                // Listing tolerates a dead feed if there is something to show.
                Err(StoreError::Network(e)) => {
                    let stale = service.store().snapshot().await;
                    if stale.records.is_empty() {
                        return Err(StoreError::Network(e)).context("fetching travel feed");
                    }
                    warn!(error = %e, "feed unavailable; showing cached records");
                    stale.into()
                }
                Err(e) => return Err(e).context("fetching travel feed"),
            };

            let filter = RecordFilter {
                search,
                date,
                destination: place,
            };
            let records = filter.apply(&snapshot.records);
            if json {
                print_json(&records)?;
            } else {
                display::print_records(&snapshot, &records);
            }
        }

        Command::Check { hash, json } => {
            let status = service
                .check_for_updates(hash.as_deref())
                .await
                .context("checking for updates")?;
            if json {
                print_json(&status)?;
            } else {
                display::print_update(&status);
            }
        }

        Command::Partners {
            id,
            date,
            place,
            time,
            name,
            window,
            before,
            after,
            limit,
            json,
        } => {
            let window = resolve_window(window, before, after)?;
            let target = match id {
                Some(id) => TargetSpec::ById(RecordId::from(id.as_str())),
                None => {
                    let departure_time = time.unwrap_or_default();
                    if !json {
                        println!(
                            "Looking for partners on {} to {}, leaving {}",
                            date.as_deref().unwrap_or_default(),
                            place.as_deref().unwrap_or_default(),
                            display::describe_time(&departure_time)
                        );
                    }
                    TargetSpec::ByFields {
                        name,
                        travel_date: date.unwrap_or_default(),
                        departure_time,
                        place: place.unwrap_or_default(),
                    }
                }
            };

            let results = service
                .find_partners(PartnerRequest {
                    target,
                    window: Some(window),
                    limit,
                })
                .await
                .context("finding partners")?;
            if json {
                print_json(&results)?;
            } else {
                display::print_partners(&results);
            }
        }

        Command::Watch {
            interval_secs,
            mut hash,
        } => {
            let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = tokio::signal::ctrl_c() => {
                        info!("stopping watch");
                        break;
                    }
                }

                match service.check_for_updates(hash.as_deref()).await {
                    Ok(status) => {
                        if status.has_changed {
                            display::print_update(&status);
                            hash = status.current_fingerprint.map(|f| f.to_string());
                        }
                    }
                    Err(e) => warn!(error = %e, "update check failed; retrying next tick"),
                }
            }
        }

        Command::Status { json } => {
            let health = service.health().await;
            if json {
                print_json(&health)?;
            } else {
                display::print_health(&health);
            }
        }
    }

    Ok(())
}
