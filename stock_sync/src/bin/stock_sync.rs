use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use jquants_client::models::{
    DailyQuotesQuery, DailyQuotesResponse, Date, ListBrandsQuery, ListBrandsResponse,
};
use stock_sync::{
    config::{self, AppConfig, JQuantsConfig},
    db::{
        connection::{DbConfig, connect_postgres},
        migrate,
    },
    ingest, logging, snapshot,
};
use tracing::{debug, info};

#[derive(Parser)]
#[command(version, about = "J-Quants to PostgreSQL stock data sync")]
struct Cli {
    /// Default log filter when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Refresh all brands, then load every daily quote for DATE.
    UpdateStockInfo {
        /// Trading date, YYYY-MM-DD. Defaults to today in Asia/Tokyo.
        date: Option<String>,
    },
    /// Create or upgrade the `brands` and `prices` tables.
    Migrate,
    /// Download API data to a JSON file without touching the database.
    Fetch(FetchCmd),
    /// Upsert a JSON file written by `fetch`.
    Load(LoadCmd),
}

#[derive(Args)]
struct FetchCmd {
    #[command(subcommand)]
    sub: FetchSub,
}

#[derive(Subcommand)]
enum FetchSub {
    Brands {
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        date: Option<Date>,
    },
    DailyQuotes {
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        date: Option<Date>,
        #[arg(long, requires = "to")]
        from: Option<Date>,
        #[arg(long, requires = "from")]
        to: Option<Date>,
    },
}

#[derive(Args)]
struct LoadCmd {
    #[command(subcommand)]
    sub: LoadSub,
}

#[derive(Subcommand)]
enum LoadSub {
    Brands {
        #[arg(long, value_name = "FILE")]
        file: PathBuf,
    },
    DailyQuotes {
        #[arg(long, value_name = "FILE")]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let dotenv = config::load_dotenv().context("failed to load .env")?;
    logging::init(&cli.log_level);
    if let Some(path) = dotenv {
        debug!(path = %path.display(), "loaded .env");
    }

    match cli.cmd {
        Cmd::UpdateStockInfo { date } => {
            let date = ingest::target_date(date.as_deref(), Utc::now())?;
            let config = AppConfig::from_env()?;

            let mut client = config.jquants.client()?;
            let mut conn = connect_postgres(&config.db).await?;
            let report = ingest::update_stock_info(&mut client, &mut conn, date).await?;
            info!(
                %date,
                brands = report.brands,
                prices = report.prices,
                pages = report.pages,
                "stock info updated"
            );
        }
        Cmd::Migrate => {
            let config = DbConfig::from_env()?;
            let applied = tokio::task::spawn_blocking(move || migrate::run_postgres(&config))
                .await
                .context("migration task panicked")??;
            for version in applied {
                info!(%version, "applied migration");
            }
        }
        Cmd::Fetch(FetchCmd { sub }) => {
            let mut client = JQuantsConfig::from_env()?.client()?;
            client.login().await?;

            match sub {
                FetchSub::Brands { out, code, date } => {
                    let response = client.list_brands(&ListBrandsQuery { code, date }).await?;
                    snapshot::write_json(&out, &response)?;
                }
                FetchSub::DailyQuotes {
                    out,
                    code,
                    date,
                    from,
                    to,
                } => {
                    let query = DailyQuotesQuery {
                        code,
                        date,
                        from,
                        to,
                        pagination_key: None,
                    };
                    let daily_quotes = client.daily_quote_pages(query).collect_all().await?;
                    let response = DailyQuotesResponse {
                        daily_quotes,
                        pagination_key: None,
                    };
                    snapshot::write_json(&out, &response)?;
                }
            }
        }
        Cmd::Load(LoadCmd { sub }) => {
            let config = DbConfig::from_env()?;
            let mut conn = connect_postgres(&config).await?;

            let written = match sub {
                LoadSub::Brands { file } => {
                    let response: ListBrandsResponse = snapshot::read_json(&file)?;
                    ingest::store_brands(&mut conn, response.brands).await?
                }
                LoadSub::DailyQuotes { file } => {
                    let response: DailyQuotesResponse = snapshot::read_json(&file)?;
                    ingest::store_quotes(&mut conn, response.daily_quotes).await?
                }
            };
            info!(rows = written, "snapshot loaded");
        }
    }

    Ok(())
}
