pub mod cli;
pub mod core;
pub mod market;
pub mod providers;
pub mod store;

use crate::cli::users::UserAction;
use crate::core::config::AppConfig;
use crate::core::series::DateRange;
use crate::market::MarketData;
use crate::store::UserStore;
use anyhow::Result;
use tracing::{debug, info};

/// Date bounds are `YYYYMMDD`; a missing bound falls back to the last 30 days.
pub enum AppCommand {
    Stock {
        symbols: Vec<String>,
        start: Option<String>,
        end: Option<String>,
        moving_averages: Option<Vec<usize>>,
        bollinger: bool,
    },
    Recent {
        symbol: String,
        days: usize,
        moving_averages: Option<Vec<usize>>,
    },
    Fx {
        start: Option<String>,
        end: Option<String>,
        reconcile: bool,
        bollinger: bool,
    },
    Gold {
        start: Option<String>,
        end: Option<String>,
        bollinger: bool,
    },
    Financials {
        code: String,
    },
    Nasdaq {
        symbol: Option<String>,
        limit: usize,
    },
    Decliners {
        count: usize,
    },
    Notify {
        message: String,
    },
    Users(UserAction),
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("kmarket starting...");

    let config = AppConfig::load_or_default(config_path)?;
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Stock {
            symbols,
            start,
            end,
            moving_averages,
            bollinger,
        } => {
            let range = DateRange::from_optional(start.as_deref(), end.as_deref())?;
            let windows = moving_averages.unwrap_or_else(|| config.moving_averages.clone());
            let market = MarketData::from_config(&config)?;
            cli::stock::run(&market, &symbols, &range, &windows, bollinger).await
        }
        AppCommand::Recent {
            symbol,
            days,
            moving_averages,
        } => {
            let windows = moving_averages.unwrap_or_else(|| config.moving_averages.clone());
            let market = MarketData::from_config(&config)?;
            cli::stock::run_recent(&market, &symbol, days, &windows).await
        }
        AppCommand::Fx {
            start,
            end,
            reconcile,
            bollinger,
        } => {
            let range = DateRange::from_optional(start.as_deref(), end.as_deref())?;
            let market = MarketData::from_config(&config)?;
            cli::index::run_fx(&market, &range, reconcile, bollinger).await
        }
        AppCommand::Gold {
            start,
            end,
            bollinger,
        } => {
            let range = DateRange::from_optional(start.as_deref(), end.as_deref())?;
            let market = MarketData::from_config(&config)?;
            cli::index::run_gold(&market, &range, bollinger).await
        }
        AppCommand::Financials { code } => {
            let market = MarketData::from_config(&config)?;
            cli::financials::run(&market, &code).await
        }
        AppCommand::Nasdaq { symbol, limit } => {
            let market = MarketData::from_config(&config)?;
            cli::listing::run_nasdaq(&market, symbol.as_deref(), limit).await
        }
        AppCommand::Decliners { count } => {
            let market = MarketData::from_config(&config)?;
            cli::listing::run_decliners(&market, count).await
        }
        AppCommand::Notify { message } => cli::notify::run(&config, &message).await,
        AppCommand::Users(action) => {
            let path = config.default_database_path()?;
            debug!("Using database at {}", path.display());
            let store = UserStore::open(&path).await?;
            let result = cli::users::run(&store, action).await;
            store.close().await;
            result
        }
    }
}
