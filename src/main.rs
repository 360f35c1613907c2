use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use kmarket::cli::users::UserAction;
use kmarket::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Daily bars with RSI14 and moving averages
    Stock {
        /// Six-digit KRX codes or Naver foreign tickers (e.g. AAPL.O)
        #[arg(required = true)]
        symbols: Vec<String>,
        /// Start date, YYYYMMDD (default: 30 days ago)
        #[arg(short, long)]
        start: Option<String>,
        /// End date, YYYYMMDD (default: today)
        #[arg(short, long)]
        end: Option<String>,
        /// Moving-average windows, comma separated
        #[arg(long = "ma", value_delimiter = ',')]
        moving_averages: Option<Vec<usize>>,
        /// Append Bollinger Bands (20, 2)
        #[arg(long)]
        bollinger: bool,
    },
    /// The last N trading days for one symbol
    Recent {
        symbol: String,
        #[arg(short, long, default_value_t = 30)]
        days: usize,
        #[arg(long = "ma", value_delimiter = ',')]
        moving_averages: Option<Vec<usize>>,
    },
    /// USD/KRW exchange rate, gap-filled to every calendar day
    Fx {
        #[arg(short, long)]
        start: Option<String>,
        #[arg(short, long)]
        end: Option<String>,
        /// Backfill from Yahoo Finance before interpolating
        #[arg(long)]
        reconcile: bool,
        #[arg(long)]
        bollinger: bool,
    },
    /// Gold futures, Naver merged with Yahoo Finance
    Gold {
        #[arg(short, long)]
        start: Option<String>,
        #[arg(short, long)]
        end: Option<String>,
        #[arg(long)]
        bollinger: bool,
    },
    /// Annual financial statement summary
    Financials { code: String },
    /// Nasdaq stock screener
    Nasdaq {
        /// Only this ticker
        symbol: Option<String>,
        /// Maximum rows to print
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
    },
    /// Today's largest KOSPI decliners
    Decliners {
        #[arg(short = 'n', long, default_value_t = 20)]
        count: usize,
    },
    /// Send a Telegram message
    Notify { message: String },
    /// SQLite users table
    Users {
        #[command(subcommand)]
        action: UsersCommand,
    },
}

#[derive(Subcommand)]
enum UsersCommand {
    /// List every user
    List,
    Add { name: String, age: i64 },
    Find { name: String },
    /// Change the age of every user with this name
    SetAge { name: String, age: i64 },
    Remove { name: String },
}

impl From<UsersCommand> for UserAction {
    fn from(cmd: UsersCommand) -> UserAction {
        match cmd {
            UsersCommand::List => UserAction::List,
            UsersCommand::Add { name, age } => UserAction::Add { name, age },
            UsersCommand::Find { name } => UserAction::Find { name },
            UsersCommand::SetAge { name, age } => UserAction::SetAge { name, age },
            UsersCommand::Remove { name } => UserAction::Remove { name },
        }
    }
}

impl From<Commands> for kmarket::AppCommand {
    fn from(cmd: Commands) -> kmarket::AppCommand {
        match cmd {
            Commands::Stock {
                symbols,
                start,
                end,
                moving_averages,
                bollinger,
            } => kmarket::AppCommand::Stock {
                symbols,
                start,
                end,
                moving_averages,
                bollinger,
            },
            Commands::Recent {
                symbol,
                days,
                moving_averages,
            } => kmarket::AppCommand::Recent {
                symbol,
                days,
                moving_averages,
            },
            Commands::Fx {
                start,
                end,
                reconcile,
                bollinger,
            } => kmarket::AppCommand::Fx {
                start,
                end,
                reconcile,
                bollinger,
            },
            Commands::Gold {
                start,
                end,
                bollinger,
            } => kmarket::AppCommand::Gold {
                start,
                end,
                bollinger,
            },
            Commands::Financials { code } => kmarket::AppCommand::Financials { code },
            Commands::Nasdaq { symbol, limit } => kmarket::AppCommand::Nasdaq { symbol, limit },
            Commands::Decliners { count } => kmarket::AppCommand::Decliners { count },
            Commands::Notify { message } => kmarket::AppCommand::Notify { message },
            Commands::Users { action } => kmarket::AppCommand::Users(action.into()),
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => kmarket::cli::setup::setup_at_path(path),
            None => kmarket::cli::setup::setup(),
        },
        Some(cmd) => kmarket::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
