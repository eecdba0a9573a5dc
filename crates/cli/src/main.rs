// Stridebook CLI - Day Book reconciliation from the command line

mod daybook;
mod exit_codes;

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use stridebook_client::{EditError, FetchError};
use stridebook_daybook::coerce::{parse_date, parse_minor};
use stridebook_daybook::DayBookError;

use exit_codes::{
    edit_exit_code, fetch_exit_code, EXIT_CONFIG_INVALID, EXIT_CONFIG_MISSING, EXIT_ERROR,
    EXIT_SUCCESS, EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "stridebook")]
#[command(about = "Reconcile a store's Day Book from the booking API, ledger and overrides")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.config/stridebook/config.toml)
    #[arg(long, global = true, env = "STRIDEBOOK_CONFIG")]
    config: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Errors only on stderr
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, merge and total the Day Book for a location and date range
    #[command(after_help = "\
Examples:
  stridebook reconcile --location L01 --from 2025-03-01
  stridebook reconcile --location L01 --from 2025-03-01 --to 2025-03-07 --category return
  stridebook reconcile --location L01 --from 2025-03-01 --denomination 500=12,100=7,10=4
  stridebook reconcile --location L01 --from 2025-03-01 --json --strict")]
    Reconcile {
        /// Store location code
        #[arg(long, short = 'l')]
        location: String,

        /// First day (YYYY-MM-DD)
        #[arg(long, value_parser = date_arg)]
        from: NaiveDate,

        /// Last day, inclusive (default: same as --from)
        #[arg(long, value_parser = date_arg)]
        to: Option<NaiveDate>,

        /// Only count this category ("all" for every category)
        #[arg(long, default_value = "all")]
        category: String,

        /// Only count this sub-category ("all" for every sub-category)
        #[arg(long, default_value = "all")]
        sub_category: String,

        /// Cash counted in the drawer, in rupees
        #[arg(long, value_parser = amount_arg, conflicts_with = "denomination")]
        physical_cash: Option<i64>,

        /// Drawer count as DENOM=COUNT pairs, e.g. 500=3,100=2
        #[arg(long)]
        denomination: Option<String>,

        /// Print the Day Book as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Exit non-zero when any source was unavailable
        #[arg(long)]
        strict: bool,
    },

    /// Print the date whose closing snapshot opens a given day
    #[command(after_help = "\
Examples:
  stridebook opening-date 2025-03-01     # 2025-02-28
  stridebook opening-date 2025-01-01     # 2025-01-01 (epoch floor)")]
    OpeningDate {
        /// First day of the requested range (YYYY-MM-DD)
        #[arg(value_parser = date_arg)]
        date: NaiveDate,
    },

    /// Correct the channel split of one transaction
    #[command(after_help = "\
Amounts are in rupees. Every channel not given is set to 0.

Examples:
  stridebook edit --location L01 --date 2025-03-01 --invoice B-100 --category booking --cash 3000 --upi 2200
  stridebook edit -l L01 --date 2025-03-01 --invoice RO-5 --category rentout --cash 4000 --security 4000")]
    Edit {
        #[arg(long, short = 'l')]
        location: String,

        /// Transaction date (YYYY-MM-DD)
        #[arg(long, value_parser = date_arg)]
        date: NaiveDate,

        /// Invoice number of the transaction
        #[arg(long)]
        invoice: String,

        /// Transaction category (booking, rentout, return, cancel, income, expense, ...)
        #[arg(long)]
        category: String,

        #[arg(long, value_parser = amount_arg, default_value = "0", allow_hyphen_values = true)]
        cash: i64,

        #[arg(long, value_parser = amount_arg, default_value = "0", allow_hyphen_values = true)]
        bank: i64,

        #[arg(long, value_parser = amount_arg, default_value = "0", allow_hyphen_values = true)]
        upi: i64,

        #[arg(long, value_parser = amount_arg, default_value = "0", allow_hyphen_values = true)]
        rbl: i64,

        /// Security deposit (rent-out rows)
        #[arg(long, value_parser = amount_arg)]
        security: Option<i64>,

        /// Balance payable (rent-out rows)
        #[arg(long, value_parser = amount_arg)]
        balance: Option<i64>,

        #[arg(long)]
        remark: Option<String>,

        /// Print the edited transaction as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Config file operations
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Parse and validate the config, then print the effective settings
    Check,
}

fn date_arg(s: &str) -> Result<NaiveDate, String> {
    parse_date(s).ok_or_else(|| format!("'{s}' is not a date (expected YYYY-MM-DD)"))
}

fn amount_arg(s: &str) -> Result<i64, String> {
    parse_minor(s).ok_or_else(|| format!("'{s}' is not an amount"))
}

fn init_logging(verbose: u8, quiet: bool) {
    let default = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    let filter = EnvFilter::try_from_env("STRIDEBOOK_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let ctx = daybook::Context {
        config_path: cli.config,
        quiet: cli.quiet,
    };

    let result = match cli.command {
        Commands::Reconcile {
            location,
            from,
            to,
            category,
            sub_category,
            physical_cash,
            denomination,
            json,
            strict,
        } => daybook::cmd_reconcile(
            &ctx,
            daybook::ReconcileArgs {
                location,
                from,
                to: to.unwrap_or(from),
                category,
                sub_category,
                physical_cash,
                denomination,
                json,
                strict,
            },
        ),
        Commands::OpeningDate { date } => daybook::cmd_opening_date(&ctx, date),
        Commands::Edit {
            location,
            date,
            invoice,
            category,
            cash,
            bank,
            upi,
            rbl,
            security,
            balance,
            remark,
            json,
        } => daybook::cmd_edit(
            &ctx,
            daybook::EditArgs {
                location,
                date,
                invoice,
                category,
                settlement: stridebook_daybook::Settlement { cash, bank, upi, rbl },
                security,
                balance,
                remark,
                json,
            },
        ),
        Commands::Config { command } => match command {
            ConfigCommands::Check => daybook::cmd_config_check(&ctx),
        },
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("error: {}", e.message);
            if let Some(hint) = &e.hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(e.code)
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    /// Create error from a config load failure with the matching exit code.
    pub fn config(err: DayBookError) -> Self {
        match err {
            DayBookError::Io(_) => Self::new(EXIT_CONFIG_MISSING, err.to_string())
                .with_hint("pass --config or set STRIDEBOOK_CONFIG to an existing file"),
            DayBookError::ConfigParse(_) | DayBookError::ConfigValidation(_) => {
                Self::new(EXIT_CONFIG_INVALID, err.to_string())
                    .with_hint("run `stridebook config check` to see the effective settings")
            }
            other => Self::general(other.to_string()),
        }
    }

    pub fn daybook(err: DayBookError) -> Self {
        match err {
            DayBookError::DateRange { .. } | DayBookError::UnknownDenomination(_) => {
                Self::usage(err.to_string())
            }
            DayBookError::ConfigValidation(_) => Self::usage(err.to_string()),
            other => Self::general(other.to_string()),
        }
    }

    pub fn fetch(err: FetchError) -> Self {
        let code = fetch_exit_code(&err);
        let hint = match &err {
            FetchError::Auth { .. } => {
                Some("check the env var named by api.api_key_env in the config".to_string())
            }
            FetchError::Transport { .. } => {
                Some("are api.booking_base_url and api.ledger_base_url reachable?".to_string())
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    pub fn edit(err: EditError) -> Self {
        let code = edit_exit_code(&err);
        let hint = match &err {
            EditError::NotFound(_) => {
                Some("run `stridebook reconcile` for that day to list invoices and categories".to_string())
            }
            EditError::Materialize(_) | EditError::Update(_) => {
                Some("nothing was changed; retry once the ledger is reachable".to_string())
            }
            EditError::MissingId(_) => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
