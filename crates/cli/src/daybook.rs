//! Day Book commands: reconcile, edit, opening-date, config check.
//!
//! Human-readable output goes to stdout; warnings about unavailable sources
//! go to stderr so `--json` output stays parseable.

use std::path::PathBuf;

use chrono::NaiveDate;
use serde_json::json;

use stridebook_client::{DateWindow, DayBookApi, DayBookSession, Reconciled};
use stridebook_daybook::opening::resolve_opening_date;
use stridebook_daybook::{
    Category, DayBook, DayBookConfig, DayBookParams, DedupKey, DenominationCount, EditPatch,
    Filter, Settlement,
};

use crate::exit_codes::EXIT_FETCH_DEGRADED;
use crate::CliError;

pub struct Context {
    pub config_path: Option<PathBuf>,
    pub quiet: bool,
}

pub struct ReconcileArgs {
    pub location: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub category: String,
    pub sub_category: String,
    pub physical_cash: Option<i64>,
    pub denomination: Option<String>,
    pub json: bool,
    pub strict: bool,
}

pub struct EditArgs {
    pub location: String,
    pub date: NaiveDate,
    pub invoice: String,
    pub category: String,
    pub settlement: Settlement,
    pub security: Option<i64>,
    pub balance: Option<i64>,
    pub remark: Option<String>,
    pub json: bool,
}

// ============================================================================
// Config lookup
// ============================================================================

/// `--config` / `STRIDEBOOK_CONFIG` must exist; the per-user default is
/// optional and falls back to built-in defaults.
fn load_config(ctx: &Context) -> Result<(DayBookConfig, Option<PathBuf>), CliError> {
    if let Some(path) = &ctx.config_path {
        let config = DayBookConfig::load(path).map_err(CliError::config)?;
        return Ok((config, Some(path.clone())));
    }
    match default_config_path() {
        Some(path) if path.is_file() => {
            let config = DayBookConfig::load(&path).map_err(CliError::config)?;
            tracing::debug!(path = %path.display(), "loaded config");
            Ok((config, Some(path)))
        }
        _ => {
            tracing::debug!("no config file, using defaults");
            Ok((DayBookConfig::default(), None))
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("stridebook").join("config.toml"))
}

fn open_session(config: DayBookConfig) -> Result<DayBookSession<DayBookApi>, CliError> {
    let api = DayBookApi::from_config(&config.api).map_err(CliError::fetch)?;
    Ok(DayBookSession::new(api, config))
}

fn reconcile_once(
    session: &DayBookSession<DayBookApi>,
    window: &DateWindow,
    params: &DayBookParams,
) -> Result<DayBook, CliError> {
    match session.reconcile(window, params).map_err(CliError::daybook)? {
        Reconciled::Current(book) => Ok(*book),
        Reconciled::Superseded => Err(CliError::general("reconciliation was superseded")),
    }
}

// ============================================================================
// reconcile
// ============================================================================

pub fn cmd_reconcile(ctx: &Context, args: ReconcileArgs) -> Result<(), CliError> {
    let physical_cash = match (&args.denomination, args.physical_cash) {
        (Some(pairs), _) => {
            let count: DenominationCount = pairs
                .parse()
                .map_err(|e: stridebook_daybook::DayBookError| {
                    CliError::usage(format!("--denomination: {e}"))
                        .with_hint("use DENOM=COUNT pairs of 500, 200, 100, 50, 20, 10, 5, 2, 1")
                })?;
            Some(count.total_minor())
        }
        (None, cash) => cash,
    };

    let (config, _) = load_config(ctx)?;
    let session = open_session(config)?;
    let window = DateWindow::new(&args.location, args.from, args.to);
    let params = DayBookParams {
        filter: Filter::new(&args.category, &args.sub_category),
        physical_cash,
    };
    let book = reconcile_once(&session, &window, &params)?;

    if args.json {
        let out = serde_json::to_string_pretty(&book)
            .map_err(|e| CliError::general(format!("cannot serialize Day Book: {e}")))?;
        println!("{out}");
    } else {
        print_day_book(&book, &params.filter);
    }

    if book.is_degraded() {
        if !ctx.quiet {
            let missing: Vec<&str> = book.degraded.iter().map(|f| f.source.as_str()).collect();
            eprintln!("warning: Day Book is incomplete, unavailable sources: {}", missing.join(", "));
        }
        if args.strict {
            return Err(CliError::new(
                EXIT_FETCH_DEGRADED,
                format!("{} source(s) unavailable", book.degraded.len()),
            )
            .with_hint("rerun without --strict to accept a partial Day Book"));
        }
    }
    Ok(())
}

fn print_day_book(book: &DayBook, filter: &Filter) {
    println!(
        "Day Book {}  {} .. {}  (opening from {})",
        book.location_code, book.from, book.to, book.opening_date
    );
    println!();
    println!(
        "{:<10}  {:<12}  {:<14}  {:<16}  {:>12}  {:>12}  {:>12}  {:>10}  {:>12}  {}",
        "DATE", "INVOICE", "CATEGORY", "SUB-CATEGORY", "CASH", "BANK", "UPI", "RBL", "TOTAL", "SOURCE"
    );
    for txn in book.filtered(filter) {
        println!(
            "{:<10}  {:<12}  {:<14}  {:<16}  {:>12}  {:>12}  {:>12}  {:>10}  {:>12}  {}",
            txn.date_key(),
            truncate(&txn.invoice_key, 12),
            truncate(txn.category.as_str(), 14),
            truncate(&txn.sub_category, 16),
            money(txn.settlement.cash),
            money(txn.settlement.bank),
            money(txn.settlement.upi),
            money(txn.settlement.rbl),
            money(txn.total_transaction),
            txn.source,
        );
    }

    let t = &book.totals;
    println!();
    println!("By category:");
    for row in &book.breakdown {
        println!("  {:<14} {:>4}  {:>12}", row.category, row.count, money(row.total_transaction));
    }
    println!();
    println!("Totals:");
    println!("  opening cash     {:>14}", money(book.closing.opening_cash));
    println!("  cash             {:>14}", money(t.cash));
    println!("  bank             {:>14}", money(t.bank));
    println!("  upi              {:>14}", money(t.upi));
    println!("  rbl              {:>14}", money(t.rbl));
    println!("  security         {:>14}", money(t.security));
    println!("  balance payable  {:>14}", money(t.balance_payable));
    println!("  transactions     {:>14}", money(t.total_transaction));
    println!("  closing cash     {:>14}", money(book.closing.closing_cash));
    if let (Some(physical), Some(diff)) = (book.closing.physical_cash, book.closing.difference) {
        println!("  physical cash    {:>14}", money(physical));
        println!("  difference       {:>14}", money(diff));
    }
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let cut: String = s.chars().take(width.saturating_sub(1)).collect();
        format!("{cut}~")
    }
}

/// Format paise as rupees with two decimals.
pub fn money(minor: i64) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

// ============================================================================
// opening-date
// ============================================================================

pub fn cmd_opening_date(ctx: &Context, date: NaiveDate) -> Result<(), CliError> {
    let (config, _) = load_config(ctx)?;
    println!("{}", resolve_opening_date(date, config.opening.epoch));
    Ok(())
}

// ============================================================================
// edit
// ============================================================================

pub fn cmd_edit(ctx: &Context, args: EditArgs) -> Result<(), CliError> {
    let (config, _) = load_config(ctx)?;
    let session = open_session(config)?;
    let window = DateWindow::new(&args.location, args.date, args.date);
    let params = DayBookParams::default();
    let mut book = reconcile_once(&session, &window, &params)?;

    if book.is_degraded() && !ctx.quiet {
        let missing: Vec<&str> = book.degraded.iter().map(|f| f.source.as_str()).collect();
        eprintln!("warning: editing against an incomplete Day Book ({})", missing.join(", "));
    }

    let key = DedupKey {
        invoice_key: args.invoice.trim().to_string(),
        date: args.date,
        category: Category::parse(&args.category).key(),
    };
    let patch = EditPatch {
        settlement: args.settlement,
        security: args.security,
        balance_payable: args.balance,
        remark: args.remark,
    };

    let outcome = session
        .edit(session.source(), &mut book, &key, &patch, &params)
        .map_err(CliError::edit)?;

    if args.json {
        let out = json!({
            "ledgerId": outcome.ledger_id,
            "materialized": outcome.materialized,
            "transaction": outcome.transaction,
            "totals": book.totals,
        });
        println!("{out:#}");
    } else {
        if outcome.materialized {
            println!("created ledger record {}", outcome.ledger_id);
        }
        let s = &outcome.transaction.settlement;
        println!(
            "updated {} {} {}: cash {} bank {} upi {} rbl {} (total {})",
            outcome.transaction.invoice_key,
            outcome.transaction.date_key(),
            outcome.transaction.category,
            money(s.cash),
            money(s.bank),
            money(s.upi),
            money(s.rbl),
            money(outcome.transaction.total_transaction),
        );
        println!("closing cash now {}", money(book.closing.closing_cash));
    }
    Ok(())
}

// ============================================================================
// config check
// ============================================================================

pub fn cmd_config_check(ctx: &Context) -> Result<(), CliError> {
    let (config, path) = load_config(ctx)?;
    match path.as_deref() {
        Some(p) => println!("config: {}", p.display()),
        None => println!("config: (built-in defaults)"),
    }
    println!("api.booking_base_url = {}", config.api.booking_base_url);
    println!("api.ledger_base_url = {}", config.api.ledger_base_url);
    println!("api.timeout_secs = {}", config.api.timeout_secs);
    match &config.api.api_key_env {
        Some(name) => {
            let state = if std::env::var(name).map(|v| !v.is_empty()).unwrap_or(false) {
                "set"
            } else {
                "not set"
            };
            println!("api.api_key_env = {name} ({state})");
        }
        None => println!("api.api_key_env = (none)"),
    }
    println!("ledger.allowed_categories = {}", config.ledger.allowed_categories.join(", "));
    println!("opening.epoch = {}", config.opening.epoch);
    Ok(())
}
