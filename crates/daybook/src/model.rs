use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, AddAssign};

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Transaction category. Ledger rows may carry any allow-listed label,
/// which lands in `Other` when it is not one of the known kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    Booking,
    RentOut,
    Return,
    Cancel,
    Income,
    Expense,
    MoneyTransfer,
    Other(String),
}

impl Category {
    /// Case-insensitive; ignores spaces, `-` and `_` ("Rent Out" == "rentout").
    pub fn parse(label: &str) -> Self {
        let folded: String = label
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();
        match folded.as_str() {
            "booking" => Self::Booking,
            "rentout" => Self::RentOut,
            "return" => Self::Return,
            "cancel" | "cancellation" => Self::Cancel,
            "income" => Self::Income,
            "expense" => Self::Expense,
            "moneytransfer" => Self::MoneyTransfer,
            _ => Self::Other(label.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Booking => "Booking",
            Self::RentOut => "RentOut",
            Self::Return => "Return",
            Self::Cancel => "Cancel",
            Self::Income => "Income",
            Self::Expense => "Expense",
            Self::MoneyTransfer => "MoneyTransfer",
            Self::Other(label) => label,
        }
    }

    /// Component used in the dedup key. Lowercased so that free-form ledger
    /// labels differing only in case collapse together.
    pub fn key(&self) -> String {
        self.as_str().to_ascii_lowercase()
    }

    /// Case-insensitive equality against a user-supplied filter string.
    pub fn matches(&self, filter: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(filter.trim()) || *self == Category::parse(filter)
    }

    /// Return and Cancel rows carry refunds: channel amounts are never positive.
    pub fn is_refund(&self) -> bool {
        matches!(self, Self::Return | Self::Cancel)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Provenance
// ---------------------------------------------------------------------------

/// Where a transaction came from. Drives precedence, never display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Booking,
    #[serde(rename = "rentout")]
    RentOut,
    Return,
    Deleted,
    #[serde(rename = "mongo")]
    Ledger,
    Edited,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Booking => write!(f, "booking"),
            Self::RentOut => write!(f, "rentout"),
            Self::Return => write!(f, "return"),
            Self::Deleted => write!(f, "deleted"),
            Self::Ledger => write!(f, "mongo"),
            Self::Edited => write!(f, "edited"),
        }
    }
}

// ---------------------------------------------------------------------------
// Source feeds
// ---------------------------------------------------------------------------

/// One of the independent inputs of a reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Booking,
    #[serde(rename = "rentout")]
    RentOut,
    Return,
    Cancel,
    Ledger,
    Overrides,
    Opening,
}

impl SourceKind {
    /// The four booking-API feeds, in merge order.
    pub const BOOKING_API: [SourceKind; 4] =
        [Self::Booking, Self::RentOut, Self::Return, Self::Cancel];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Booking => "booking",
            Self::RentOut => "rentout",
            Self::Return => "return",
            Self::Cancel => "cancel",
            Self::Ledger => "ledger",
            Self::Overrides => "overrides",
            Self::Opening => "opening",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A feed that failed and was replaced by its empty/default value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFailure {
    pub source: SourceKind,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Amounts
// ---------------------------------------------------------------------------

/// Settlement split across channels, in minor units (paise).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Settlement {
    pub cash: i64,
    pub bank: i64,
    pub upi: i64,
    pub rbl: i64,
}

impl Settlement {
    pub fn sum(&self) -> i64 {
        self.cash
            .saturating_add(self.rbl)
            .saturating_add(self.bank)
            .saturating_add(self.upi)
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

impl Add for Settlement {
    type Output = Settlement;

    fn add(self, rhs: Settlement) -> Settlement {
        Settlement {
            cash: self.cash.saturating_add(rhs.cash),
            bank: self.bank.saturating_add(rhs.bank),
            upi: self.upi.saturating_add(rhs.upi),
            rbl: self.rbl.saturating_add(rhs.rbl),
        }
    }
}

impl AddAssign for Settlement {
    fn add_assign(&mut self, rhs: Settlement) {
        *self = *self + rhs;
    }
}

/// The two ledger lines a RentOut represents: deposit collected now and
/// the remainder due at return.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RentOutLegs {
    pub security: i64,
    pub balance_payable: i64,
}

impl RentOutLegs {
    pub fn total(&self) -> i64 {
        self.security.saturating_add(self.balance_payable)
    }
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// The common normalized record every source is converted into.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub invoice_key: String,
    pub location_code: String,
    pub date: NaiveDate,
    pub category: Category,
    pub sub_category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_category1: Option<String>,
    pub settlement: Settlement,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rent_out: Option<RentOutLegs>,
    pub amount: i64,
    pub total_transaction: i64,
    pub bill_value: i64,
    pub customer_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub remark: String,
    pub source: Provenance,
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub ledger_id: Option<String>,
}

impl Transaction {
    /// Recompute `amount` / `total_transaction` from the settlement split,
    /// or from the two legs for RentOut rows.
    pub fn recompute_totals(&mut self) {
        let total = match self.rent_out {
            Some(legs) => legs.total(),
            None => self.settlement.sum(),
        };
        self.amount = total;
        self.total_transaction = total;
    }

    /// Calendar date in ISO form, as used by the dedup key.
    pub fn date_key(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    pub fn is_materialized(&self) -> bool {
        self.ledger_id.is_some()
    }
}

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

/// A user-submitted correction of one invoice's settlement split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Override {
    pub invoice_key: String,
    pub settlement: Settlement,
    /// Replacement RentOut legs; `None` keeps the source value.
    pub security: Option<i64>,
    pub balance_payable: Option<i64>,
    /// Totals as stored on the edit record. Informational only: merged
    /// totals are always recomputed from the channels.
    pub declared_total: Option<i64>,
}

/// Overrides keyed by trimmed invoice identifier.
pub type OverrideMap = std::collections::HashMap<String, Override>;

// ---------------------------------------------------------------------------
// Balances
// ---------------------------------------------------------------------------

/// Previous day's persisted closing snapshot, folded into today's totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OpeningBalance {
    pub closing_cash: i64,
    pub bank: i64,
    pub rbl: i64,
}

/// Per-column sums over a filtered transaction set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    /// Includes the opening cash carried forward.
    pub cash: i64,
    pub bank: i64,
    pub upi: i64,
    pub rbl: i64,
    pub security: i64,
    pub balance_payable: i64,
    pub total_transaction: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CashClosing {
    pub opening_cash: i64,
    /// Computed closing cash (`Totals::cash`).
    pub closing_cash: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physical_cash: Option<i64>,
    /// `physical_cash - closing_cash`; positive means surplus in the drawer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difference: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryBreakdown {
    pub category: String,
    pub count: usize,
    pub settlement: Settlement,
    pub total_transaction: i64,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// One reconciled Day Book for a location and date range.
#[derive(Debug, Clone, Serialize)]
pub struct DayBook {
    pub location_code: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub opening_date: NaiveDate,
    pub opening: OpeningBalance,
    pub transactions: Vec<Transaction>,
    pub totals: Totals,
    pub closing: CashClosing,
    pub breakdown: Vec<CategoryBreakdown>,
    pub source_counts: BTreeMap<SourceKind, usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub degraded: Vec<SourceFailure>,
}

impl DayBook {
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}
