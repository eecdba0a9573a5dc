use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::DayBookError;
use crate::ledger::AllowList;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DayBookConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub opening: OpeningConfig,
}

// ---------------------------------------------------------------------------
// Collaborator endpoints
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Base URL of the rental/booking API (`GetBookingList`, ...).
    #[serde(default = "default_booking_url")]
    pub booking_base_url: String,
    /// Base URL of the internal ledger, override and opening-balance APIs.
    #[serde(default = "default_ledger_url")]
    pub ledger_base_url: String,
    /// Upper bound for one fetch, retries excluded.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Env var holding a bearer token; unset or empty means no auth header.
    #[serde(default)]
    pub api_key_env: Option<String>,
}

fn default_booking_url() -> String {
    "http://localhost:4000/api".into()
}

fn default_ledger_url() -> String {
    "http://localhost:5000/api".into()
}

fn default_timeout_secs() -> u64 {
    15
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            booking_base_url: default_booking_url(),
            ledger_base_url: default_ledger_url(),
            timeout_secs: default_timeout_secs(),
            api_key_env: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Ledger + Opening
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerConfig {
    #[serde(default = "default_allowed_categories")]
    pub allowed_categories: Vec<String>,
}

fn default_allowed_categories() -> Vec<String> {
    ["booking", "rentout", "return", "cancel", "income", "expense", "money transfer"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            allowed_categories: default_allowed_categories(),
        }
    }
}

impl LedgerConfig {
    pub fn allow_list(&self) -> AllowList {
        AllowList::new(&self.allowed_categories)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OpeningConfig {
    #[serde(default = "crate::opening::default_epoch")]
    pub epoch: NaiveDate,
}

impl Default for OpeningConfig {
    fn default() -> Self {
        Self {
            epoch: crate::opening::default_epoch(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl DayBookConfig {
    pub fn from_toml(input: &str) -> Result<Self, DayBookError> {
        let config: DayBookConfig =
            toml::from_str(input).map_err(|e| DayBookError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, DayBookError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| DayBookError::Io(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    pub fn validate(&self) -> Result<(), DayBookError> {
        for (name, url) in [
            ("booking_base_url", &self.api.booking_base_url),
            ("ledger_base_url", &self.api.ledger_base_url),
        ] {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(DayBookError::ConfigValidation(format!(
                    "api.{name} must be an http(s) URL, got '{url}'"
                )));
            }
        }

        if !(1..=300).contains(&self.api.timeout_secs) {
            return Err(DayBookError::ConfigValidation(format!(
                "api.timeout_secs must be between 1 and 300, got {}",
                self.api.timeout_secs
            )));
        }

        if self.ledger.allowed_categories.iter().all(|c| c.trim().is_empty()) {
            return Err(DayBookError::ConfigValidation(
                "ledger.allowed_categories must name at least one category".into(),
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
