use thiserror::Error;

#[derive(Debug, Error)]
pub enum DayBookError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (bad URL, empty allow-list, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// Requested date range is inverted.
    #[error("invalid date range: {from} is after {to}")]
    DateRange { from: String, to: String },
    /// Denomination not in the accepted note/coin set.
    #[error("unknown denomination: {0}")]
    UnknownDenomination(u32),
    /// IO error (config file read, etc.).
    #[error("IO error: {0}")]
    Io(String),
}
