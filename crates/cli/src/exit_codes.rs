//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain    | Description                                   |
//! |---------|-----------|-----------------------------------------------|
//! | 0       | Universal | Success                                       |
//! | 1       | Universal | General error (unspecified)                   |
//! | 2       | Universal | CLI usage error (bad args, bad amount/date)   |
//! | 10-19   | config    | Config file lookup, parse and validation      |
//! | 20-29   | fetch     | Collaborator APIs and degraded reconciliation |
//! | 30-39   | edit      | Two-phase edit flow                           |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use stridebook_client::{EditError, FetchError};

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unparsable amounts or dates.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Config (10-19)
// =============================================================================

/// Config file named by --config or STRIDEBOOK_CONFIG cannot be read.
pub const EXIT_CONFIG_MISSING: u8 = 10;

/// Config file is not valid TOML or fails validation.
pub const EXIT_CONFIG_INVALID: u8 = 11;

// =============================================================================
// Fetch (20-29)
// =============================================================================

/// Reconciliation finished but one or more sources were unavailable
/// (only with --strict).
pub const EXIT_FETCH_DEGRADED: u8 = 20;

/// Auth rejected by a collaborator (401/403).
pub const EXIT_FETCH_AUTH: u8 = 21;

/// Request rejected by a collaborator (400, 404, other 4xx).
pub const EXIT_FETCH_REJECTED: u8 = 22;

/// Rate limited after retries (429).
pub const EXIT_FETCH_RATE_LIMIT: u8 = 23;

/// Upstream error (5xx), network failure or timeout after retries.
pub const EXIT_FETCH_UPSTREAM: u8 = 24;

// =============================================================================
// Edit (30-39)
// =============================================================================

/// No transaction matches the invoice/date/category given to `edit`.
pub const EXIT_EDIT_NOT_FOUND: u8 = 30;

/// The ledger create or update call failed; nothing was changed.
pub const EXIT_EDIT_WRITE: u8 = 31;

/// The ledger create call succeeded but returned no record id.
pub const EXIT_EDIT_NO_ID: u8 = 32;

// =============================================================================
// Error mapping
// =============================================================================

/// Map a FetchError to its exit code.
pub fn fetch_exit_code(err: &FetchError) -> u8 {
    match err {
        FetchError::Auth { .. } => EXIT_FETCH_AUTH,
        FetchError::Rejected { .. } | FetchError::NotFound { .. } => EXIT_FETCH_REJECTED,
        FetchError::RateLimited { .. } => EXIT_FETCH_RATE_LIMIT,
        FetchError::Upstream { .. } | FetchError::Transport { .. } | FetchError::Decode { .. } => {
            EXIT_FETCH_UPSTREAM
        }
        FetchError::ClientBuild(_) => EXIT_ERROR,
    }
}

/// Map an EditError to its exit code.
pub fn edit_exit_code(err: &EditError) -> u8 {
    match err {
        EditError::NotFound(_) => EXIT_EDIT_NOT_FOUND,
        EditError::Materialize(_) | EditError::Update(_) => EXIT_EDIT_WRITE,
        EditError::MissingId(_) => EXIT_EDIT_NO_ID,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_codes_are_in_range() {
        let err = FetchError::Auth {
            endpoint: "ledger".into(),
            status: 401,
            message: "nope".into(),
        };
        assert_eq!(fetch_exit_code(&err), EXIT_FETCH_AUTH);
        let err = FetchError::Transport {
            endpoint: "ledger".into(),
            attempts: 4,
            message: "timed out".into(),
        };
        assert_eq!(fetch_exit_code(&err), EXIT_FETCH_UPSTREAM);
    }

    #[test]
    fn edit_write_failure() {
        let err = EditError::Update(FetchError::Upstream {
            endpoint: "ledger update".into(),
            status: 502,
            attempts: 4,
        });
        assert_eq!(edit_exit_code(&err), EXIT_EDIT_WRITE);
    }
}
