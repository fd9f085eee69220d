//! Opt-in denylist check for text arguments.
//!
//! This is a lexical heuristic layered on top of bind parameters, which remain
//! the actual injection defense. It rejects many legitimate values (anything
//! with a hyphen, apostrophe or percent sign), so it only runs when
//! `SqlDbConfig::check_args` is enabled.

use crate::error::DbEngineError;
use crate::types::RowValues;

const DENIED_CHARS: [char; 6] = ['-', '#', '&', '=', '%', '\''];

/// Matched against the ASCII-lowercased argument.
const DENIED_WORDS: [&str; 5] = ["delete ", "truncate ", " or ", "from ", "set "];

/// Returns the first text argument that trips the denylist.
#[must_use]
pub fn find_rejected(args: &[RowValues]) -> Option<&str> {
    args.iter()
        .filter_map(RowValues::as_text)
        .find(|text| is_denied(text))
}

/// Reject the argument list if any text value contains a denied token.
///
/// # Errors
/// Returns `DbEngineError::RejectedArgument` carrying the offending value.
pub fn check_args(args: &[RowValues]) -> Result<(), DbEngineError> {
    match find_rejected(args) {
        Some(text) => {
            tracing::warn!(arg = text, "argument rejected by sanitizer");
            Err(DbEngineError::RejectedArgument(text.to_string()))
        }
        None => Ok(()),
    }
}

fn is_denied(text: &str) -> bool {
    if text.contains(DENIED_CHARS) {
        return true;
    }
    let lower = text.to_ascii_lowercase();
    DENIED_WORDS.iter().any(|word| lower.contains(word))
}
