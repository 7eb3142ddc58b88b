//! Share links of the form `<origin>/#<id>`
//!
//! The id rides in the URL fragment, which browsers never send to a server.
//! It is a lookup handle, not a secret; the password protects the letter.

use crate::error::{ErrorCategory, ErrorKind, LetterboxError, Result};
use crate::letter::LetterId;

/// Build the link a sender passes to the recipient.
pub fn share_link(origin: &str, id: &LetterId) -> String {
    format!("{}/#{}", origin.trim_end_matches('/'), id)
}

/// Extract the letter id from a share link, or accept a bare id.
pub fn parse_share_link(input: &str) -> Result<LetterId> {
    let input = input.trim();
    let id = match input.split_once('#') {
        Some((_, fragment)) => fragment,
        None => input,
    };
    if id.is_empty() {
        return Err(LetterboxError::with_kind(
            ErrorCategory::User,
            ErrorKind::InvalidLink,
            "link does not contain a letter id",
        ));
    }
    LetterId::parse(id)
}
