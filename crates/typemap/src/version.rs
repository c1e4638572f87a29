use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

const TOKEN_LEN: usize = 8;

/// Shortens a configured token to the exposed length.
pub(crate) fn normalize(configured: &str) -> String {
    configured.trim().chars().take(TOKEN_LEN).collect()
}

/// A fresh 8 character hex token.
pub(crate) fn generate() -> String {
    let mut bytes = [0_u8; TOKEN_LEN / 2];
    match getrandom::fill(&mut bytes) {
        Ok(()) => hex::encode(bytes),
        Err(err) => {
            warn!(error = %err, "OS randomness unavailable, deriving version token from the clock");
            let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.subsec_nanos());
            format!("{nanos:08x}")
        },
    }
}
