//! Access gate
//!
//! Purely local passcode comparison against the already-fetched journey
//! record: no network round-trip, no attempt counting. Rate limiting is an
//! authoring-side concern, not this gate's.

/// User-facing message for a rejected passcode
pub const UNLOCK_ERROR: &str = "That key doesn't fit this lock.";

/// Case- and whitespace-insensitive passcode comparison
pub fn passcode_matches(entered: &str, stored: &str) -> bool {
    normalize(entered) == normalize(stored)
}

fn normalize(passcode: &str) -> String {
    passcode.trim().to_lowercase()
}
