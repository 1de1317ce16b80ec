pub(crate) mod http;

use std::time::{SystemTime, UNIX_EPOCH};

/// Unix seconds. Never before the epoch on any supported platform.
pub(crate) fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Nanosecond tick used for unique ids and filenames. Collisions are not
/// expected at human-interaction rates; writers still refuse to overwrite.
pub(crate) fn unix_nanos() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0)
}
