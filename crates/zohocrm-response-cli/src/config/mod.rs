//! Settings resolution: explicit flag, then environment, then default.

use zohocrm_response::parser::DEFAULT_DELETION_ID_MIN_DIGITS;
use zohocrm_response::ParseOptions;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "ZOHOCRM_LOG";

/// Environment variable overriding the deletion id length threshold.
pub const MIN_ID_DIGITS_ENV: &str = "ZOHOCRM_MIN_ID_DIGITS";

const DEFAULT_LOG_LEVEL: &str = "warn";

/// Resolve the log filter directive.
pub fn resolve_log_level(explicit: Option<&str>) -> String {
    if let Some(level) = explicit {
        return level.to_string();
    }

    if let Ok(env_level) = std::env::var(LOG_ENV) {
        return env_level;
    }

    DEFAULT_LOG_LEVEL.to_string()
}

/// Resolve parser options, reading the id threshold from the environment if not given.
pub fn resolve_parse_options(min_id_digits: Option<usize>) -> ParseOptions {
    let deletion_id_min_digits = min_id_digits
        .or_else(|| env_usize(MIN_ID_DIGITS_ENV))
        .unwrap_or(DEFAULT_DELETION_ID_MIN_DIGITS);

    ParseOptions {
        deletion_id_min_digits,
        ..Default::default()
    }
}

fn env_usize(name: &str) -> Option<usize> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Ignoring {name}={raw:?}: {e}");
            None
        }
    }
}
