//! Shared constants for the invoker crates.

// ═══════════════════════════════════════════════════════════════════════════════
// TIME-TO-LIVE
// ═══════════════════════════════════════════════════════════════════════════════

/// Default time-to-live of a cached response, in milliseconds.
pub const DEFAULT_TIME_TO_LIVE_MS: i64 = 10_000;

/// Name of the time-to-live setting, as reported in configuration errors.
pub const TIME_TO_LIVE_FIELD: &str = "time-to-live";

// ═══════════════════════════════════════════════════════════════════════════════
// ENVIRONMENT
// ═══════════════════════════════════════════════════════════════════════════════

/// Environment variable holding the cache time-to-live in milliseconds.
pub const ENV_TIME_TO_LIVE_MS: &str = "INVOKER_CACHE_TTL_MS";

/// Environment variable selecting the cache key policy
/// (`parameters` or `no-input-only`).
pub const ENV_KEY_POLICY: &str = "INVOKER_CACHE_KEY_POLICY";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ttl_is_positive() {
        assert!(DEFAULT_TIME_TO_LIVE_MS > 0);
    }
}
