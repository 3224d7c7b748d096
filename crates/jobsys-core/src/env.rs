//! Environment variable utilities
//!
//! Typed lookups with defaults, used by `SchedulerConfig::from_env`.
//!
//! ```ignore
//! use jobsys_core::env::{env_get, env_get_bool};
//!
//! let capacity: usize = env_get("JOBSYS_QUEUE_CAPACITY", 1000);
//! let logical = env_get_bool("JOBSYS_USE_LOGICAL_CORES", false);
//! ```

use std::str::FromStr;

/// Parse `key` as `T`, falling back to `default` when unset or unparsable
#[inline]
pub fn env_get<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    env_get_opt(key).unwrap_or(default)
}

/// Parse `key` as a boolean
///
/// "1", "true", "yes", "on" (any case) are true; "0", "false", "no", "off"
/// are false. Unset or anything else yields `default`.
#[inline]
pub fn env_get_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(val) => match val.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

/// Parse `key` as `T` if set and valid
#[inline]
pub fn env_get_opt<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Read `key` as a string, or `default`
#[inline]
pub fn env_get_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Whether `key` is set at all
#[inline]
pub fn env_is_set(key: &str) -> bool {
    std::env::var_os(key).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test owns its variable names; the test harness runs them in parallel.

    #[test]
    fn test_unset_defaults() {
        let key = "__JOBSYS_TEST_UNSET__";
        assert_eq!(env_get::<usize>(key, 42), 42);
        assert!(env_get_bool(key, true));
        assert_eq!(env_get_opt::<u32>(key), None);
        assert_eq!(env_get_str(key, "fallback"), "fallback");
        assert!(!env_is_set(key));
    }

    #[test]
    fn test_parse_number() {
        let key = "__JOBSYS_TEST_NUM__";
        std::env::set_var(key, " 128 ");
        assert_eq!(env_get::<usize>(key, 0), 128);
        std::env::set_var(key, "many");
        assert_eq!(env_get::<usize>(key, 7), 7);
        std::env::remove_var(key);
    }

    #[test]
    fn test_bool_variants() {
        let key = "__JOBSYS_TEST_BOOL__";
        for v in ["1", "true", "YES", "on"] {
            std::env::set_var(key, v);
            assert!(env_get_bool(key, false), "{}", v);
        }
        for v in ["0", "false", "No", "OFF"] {
            std::env::set_var(key, v);
            assert!(!env_get_bool(key, true), "{}", v);
        }
        std::env::set_var(key, "maybe");
        assert!(env_get_bool(key, true));
        assert!(!env_get_bool(key, false));
        std::env::remove_var(key);
    }
}
