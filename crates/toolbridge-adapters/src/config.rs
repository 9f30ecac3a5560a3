//! Environment-backed configuration helpers.
//!
//! Adapters never read the environment during a tool call.  Each adapter has
//! a config struct resolved once via `from_env()` and injected at
//! construction time, so tests can construct adapters with fake credentials
//! and mock base URLs.

/// Read an environment variable, treating empty values as unset.
pub fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_var_filters_empty() {
        std::env::set_var("TOOLBRIDGE_TEST_EMPTY", "");
        std::env::set_var("TOOLBRIDGE_TEST_SET", "value");

        assert_eq!(env_var("TOOLBRIDGE_TEST_EMPTY"), None);
        assert_eq!(env_var("TOOLBRIDGE_TEST_SET"), Some("value".to_string()));
        assert_eq!(env_var("TOOLBRIDGE_TEST_UNSET_XYZ"), None);
    }
}
