use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use depth_view_adapters::DEFAULT_REQUEST_TIMEOUT;
use depth_view_application::DEFAULT_CAPTURE_INTERVAL;
use tracing::{info, warn};

pub const API_URL_VAR: &str = "DEPTH_VIEW_API_URL";
pub const CAPTURE_INTERVAL_VAR: &str = "DEPTH_VIEW_CAPTURE_INTERVAL_MS";
pub const OUTPUT_DIR_VAR: &str = "DEPTH_VIEW_OUTPUT_DIR";
pub const OFFLOAD_VAR: &str = "DEPTH_VIEW_OFFLOAD_COMPRESSION";
pub const REQUEST_TIMEOUT_VAR: &str = "DEPTH_VIEW_REQUEST_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api_url: String,
    pub capture_interval: Duration,
    pub request_timeout: Duration,
    pub output_dir: String,
    pub offload_compression: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            capture_interval: DEFAULT_CAPTURE_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            output_dir: "depth-maps".to_string(),
            offload_compression: true,
        }
    }
}

impl AppConfig {
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let interval_ms = u64::try_from(defaults.capture_interval.as_millis()).unwrap_or(100);
        let timeout_ms = u64::try_from(defaults.request_timeout.as_millis()).unwrap_or(30_000);

        Self {
            api_url: try_load(&lookup, API_URL_VAR, defaults.api_url),
            capture_interval: Duration::from_millis(try_load(
                &lookup,
                CAPTURE_INTERVAL_VAR,
                interval_ms,
            )),
            request_timeout: Duration::from_millis(try_load(
                &lookup,
                REQUEST_TIMEOUT_VAR,
                timeout_ms,
            )),
            output_dir: try_load(&lookup, OUTPUT_DIR_VAR, defaults.output_dir),
            offload_compression: try_load(&lookup, OFFLOAD_VAR, defaults.offload_compression),
        }
    }
}

fn try_load<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(raw) = lookup(key) else {
        info!("{key} not set, using default: {default}");
        return default;
    };

    raw.trim().parse().unwrap_or_else(|error| {
        warn!("Invalid {key} value {raw:?}: {error}, using default: {default}");
        default
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| values.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = AppConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.capture_interval, Duration::from_millis(100));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[
            (API_URL_VAR, "http://depth.internal:9000"),
            (CAPTURE_INTERVAL_VAR, "1000"),
            (REQUEST_TIMEOUT_VAR, "2500"),
            (OFFLOAD_VAR, "false"),
        ]));
        assert_eq!(config.request_timeout, Duration::from_millis(2500));
        assert_eq!(config.api_url, "http://depth.internal:9000");
        assert_eq!(config.capture_interval, Duration::from_secs(1));
        assert!(!config.offload_compression);
        assert_eq!(config.output_dir, "depth-maps");
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = AppConfig::from_lookup(lookup_from(&[(CAPTURE_INTERVAL_VAR, "fast")]));
        assert_eq!(config.capture_interval, DEFAULT_CAPTURE_INTERVAL);
    }
}
