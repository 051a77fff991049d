// This file is part of bin-lookup. Copyright © 2026 bin-lookup contributors.
// bin-lookup is licensed under the GNU AGPL v3.0 or any later version. See LICENSE file for full text.

//! Environment-driven configuration, resolved once at startup

use crate::cli_args::BinLookupArgs;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_USER_URL: &str = "https://nemo.stanford.edu/api/users/";
const DEFAULT_BIN_URL: &str = "https://nemo.stanford.edu/api/recurring_consumable_charges/";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
/// Default cache TTL: 1 hour
const DEFAULT_REFRESH_INTERVAL_SECONDS: u64 = 3600;

#[derive(Debug, Clone)]
pub struct Config {
    /// NEMO API token. The only setting with no default.
    pub api_key: String,
    /// Upstream user collection
    pub user_url: String,
    /// Upstream bin collection (`recurring_consumable_charges` in NEMO terms)
    pub bin_url: String,
    pub host: String,
    pub port: u16,
    /// Maximum cache age before a lookup forces a synchronous rebuild
    pub cache_ttl: Duration,
    /// Per-request upstream timeout. `None` means unbounded, a deliberate
    /// escape hatch for a slow but trusted upstream.
    pub api_timeout: Option<Duration>,
}

#[derive(Debug)]
pub enum ConfigError {
    /// NEMO_API_KEY is unset or empty. Fatal before the listener binds.
    MissingApiKey,
    /// An environment variable was set to something unparseable.
    InvalidNumber { name: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingApiKey => {
                f.write_str("NEMO_API_KEY not set in environment variables")
            }
            ConfigError::InvalidNumber { name, value } => {
                write!(f, "{name} is not a valid number: {value:?}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Resolve configuration from the process environment, with CLI overrides applied on top.
    pub fn from_env(args: &BinLookupArgs) -> Result<Self, ConfigError> {
        Self::resolve(|name| std::env::var(name).ok(), args)
    }

    /// The actual resolution logic, over an arbitrary variable lookup so tests
    /// do not have to mutate the process environment.
    fn resolve<F>(var: F, args: &BinLookupArgs) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = var("NEMO_API_KEY")
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;
        let user_url = var("NEMO_USER_URL")
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_USER_URL.to_string());
        let bin_url = var("NEMO_BIN_URL")
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_BIN_URL.to_string());
        let host = args
            .host
            .clone()
            .or_else(|| var("SERVER_HOST").filter(|value| !value.is_empty()))
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match args.port {
            Some(port) => port,
            None => parse_var(&var, "SERVER_PORT", DEFAULT_PORT)?,
        };
        let ttl_seconds = parse_var(
            &var,
            "CACHE_REFRESH_INTERVAL",
            DEFAULT_REFRESH_INTERVAL_SECONDS,
        )?;
        // unset or empty means no timeout at all
        let api_timeout = match var("API_TIMEOUT").filter(|value| !value.is_empty()) {
            Some(value) => {
                let seconds: u64 = value.parse().map_err(|_| ConfigError::InvalidNumber {
                    name: "API_TIMEOUT",
                    value,
                })?;
                Some(Duration::from_secs(seconds))
            }
            None => None,
        };
        Ok(Self {
            api_key,
            user_url,
            bin_url,
            host,
            port,
            cache_ttl: Duration::from_secs(ttl_seconds),
            api_timeout,
        })
    }

    /// Human-readable timeout for the startup banner
    pub fn timeout_label(&self) -> String {
        match self.api_timeout {
            Some(timeout) => format!("{}s", timeout.as_secs()),
            None => "none (no timeout)".to_string(),
        }
    }
}

fn parse_var<F, T>(var: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match var(name).filter(|value| !value.is_empty()) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        move |name| {
            pairs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone())
        }
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::resolve(env_of(&[("NEMO_API_KEY", "sekrit")]), &BinLookupArgs::default())
            .expect("config should resolve");
        assert_eq!(config.api_key, "sekrit");
        assert_eq!(config.user_url, DEFAULT_USER_URL);
        assert_eq!(config.bin_url, DEFAULT_BIN_URL);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.cache_ttl, Duration::from_secs(3600));
        assert_eq!(config.api_timeout, None);
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        let result = Config::resolve(env_of(&[]), &BinLookupArgs::default());
        assert!(matches!(result, Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn test_empty_api_key_is_fatal() {
        let result = Config::resolve(env_of(&[("NEMO_API_KEY", "")]), &BinLookupArgs::default());
        assert!(matches!(result, Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn test_timeout_parsed_as_seconds() {
        let config = Config::resolve(
            env_of(&[("NEMO_API_KEY", "sekrit"), ("API_TIMEOUT", "300")]),
            &BinLookupArgs::default(),
        )
        .expect("config should resolve");
        assert_eq!(config.api_timeout, Some(Duration::from_secs(300)));
        assert_eq!(config.timeout_label(), "300s");
    }

    #[test]
    fn test_empty_timeout_means_unbounded() {
        let config = Config::resolve(
            env_of(&[("NEMO_API_KEY", "sekrit"), ("API_TIMEOUT", "")]),
            &BinLookupArgs::default(),
        )
        .expect("config should resolve");
        assert_eq!(config.api_timeout, None);
        assert_eq!(config.timeout_label(), "none (no timeout)");
    }

    #[test]
    fn test_garbage_number_is_fatal() {
        let result = Config::resolve(
            env_of(&[("NEMO_API_KEY", "sekrit"), ("SERVER_PORT", "eighty")]),
            &BinLookupArgs::default(),
        );
        assert!(matches!(
            result,
            Err(ConfigError::InvalidNumber { name: "SERVER_PORT", .. })
        ));
    }

    #[test]
    fn test_cli_overrides_beat_environment() {
        let args = BinLookupArgs {
            host: Some("127.0.0.1".to_string()),
            port: Some(9000),
        };
        let config = Config::resolve(
            env_of(&[
                ("NEMO_API_KEY", "sekrit"),
                ("SERVER_HOST", "10.0.0.1"),
                ("SERVER_PORT", "8081"),
            ]),
            &args,
        )
        .expect("config should resolve");
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9000);
    }
}
