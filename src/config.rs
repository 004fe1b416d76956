use anyhow::{Context, Result, bail};
use std::env;
use std::str::FromStr;
use strum::{Display, EnumString};

/// One year, in seconds.
pub const MAX_ACCESS_TOKEN_TTL: usize = 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Storage {
    Memory,
    MySql,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: String,
    pub storage: Storage,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub access_token_ttl: usize,

    pub api_prefix: String,
    pub default_page_size: u32,
    pub max_page_size: u32,

    pub user_cache_ttl: u64,
    pub user_cache_capacity: u64,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,

    /// Seeded at startup when both are set and the user does not exist.
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,

    pub log_dir: String,
    pub log_level: tracing::Level,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:8080".to_string(),
            storage: Storage::Memory,
            database_url: None,
            jwt_secret: "change-me".to_string(),
            access_token_ttl: 900, // 15 min
            api_prefix: "/api".to_string(),
            default_page_size: 20,
            max_page_size: 2000,
            user_cache_ttl: 300,
            user_cache_capacity: 10_000,
            rate_login_per_min: 60,
            rate_register_per_min: 30,
            admin_username: None,
            admin_password: None,
            log_dir: "logs".to_string(),
            log_level: tracing::Level::DEBUG,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let storage: Storage = parse_or(&lookup, "STORAGE", defaults.storage)?;
        let database_url = lookup("DATABASE_URL");
        if storage == Storage::MySql && database_url.is_none() {
            bail!("DATABASE_URL must be set when STORAGE=mysql");
        }

        let config = Self {
            server_addr: lookup("SERVER_ADDR").unwrap_or(defaults.server_addr),
            storage,
            database_url,
            jwt_secret: lookup("JWT_SECRET").context("JWT_SECRET must be set")?,
            access_token_ttl: parse_or(&lookup, "ACCESS_TOKEN_TTL", defaults.access_token_ttl)?,
            api_prefix: lookup("API_PREFIX").unwrap_or(defaults.api_prefix),
            default_page_size: parse_or(&lookup, "DEFAULT_PAGE_SIZE", defaults.default_page_size)?,
            max_page_size: parse_or(&lookup, "MAX_PAGE_SIZE", defaults.max_page_size)?,
            user_cache_ttl: parse_or(&lookup, "USER_CACHE_TTL", defaults.user_cache_ttl)?,
            user_cache_capacity: parse_or(
                &lookup,
                "USER_CACHE_CAPACITY",
                defaults.user_cache_capacity,
            )?,
            rate_login_per_min: parse_or(&lookup, "RATE_LOGIN_PER_MIN", defaults.rate_login_per_min)?,
            rate_register_per_min: parse_or(
                &lookup,
                "RATE_REGISTER_PER_MIN",
                defaults.rate_register_per_min,
            )?,
            admin_username: lookup("ADMIN_USERNAME"),
            admin_password: lookup("ADMIN_PASSWORD"),
            log_dir: lookup("LOG_DIR").unwrap_or(defaults.log_dir),
            log_level: parse_or(&lookup, "LOG_LEVEL", defaults.log_level)?,
        };

        if config.access_token_ttl == 0 || config.access_token_ttl > MAX_ACCESS_TOKEN_TTL {
            bail!("ACCESS_TOKEN_TTL must be between 1 and {MAX_ACCESS_TOKEN_TTL} seconds");
        }
        if config.rate_login_per_min == 0 || config.rate_register_per_min == 0 {
            bail!("rate limits must be greater than zero");
        }
        if config.default_page_size == 0 || config.default_page_size > config.max_page_size {
            bail!("DEFAULT_PAGE_SIZE must be between 1 and MAX_PAGE_SIZE");
        }

        Ok(config)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {key}={raw:?}: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_to_unset_keys() {
        let config = Config::from_lookup(lookup(&[("JWT_SECRET", "s")])).unwrap();
        assert_eq!(config.storage, Storage::Memory);
        assert_eq!(config.default_page_size, 20);
        assert_eq!(config.api_prefix, "/api");
        assert_eq!(config.log_level, tracing::Level::DEBUG);
    }

    #[test]
    fn mysql_requires_database_url() {
        let err = Config::from_lookup(lookup(&[("JWT_SECRET", "s"), ("STORAGE", "MySQL")]));
        assert!(err.is_err());

        let config = Config::from_lookup(lookup(&[
            ("JWT_SECRET", "s"),
            ("STORAGE", "mysql"),
            ("DATABASE_URL", "mysql://localhost/emp"),
        ]))
        .unwrap();
        assert_eq!(config.storage, Storage::MySql);
    }

    #[test]
    fn malformed_numbers_are_errors() {
        let err = Config::from_lookup(lookup(&[("JWT_SECRET", "s"), ("MAX_PAGE_SIZE", "lots")]))
            .unwrap_err();
        assert!(err.to_string().contains("MAX_PAGE_SIZE"));
    }

    #[test]
    fn token_ttl_is_bounded() {
        let huge = usize::MAX.to_string();
        let err = Config::from_lookup(lookup(&[("JWT_SECRET", "s"), ("ACCESS_TOKEN_TTL", huge.as_str())]))
            .unwrap_err();
        assert!(err.to_string().contains("ACCESS_TOKEN_TTL"));

        assert!(Config::from_lookup(lookup(&[("JWT_SECRET", "s"), ("ACCESS_TOKEN_TTL", "0")])).is_err());

        let config =
            Config::from_lookup(lookup(&[("JWT_SECRET", "s"), ("ACCESS_TOKEN_TTL", "3600")])).unwrap();
        assert_eq!(config.access_token_ttl, 3600);
    }

    #[test]
    fn missing_secret_is_an_error() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
    }
}
