use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Stock-verification endpoint; relaying fails while this is unset.
    pub warehouse_url: Option<String>,
    pub warehouse_timeout: Duration,
    pub webhook_secret: String,
    pub public_base_url: String,
    pub pending_order_timeout: Duration,
    pub sweep_interval: Duration,
    pub seed_catalog: bool,
}

impl AppConfig {
    /// Read configuration from the process environment. Call
    /// `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(get("PORT"), "PORT", 8080u16)?;
        let database_url = required("DATABASE_URL")?;
        let webhook_secret = required("WEBHOOK_SECRET")?;
        let public_base_url = get("PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://{}:{}", host, port))
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            warehouse_url: get("WAREHOUSE_URL"),
            warehouse_timeout: Duration::from_secs(parse_or(
                get("WAREHOUSE_TIMEOUT_SECS"),
                "WAREHOUSE_TIMEOUT_SECS",
                10,
            )?),
            pending_order_timeout: Duration::from_secs(parse_or(
                get("PENDING_ORDER_TIMEOUT_SECS"),
                "PENDING_ORDER_TIMEOUT_SECS",
                900,
            )?),
            sweep_interval: Duration::from_secs(positive_or(
                get("SWEEP_INTERVAL_SECS"),
                "SWEEP_INTERVAL_SECS",
                60,
            )?),
            seed_catalog: parse_or(get("SEED_CATALOG"), "SEED_CATALOG", false)?,
            host,
            port,
            database_url,
            webhook_secret,
            public_base_url,
        })
    }

    /// URL the warehouse should call back with its stock answer.
    pub fn callback_url(&self) -> String {
        format!("{}/webhooks/warehouse", self.public_base_url)
    }
}

fn parse_or<T: std::str::FromStr>(
    raw: Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

/// Like `parse_or`, but zero is rejected.
fn positive_or(raw: Option<String>, name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match parse_or(raw.clone(), name, default)? {
        0 => Err(ConfigError::Invalid {
            name,
            value: raw.unwrap_or_default(),
        }),
        secs => Ok(secs),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("DATABASE_URL", "postgres://localhost/shop"),
        ("WEBHOOK_SECRET", "s3cret"),
    ];

    #[test]
    fn defaults_apply_when_only_required_vars_are_set() {
        let cfg = config(&REQUIRED).expect("valid config");
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.warehouse_url, None);
        assert_eq!(cfg.warehouse_timeout, Duration::from_secs(10));
        assert_eq!(cfg.pending_order_timeout, Duration::from_secs(900));
        assert_eq!(cfg.sweep_interval, Duration::from_secs(60));
        assert!(!cfg.seed_catalog);
        assert_eq!(cfg.callback_url(), "http://0.0.0.0:8080/webhooks/warehouse");
    }

    #[test]
    fn webhook_secret_is_required() {
        let err = config(&[("DATABASE_URL", "postgres://localhost/shop")])
            .expect_err("secret missing");
        assert_eq!(err, ConfigError::Missing("WEBHOOK_SECRET"));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("WAREHOUSE_URL", "  "));
        assert_eq!(config(&vars).expect("valid config").warehouse_url, None);
    }

    #[test]
    fn invalid_numbers_are_reported_by_name() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("PORT", "eighty"));
        assert_eq!(
            config(&vars).expect_err("bad port"),
            ConfigError::Invalid {
                name: "PORT",
                value: "eighty".to_string()
            }
        );
    }

    #[test]
    fn zero_sweep_interval_is_invalid() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("SWEEP_INTERVAL_SECS", "0"));
        assert_eq!(
            config(&vars).expect_err("zero interval"),
            ConfigError::Invalid {
                name: "SWEEP_INTERVAL_SECS",
                value: "0".to_string()
            }
        );
    }

    #[test]
    fn public_base_url_drives_callback_url() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("PUBLIC_BASE_URL", "https://shop.example.com/"));
        vars.push(("SEED_CATALOG", "true"));
        let cfg = config(&vars).expect("valid config");
        assert_eq!(
            cfg.callback_url(),
            "https://shop.example.com/webhooks/warehouse"
        );
        assert!(cfg.seed_catalog);
    }
}
