// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;
use wholesale_app::{
    CatalogState, DEFAULT_MAX_PRICE, DEFAULT_MIN_PRICE, DEFAULT_NO_PRICE_INCREASE_LIMIT,
    PriceRange,
};

pub const APP_NAME: &str = "wholesale";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_API_BASE_URL: &str = "http://localhost:3005";
const DEFAULT_API_TIMEOUT: &str = "10s";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub api: Api,
    #[serde(default)]
    pub catalog: Catalog,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            api: Api::default(),
            catalog: Catalog::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Api {
    /// Unset falls through to `WHOLESALE_API_URL`, then the local default.
    pub base_url: Option<String>,
    pub timeout: Option<String>,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Some(DEFAULT_API_TIMEOUT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Catalog {
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub no_price_increase_limit: Option<i64>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            min_price: Some(DEFAULT_MIN_PRICE.to_owned()),
            max_price: Some(DEFAULT_MAX_PRICE.to_owned()),
            no_price_increase_limit: Some(DEFAULT_NO_PRICE_INCREASE_LIMIT as i64),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
            file: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("WHOLESALE_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!(
                "cannot resolve config directory; set WHOLESALE_CONFIG_PATH to the config file"
            )
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and keep values under [api], [catalog], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(base_url) = &self.api.base_url
            && base_url.trim().is_empty()
        {
            bail!(
                "api.base_url in {} must not be empty; remove it to use the default",
                path.display()
            );
        }

        if let Some(timeout) = &self.api.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "api.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(limit) = self.catalog.no_price_increase_limit
            && limit <= 0
        {
            bail!(
                "catalog.no_price_increase_limit in {} must be positive, got {}",
                path.display(),
                limit
            );
        }

        if let Some(level) = &self.log.level {
            parse_level(level)
                .with_context(|| format!("invalid log.level in {}", path.display()))?;
        }

        Ok(())
    }

    pub fn api_base_url(&self) -> String {
        let raw = self
            .api
            .base_url
            .clone()
            .or_else(|| env::var("WHOLESALE_API_URL").ok())
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_owned());
        raw.trim().trim_end_matches('/').to_owned()
    }

    pub fn api_timeout(&self) -> Result<Duration> {
        parse_duration(self.api.timeout.as_deref().unwrap_or(DEFAULT_API_TIMEOUT))
    }

    pub fn price_range(&self) -> PriceRange {
        PriceRange::new(
            self.catalog
                .min_price
                .as_deref()
                .unwrap_or(DEFAULT_MIN_PRICE),
            self.catalog
                .max_price
                .as_deref()
                .unwrap_or(DEFAULT_MAX_PRICE),
        )
    }

    pub fn no_price_increase_limit(&self) -> usize {
        self.catalog
            .no_price_increase_limit
            .and_then(|limit| usize::try_from(limit).ok())
            .filter(|limit| *limit > 0)
            .unwrap_or(DEFAULT_NO_PRICE_INCREASE_LIMIT)
    }

    pub fn initial_state(&self) -> CatalogState {
        CatalogState::new(self.price_range(), self.no_price_increase_limit())
    }

    pub fn log_level(&self) -> Result<Level> {
        parse_level(self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL))
    }

    pub fn log_file(&self) -> Result<PathBuf> {
        if let Some(path) = &self.log.file {
            return Ok(PathBuf::from(path));
        }
        let data_root = dirs::data_dir().ok_or_else(|| {
            anyhow!("cannot resolve data directory; set [log].file to an absolute path")
        })?;
        Ok(data_root.join(APP_NAME).join("wholesale.log"))
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# wholesale config\n# Place this file at: {}\n\nversion = 1\n\n[api]\n# Falls back to WHOLESALE_API_URL, then this default.\nbase_url = \"{}\"\n# <N>ms | <N>s | <N>m\ntimeout = \"{}\"\n\n[catalog]\nmin_price = \"{}\"\nmax_price = \"{}\"\nno_price_increase_limit = {}\n\n[log]\n# error | warn | info | debug | trace; RUST_LOG overrides\nlevel = \"{}\"\n# Optional. Default is the platform data dir (for example ~/.local/share/wholesale/wholesale.log)\n# file = \"/absolute/path/to/wholesale.log\"\n",
            path.display(),
            DEFAULT_API_BASE_URL,
            DEFAULT_API_TIMEOUT,
            DEFAULT_MIN_PRICE,
            DEFAULT_MAX_PRICE,
            DEFAULT_NO_PRICE_INCREASE_LIMIT,
            DEFAULT_LOG_LEVEL,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        let Some(secs) = mins.checked_mul(60) else {
            bail!("invalid timeout duration {raw:?}; minutes out of range");
        };
        return Ok(Duration::from_secs(secs));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 10s)")
}

fn parse_level(raw: &str) -> Result<Level> {
    Level::from_str(raw.trim()).map_err(|_| {
        anyhow!("unknown log level {raw:?}; use one of: error, warn, info, debug, trace")
    })
}
