// Runtime configuration from environment variables
//
// Every setting has a default; using it is logged. A set but unparsable value
// is an error rather than a silent fallback.

use anyhow::{anyhow, Result};
use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use tracing::info;

use crate::reporting::SCAN_INTERVAL;

pub const DB_PATH_VAR: &str = "CATERING_DB_PATH";
pub const BIND_ADDR_VAR: &str = "CATERING_BIND_ADDR";
pub const SCAN_INTERVAL_VAR: &str = "CATERING_SCAN_INTERVAL_SECS";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    pub bind_addr: String,
    pub scan_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db_path: PathBuf::from("catering.db"),
            bind_addr: "0.0.0.0:3000".to_string(),
            scan_interval: SCAN_INTERVAL,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `load` uses the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let scan_secs: u64 = try_load(&lookup, SCAN_INTERVAL_VAR, defaults.scan_interval.as_secs())?;
        if scan_secs == 0 {
            return Err(anyhow!("{SCAN_INTERVAL_VAR} must be at least 1 second"));
        }

        Ok(Config {
            db_path: try_load(&lookup, DB_PATH_VAR, defaults.db_path.display().to_string())?.into(),
            bind_addr: try_load(&lookup, BIND_ADDR_VAR, defaults.bind_addr)?,
            scan_interval: Duration::from_secs(scan_secs),
        })
    }
}

fn try_load<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr + Display,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("Invalid {key} value {raw:?}: {e}")),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}
