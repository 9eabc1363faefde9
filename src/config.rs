use crate::non_zero_duration::NonZeroDuration;

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "geoip-proxy.toml";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error(r#"environment variable {name} has invalid value "{value}""#)]
    InvalidEnvValue { name: &'static str, value: String },
    #[error(r#"threads must be "cores" or a positive integer, not "{0}""#)]
    InvalidThreads(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "ThreadsConfig")]
pub enum ConfigThreads {
    #[default]
    Cores,
    Custom(NonZeroUsize),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ThreadsConfig {
    Number(NonZeroUsize),
    Keyword(String),
}

impl TryFrom<ThreadsConfig> for ConfigThreads {
    type Error = ConfigError;

    fn try_from(value: ThreadsConfig) -> Result<Self, Self::Error> {
        match value {
            ThreadsConfig::Number(threads) => Ok(Self::Custom(threads)),
            ThreadsConfig::Keyword(s) if s.trim().eq_ignore_ascii_case("cores") => Ok(Self::Cores),
            ThreadsConfig::Keyword(s) => Err(ConfigError::InvalidThreads(s)),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "Config::default_host")]
    pub host: IpAddr,
    #[serde(default = "Config::default_port")]
    pub port: u16,
    /// Directory holding GeoLite2-City.mmdb, GeoLite2-Country.mmdb and GeoLite2-ASN.mmdb
    #[serde(default = "Config::default_database_path")]
    pub database_path: PathBuf,
    /// Pause between attempts to open a database file
    #[serde(default = "Config::default_retry_interval")]
    pub retry_interval: NonZeroDuration,
    /// Do not accept connections until every database is loaded
    #[serde(default)]
    pub wait_for_databases: bool,
    #[serde(default)]
    pub ip_headers: Vec<String>,
    #[serde(default = "Config::default_ip_headers_recursive")]
    pub ip_headers_recursive: bool,
    #[serde(default = "Config::default_log_level")]
    pub log_level: log::Level,
    #[serde(default)]
    pub threads: ConfigThreads,
}

impl Config {
    fn default_host() -> IpAddr {
        IpAddr::V4(Ipv4Addr::UNSPECIFIED)
    }

    fn default_port() -> u16 {
        4360
    }

    fn default_database_path() -> PathBuf {
        "./database".into()
    }

    fn default_retry_interval() -> NonZeroDuration {
        NonZeroDuration::from_non_zero_secs(std::num::NonZeroU64::MIN)
    }

    fn default_ip_headers_recursive() -> bool {
        true
    }

    fn default_log_level() -> log::Level {
        log::Level::Info
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Applies `PORT`, `PATH_DATABASE` (or `DATABASE_PATH`) and `LOG_LEVEL` on top of the file
    /// values, `var` resolves a variable name to its value
    pub fn apply_env_overrides<F>(&mut self, var: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = var("PORT") {
            self.port = parse_env("PORT", value)?;
        }
        if let Some(value) = var("PATH_DATABASE").or_else(|| var("DATABASE_PATH")) {
            self.database_path = value.into();
        }
        if let Some(value) = var("LOG_LEVEL") {
            self.log_level = parse_env("LOG_LEVEL", value)?;
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            database_path: Self::default_database_path(),
            retry_interval: Self::default_retry_interval(),
            wait_for_databases: false,
            ip_headers: vec![],
            ip_headers_recursive: Self::default_ip_headers_recursive(),
            log_level: Self::default_log_level(),
            threads: ConfigThreads::default(),
        }
    }
}

fn parse_env<T: FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnvValue { name, value })
}

pub fn parse_config<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let toml_string = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&toml_string)?;
    Ok(config)
}

/// Reads the config file and applies environment overrides.
///
/// An explicitly given file must exist, the default one is optional.
pub fn load_config(path: Option<&str>) -> anyhow::Result<Config> {
    let mut config = match path {
        Some(path) => parse_config(path)?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => parse_config(DEFAULT_CONFIG_PATH)?,
        None => Config::default(),
    };
    config.apply_env_overrides(|name| std::env::var(name).ok())?;
    Ok(config)
}

/// Loads variables from `path`, or from `.env` in the current or a parent directory.
///
/// A missing file is not an error, a malformed one is.
pub fn load_dotenv(path: Option<&Path>) -> Result<(), dotenvy::Error> {
    let loaded = match path {
        Some(path) => dotenvy::from_path(path),
        None => dotenvy::dotenv().map(|_| ()),
    };
    match loaded {
        Err(error) if error.not_found() => Ok(()),
        loaded => loaded,
    }
}
