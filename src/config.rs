use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::store::{LocalStore, RemoteStore, Storage, StoreError};

const DEFAULT_DATABASE_URL: &str = "sqlite:data/yotei.db";
const DEFAULT_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_API_URL: &str = "http://127.0.0.1:3000";
const DEFAULT_LOCAL_PATH: &str = "data/events.json";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Remote,
    Local,
}

impl FromStr for StorageKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remote" => Ok(StorageKind::Remote),
            "local" => Ok(StorageKind::Local),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub addr: SocketAddr,
    pub secure_cookies: bool,
    pub api_url: String,
    pub storage: StorageKind,
    pub local_path: PathBuf,
    pub http_timeout: Duration,
}

#[derive(Debug)]
pub struct ConfigError {
    key: &'static str,
    value: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid value for {}: {:?}", self.key, self.value)
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Read settings from the process environment (after `.env` is loaded).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            database_url: get("DATABASE_URL", DEFAULT_DATABASE_URL),
            addr: parse("YOTEI_ADDR", get("YOTEI_ADDR", DEFAULT_ADDR))?,
            secure_cookies: parse_flag("YOTEI_SECURE_COOKIES", lookup("YOTEI_SECURE_COOKIES"))?,
            api_url: get("YOTEI_API_URL", DEFAULT_API_URL),
            storage: parse("YOTEI_STORAGE", get("YOTEI_STORAGE", "remote"))?,
            local_path: PathBuf::from(get("YOTEI_LOCAL_PATH", DEFAULT_LOCAL_PATH)),
            http_timeout: Duration::from_secs(parse(
                "YOTEI_HTTP_TIMEOUT_SECS",
                get("YOTEI_HTTP_TIMEOUT_SECS", &DEFAULT_HTTP_TIMEOUT_SECS.to_string()),
            )?),
        })
    }

    /// Build the client-side store this configuration asks for.
    pub fn storage(&self) -> Result<Storage, StoreError> {
        let local = LocalStore::new(self.local_path.clone());
        match self.storage {
            StorageKind::Local => Ok(Storage::Local(local)),
            StorageKind::Remote => Ok(Storage::Remote(RemoteStore::new(
                &self.api_url,
                self.http_timeout,
                local,
            )?)),
        }
    }
}

fn parse<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError { key, value })
}

fn parse_flag(key: &'static str, value: Option<String>) -> Result<bool, ConfigError> {
    match value.as_deref().map(str::trim) {
        None | Some("") | Some("0") | Some("false") => Ok(false),
        Some("1") | Some("true") => Ok(true),
        Some(other) => Err(ConfigError { key, value: other.to_string() }),
    }
}
