//! Configuration loading and representation.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::booking_service::BookingOptions;
use crate::qr::QrSettings;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub log_json: bool,
    pub catalog_path: Option<PathBuf>,
    /// Filesystem artifact root; in-memory storage when unset.
    pub artifact_dir: Option<PathBuf>,
    pub parallel_issuance: bool,
    pub qr_module_px: u32,
    /// Enables the Postgres capacity gate.
    pub database_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            log_json: true,
            catalog_path: None,
            artifact_dir: None,
            parallel_issuance: true,
            qr_module_px: QrSettings::default().module_px,
            database_url: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let bind_addr = match get("EVENTIVE_BIND_ADDR") {
            Some(raw) => raw.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
                key: "EVENTIVE_BIND_ADDR",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => defaults.bind_addr,
        };

        let qr_module_px = match get("EVENTIVE_QR_MODULE_PX") {
            Some(raw) => match raw.parse::<u32>() {
                Ok(px) if (1..=64).contains(&px) => px,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "EVENTIVE_QR_MODULE_PX",
                        value: raw,
                        reason: "expected an integer between 1 and 64".to_string(),
                    });
                }
            },
            None => defaults.qr_module_px,
        };

        Ok(Self {
            bind_addr,
            log_json: parse_bool("EVENTIVE_LOG_JSON", get("EVENTIVE_LOG_JSON"), defaults.log_json)?,
            catalog_path: get("EVENTIVE_CATALOG_PATH").map(PathBuf::from),
            artifact_dir: get("EVENTIVE_ARTIFACT_DIR").map(PathBuf::from),
            parallel_issuance: parse_bool(
                "EVENTIVE_PARALLEL_ISSUANCE",
                get("EVENTIVE_PARALLEL_ISSUANCE"),
                defaults.parallel_issuance,
            )?,
            qr_module_px,
            database_url: get("DATABASE_URL"),
        })
    }

    pub fn booking_options(&self) -> BookingOptions {
        BookingOptions {
            parallel_issuance: self.parallel_issuance,
            qr: QrSettings {
                module_px: self.qr_module_px,
                ..QrSettings::default()
            },
        }
    }
}

fn parse_bool(key: &'static str, raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw,
            reason: "expected a boolean".to_string(),
        }),
    }
}
