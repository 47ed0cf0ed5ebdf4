//! Runtime settings loaded via OrthoConfig.

use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use chrono::FixedOffset;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::domain::{DisplayZone, NavigationTargets};

const DEFAULT_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_STORAGE_PATH: &str = "rental-sync-storage.json";
const DEFAULT_LOGIN_TARGET: &str = "/static/login";

/// Settings that cannot be turned into runtime values.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The base URL does not parse.
    #[error("invalid base URL '{value}': {source}")]
    BaseUrl {
        /// Configured value.
        value: String,
        /// Parse failure.
        #[source]
        source: url::ParseError,
    },
    /// The base URL cannot carry paths (for example `mailto:`).
    #[error("base URL '{value}' cannot be used as a request origin")]
    OpaqueBaseUrl {
        /// Configured value.
        value: String,
    },
    /// The storage path is not valid UTF-8.
    #[error("storage path '{}' is not valid UTF-8", path.display())]
    StoragePath {
        /// Configured value.
        path: PathBuf,
    },
    /// The display offset lies outside +/- 24 hours.
    #[error("display offset of {minutes} minutes is out of range")]
    DisplayOffset {
        /// Configured value.
        minutes: i32,
    },
}

/// Configuration values for the sync client.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "RENTAL_SYNC")]
pub struct SyncSettings {
    /// Origin of the rental REST services.
    pub base_url: Option<String>,
    /// JSON file holding persisted identity between runs.
    pub storage_path: Option<PathBuf>,
    /// Per-exchange timeout; unset or zero leaves the transport default.
    pub timeout_seconds: Option<u64>,
    /// Navigation target for anonymous callers.
    pub login_target: Option<String>,
    /// Fixed UTC offset for rendered timestamps; unset uses the host zone.
    pub display_offset_minutes: Option<i32>,
}

impl SyncSettings {
    /// Parse the configured base URL, falling back to the local backend.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BaseUrl`] or [`ConfigError::OpaqueBaseUrl`]
    /// when the value is not a usable origin.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let value = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let url = Url::parse(value).map_err(|source| ConfigError::BaseUrl {
            value: value.to_owned(),
            source,
        })?;
        if url.cannot_be_a_base() {
            return Err(ConfigError::OpaqueBaseUrl {
                value: value.to_owned(),
            });
        }
        Ok(url)
    }

    /// Return the storage file path, falling back to the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::StoragePath`] for non-UTF-8 paths.
    pub fn storage_path(&self) -> Result<Utf8PathBuf, ConfigError> {
        let path = self
            .storage_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_PATH));
        Utf8PathBuf::from_path_buf(path).map_err(|path| ConfigError::StoragePath { path })
    }

    /// Return the transport timeout, if one is configured.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds
            .filter(|seconds| *seconds > 0)
            .map(Duration::from_secs)
    }

    /// Return navigation targets with the configured login page.
    #[must_use]
    pub fn navigation_targets(&self) -> NavigationTargets {
        NavigationTargets {
            login: self
                .login_target
                .clone()
                .unwrap_or_else(|| DEFAULT_LOGIN_TARGET.to_owned()),
            ..NavigationTargets::default()
        }
    }

    /// Return the zone timestamps are rendered in.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DisplayOffset`] when the offset is out of range.
    pub fn display_zone(&self) -> Result<DisplayZone, ConfigError> {
        let Some(minutes) = self.display_offset_minutes else {
            return Ok(DisplayZone::Local);
        };
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(DisplayZone::Fixed)
            .ok_or(ConfigError::DisplayOffset { minutes })
    }
}
