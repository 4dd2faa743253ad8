//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services as an
//! `Arc<CoreConfig>`. Services never read environment variables while handling a request.

use crate::constants::{DEFAULT_BUSY_TIMEOUT_MS, DEFAULT_DATABASE_PATH, DEFAULT_PRESCRIPTION_PREFIX};
use crate::{ClinicError, ClinicResult};
use clinic_uuid::PrescriptionPrefix;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    database_path: PathBuf,
    prescription_prefix: PrescriptionPrefix,
    busy_timeout: Duration,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `ClinicError::InvalidInput` if `database_path` is empty or names a directory.
    pub fn new(
        database_path: PathBuf,
        prescription_prefix: PrescriptionPrefix,
        busy_timeout: Duration,
    ) -> ClinicResult<Self> {
        if database_path.as_os_str().is_empty() {
            return Err(ClinicError::InvalidInput(
                "database path cannot be empty".into(),
            ));
        }
        if database_path.is_dir() {
            return Err(ClinicError::InvalidInput(format!(
                "database path is a directory: {}",
                database_path.display()
            )));
        }

        Ok(Self {
            database_path,
            prescription_prefix,
            busy_timeout,
        })
    }

    /// Configuration with defaults for everything except the database location.
    pub fn with_database(database_path: PathBuf) -> ClinicResult<Self> {
        Self::new(
            database_path,
            PrescriptionPrefix::default(),
            Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
        )
    }

    /// Build a configuration from raw environment values, applying defaults for unset ones.
    ///
    /// Binaries pass `std::env::var(..).ok()` for `CLINIC_DATABASE_PATH`,
    /// `CLINIC_PRESCRIPTION_PREFIX` and `CLINIC_BUSY_TIMEOUT_MS`.
    pub fn from_env_values(
        database_path: Option<String>,
        prescription_prefix: Option<String>,
        busy_timeout_ms: Option<String>,
    ) -> ClinicResult<Self> {
        let database_path = database_path
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string());
        Self::new(
            PathBuf::from(database_path),
            prescription_prefix_from_env_value(prescription_prefix)?,
            busy_timeout_from_env_value(busy_timeout_ms)?,
        )
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn prescription_prefix(&self) -> &PrescriptionPrefix {
        &self.prescription_prefix
    }

    pub fn busy_timeout(&self) -> Duration {
        self.busy_timeout
    }
}

/// Parse the prescription prefix from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default prefix.
pub fn prescription_prefix_from_env_value(value: Option<String>) -> ClinicResult<PrescriptionPrefix> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_PRESCRIPTION_PREFIX.to_string());
    Ok(PrescriptionPrefix::new(&value)?)
}

/// Parse the busy timeout (milliseconds) from an optional string value.
pub fn busy_timeout_from_env_value(value: Option<String>) -> ClinicResult<Duration> {
    let Some(value) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
        return Ok(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS));
    };
    let millis: u64 = value.parse().map_err(|_| {
        ClinicError::InvalidInput(format!(
            "busy timeout must be a whole number of milliseconds, got '{}'",
            value
        ))
    })?;
    Ok(Duration::from_millis(millis))
}
