//! Constants used throughout the clinic core crate.

/// Default location of the SQLite database when no explicit path is configured.
pub const DEFAULT_DATABASE_PATH: &str = "clinic_data/clinic.sqlite3";

/// Default prescription number prefix.
pub const DEFAULT_PRESCRIPTION_PREFIX: &str = "R";

/// Default time a connection waits on a locked database before failing.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Patient name shown when a prescription's patient row cannot be resolved.
pub const UNKNOWN_PATIENT_NAME: &str = "Unknown";

/// Diagnosis text shown when a prescription's diagnosis row cannot be resolved.
pub const MISSING_DIAGNOSIS_TEXT: &str = "No diagnosis";
