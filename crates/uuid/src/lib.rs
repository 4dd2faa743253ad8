//! Record identifiers and prescription numbers.
//!
//! Every row the clinic service stores is keyed by a *canonical* UUID: **32 lowercase hexadecimal
//! characters** (no hyphens). Identifiers supplied from outside the core (API paths, CLI
//! arguments) must already be canonical; [`RecordId::parse`] rejects anything else.
//!
//! ## Canonical UUID form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! Prescriptions additionally carry a human-facing number, [`PrescriptionNumber`], of the form
//! `<PREFIX>-<YYYYMMDD>-<NNNN>`, e.g. `R-20261016-0042`. The sequence part is issued by the
//! store (see `clinic-core`), never by the client.

mod prescription_number;
mod record_id;

pub use prescription_number::{PrescriptionNumber, PrescriptionPrefix};
pub use record_id::{RecordId, Uuid};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
