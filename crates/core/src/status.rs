//! Status vocabularies for patients and prescriptions.
//!
//! Prescription status is a closed set and is checked both here and by the schema. Patient
//! status is free text; the values this service writes itself are listed in [`patient_status`].

use crate::{ClinicError, ClinicResult};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Patient status values written by the visit workflow.
pub mod patient_status {
    /// Set at intake.
    pub const WAITING: &str = "waiting";
    /// Set when a doctor records an examination.
    pub const EXAMINED: &str = "examined";
}

/// Fulfilment state of a prescription.
///
/// ```text
/// pending ──► preparing ──► ready
///    └────────────────────────▲
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrescriptionStatus {
    Pending,
    Preparing,
    Ready,
}

impl PrescriptionStatus {
    pub const ALL: [PrescriptionStatus; 3] = [Self::Pending, Self::Preparing, Self::Ready];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
        }
    }

    /// States a prescription may be in immediately before moving to `self`.
    pub fn allowed_predecessors(&self) -> &'static [PrescriptionStatus] {
        match self {
            Self::Pending => &[],
            Self::Preparing => &[Self::Pending],
            Self::Ready => &[Self::Pending, Self::Preparing],
        }
    }
}

impl fmt::Display for PrescriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrescriptionStatus {
    type Err = ClinicError;

    fn from_str(s: &str) -> ClinicResult<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "preparing" => Ok(Self::Preparing),
            "ready" => Ok(Self::Ready),
            other => Err(ClinicError::InvalidInput(format!(
                "unknown prescription status '{}'",
                other
            ))),
        }
    }
}
