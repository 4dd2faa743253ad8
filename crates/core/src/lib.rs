//! # Clinic Core
//!
//! Core business logic for the clinic visit workflow.
//!
//! This crate contains the data operations behind a clinic's front desk, consulting room and
//! pharmacy counter:
//! - Patient intake and status tracking
//! - Recording an examination (diagnosis plus optional prescription) as one atomic visit
//! - Prescription fulfilment: consolidated detail view and status transitions
//! - Read-only access to profiles and role grants owned by the authentication provider
//!
//! Storage is a single SQLite database opened through [`db::open_database`].
//!
//! **No API concerns**: HTTP servers, header parsing and wire DTOs belong in `api-rest` and
//! `api-shared`.

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod fulfilment;
pub mod models;
pub mod patient;
pub mod principal;
pub mod repositories;
pub mod status;
pub mod visit;

#[cfg(test)]
pub(crate) mod test_support;

pub use clinic_types::{Age, NonEmptyText, Quantity, QuantityError, TextError};
pub use clinic_uuid::{PrescriptionNumber, PrescriptionPrefix, RecordId};

pub use config::CoreConfig;
pub use error::{ClinicError, ClinicResult};
pub use fulfilment::FulfilmentService;
pub use models::{
    Diagnosis, MedicineItem, NewPatient, Patient, Prescription, PrescriptionDetail,
    PrescriptionItem, PrescriptionSummary, VisitRecord,
};
pub use patient::PatientService;
pub use principal::{resolve_principal, Action, Principal, Role};
pub use status::{patient_status, PrescriptionStatus};
pub use visit::{ExaminationInput, MedicineItemInput, PatientRef, VisitService};
