//! Patient service: intake, lookup and status tracking.

use crate::db::open_database;
use crate::models::{Diagnosis, NewPatient, Patient};
use crate::repositories::{diagnoses, patients};
use crate::status::patient_status;
use crate::{ClinicError, ClinicResult, CoreConfig, NonEmptyText, RecordId};
use chrono::Utc;
use std::sync::Arc;

/// Pure patient data operations - no API concerns
#[derive(Clone)]
pub struct PatientService {
    cfg: Arc<CoreConfig>,
}

impl PatientService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Registers a patient at the front desk with status `waiting`.
    ///
    /// # Errors
    ///
    /// Returns `ClinicError::Database` if the insert fails.
    pub fn intake(&self, patient: NewPatient) -> ClinicResult<Patient> {
        let conn = open_database(&self.cfg)?;
        let waiting = NonEmptyText::new(patient_status::WAITING)?;
        let stored = patients::insert_patient(&conn, &patient, &waiting, Utc::now())?;
        tracing::info!(
            "Registered patient {} with queue number {}",
            stored.id,
            stored.queue_number
        );
        Ok(stored)
    }

    /// # Errors
    ///
    /// Returns `ClinicError::NotFound` if no patient has `id`.
    pub fn get(&self, id: &RecordId) -> ClinicResult<Patient> {
        let conn = open_database(&self.cfg)?;
        patients::get_patient(&conn, id)?.ok_or_else(|| ClinicError::not_found("patient", id))
    }

    /// The most recently registered patient holding `queue_number`.
    ///
    /// Queue numbers recur across days, so older registrations with the same ticket are
    /// ignored.
    pub fn find_by_queue_number(&self, queue_number: &str) -> ClinicResult<Patient> {
        let conn = open_database(&self.cfg)?;
        patients::find_latest_by_queue_number(&conn, queue_number)?
            .ok_or_else(|| ClinicError::not_found("patient", queue_number.trim()))
    }

    pub fn list(&self, status: Option<&str>) -> ClinicResult<Vec<Patient>> {
        let conn = open_database(&self.cfg)?;
        let status = status.map(str::trim).filter(|s| !s.is_empty());
        patients::list_patients(&conn, status)
    }

    /// Sets a patient's free-text status and returns the updated patient.
    ///
    /// # Errors
    ///
    /// - `ClinicError::Text` if `status` is blank.
    /// - `ClinicError::NotFound` if no patient has `id`.
    pub fn update_status(&self, id: &RecordId, status: &str) -> ClinicResult<Patient> {
        let status = NonEmptyText::new(status)?;
        let conn = open_database(&self.cfg)?;
        patients::update_patient_status(&conn, id, &status, Utc::now())?;
        patients::get_patient(&conn, id)?.ok_or_else(|| ClinicError::not_found("patient", id))
    }

    /// All diagnoses recorded for a patient, oldest first.
    pub fn diagnoses_for_patient(&self, id: &RecordId) -> ClinicResult<Vec<Diagnosis>> {
        let conn = open_database(&self.cfg)?;
        if patients::get_patient(&conn, id)?.is_none() {
            return Err(ClinicError::not_found("patient", id));
        }
        diagnoses::list_for_patient(&conn, id)
    }
}
