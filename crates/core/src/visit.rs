//! Visit record creation.
//!
//! An examination produces a chain of linked rows: the patient (inserted or updated), a
//! diagnosis, and optionally a prescription with its items. The whole chain is written inside
//! one `IMMEDIATE` transaction, so either every row exists afterwards or none does.
//!
//! Input is validated completely before the transaction starts.

use crate::db::open_database;
use crate::models::{MedicineItem, NewPatient, VisitRecord};
use crate::principal::{Action, Principal};
use crate::repositories::diagnoses::{self, NewDiagnosis};
use crate::repositories::prescriptions::{self, NewPrescription};
use crate::repositories::patients;
use crate::status::patient_status;
use crate::{ClinicError, ClinicResult, CoreConfig, NonEmptyText, Quantity, RecordId};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, TransactionBehavior};
use std::sync::Arc;

/// Which patient the examination is for.
#[derive(Clone, Debug)]
pub enum PatientRef {
    /// A patient already registered at intake.
    Existing(RecordId),
    /// A walk-in registered as part of the examination.
    New(NewPatient),
}

/// One medicine line as submitted, before validation.
#[derive(Clone, Debug, Default)]
pub struct MedicineItemInput {
    pub medicine_name: String,
    pub dosage: String,
    pub quantity: i64,
    pub instructions: Option<String>,
}

/// Everything a doctor submits when finishing an examination.
#[derive(Clone, Debug)]
pub struct ExaminationInput {
    pub patient: PatientRef,
    pub diagnosis: String,
    pub symptoms: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<MedicineItemInput>,
    /// Client-generated key identifying this submission. A repeat with the same key by the same
    /// doctor returns the original visit instead of writing a second one.
    pub submission_key: Option<String>,
}

/// Validated examination, ready to be written.
struct StagedVisit {
    patient: PatientRef,
    diagnosis: NonEmptyText,
    symptoms: Option<NonEmptyText>,
    notes: Option<NonEmptyText>,
    items: Vec<MedicineItem>,
    submission_key: Option<NonEmptyText>,
}

impl StagedVisit {
    fn validate(input: ExaminationInput) -> ClinicResult<Self> {
        let diagnosis = NonEmptyText::new(&input.diagnosis)
            .map_err(|_| ClinicError::Validation("diagnosis is required".into()))?;

        let items = input
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| validate_item(i + 1, item))
            .collect::<ClinicResult<Vec<_>>>()?;

        Ok(Self {
            patient: input.patient,
            diagnosis,
            symptoms: NonEmptyText::optional(input.symptoms),
            notes: NonEmptyText::optional(input.notes),
            items,
            submission_key: NonEmptyText::optional(input.submission_key),
        })
    }
}

fn validate_item(line: usize, item: &MedicineItemInput) -> ClinicResult<MedicineItem> {
    let medicine_name = NonEmptyText::new(&item.medicine_name)
        .map_err(|_| ClinicError::Validation(format!("item {}: medicine name is required", line)))?;
    let dosage = NonEmptyText::new(&item.dosage)
        .map_err(|_| ClinicError::Validation(format!("item {}: dosage is required", line)))?;
    let quantity = Quantity::new(item.quantity)
        .map_err(|e| ClinicError::Validation(format!("item {}: {}", line, e)))?;

    Ok(MedicineItem {
        medicine_name,
        dosage,
        quantity,
        instructions: NonEmptyText::optional(item.instructions.as_deref()),
    })
}

/// Records examinations on behalf of an authenticated doctor.
#[derive(Clone)]
pub struct VisitService {
    cfg: Arc<CoreConfig>,
}

impl VisitService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Records an examination: patient, diagnosis and (if any items were staged) a
    /// prescription with its items.
    ///
    /// The doctor id and name written to the diagnosis and prescription are taken from
    /// `doctor`.
    ///
    /// # Errors
    ///
    /// - `ClinicError::Forbidden` if `doctor` may not record examinations.
    /// - `ClinicError::Validation` if the diagnosis is blank or an item is invalid. Nothing is
    ///   written.
    /// - `ClinicError::NotFound` if an existing patient id is unknown.
    /// - `ClinicError::Database` if any write fails. Every write of the visit is rolled back.
    pub fn record_examination(
        &self,
        doctor: &Principal,
        input: ExaminationInput,
    ) -> ClinicResult<VisitRecord> {
        doctor.authorise(Action::Examine)?;
        let staged = StagedVisit::validate(input)?;

        let mut conn = open_database(&self.cfg)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if let Some(key) = &staged.submission_key {
            if let Some(existing) = existing_visit(&tx, &doctor.user_id, key.as_str())? {
                tracing::info!(
                    "Submission {} already recorded as diagnosis {}",
                    key,
                    existing.diagnosis_id
                );
                return Ok(existing);
            }
        }

        let record = match write_visit(&tx, &self.cfg, doctor, &staged, Utc::now()) {
            Ok(record) => record,
            Err(e) => {
                tracing::error!("Visit write failed, rolling back: {:?}", e);
                return Err(e);
            }
        };
        tx.commit()?;

        tracing::info!(
            "Recorded visit for patient {}: diagnosis {}, prescription {}",
            record.patient_id,
            record.diagnosis_id,
            record.prescription_number.as_deref().unwrap_or("none")
        );
        Ok(record)
    }
}

/// The visit `doctor_id` previously wrote under `key`, if any.
fn existing_visit(
    conn: &Connection,
    doctor_id: &str,
    key: &str,
) -> ClinicResult<Option<VisitRecord>> {
    let Some(diagnosis) = diagnoses::find_by_submission_key(conn, doctor_id, key)? else {
        return Ok(None);
    };
    let prescription = prescriptions::get_by_diagnosis(conn, &diagnosis.id)?;
    let item_count = match &prescription {
        Some(p) => prescriptions::items_for(conn, &p.id)?.len() as u32,
        None => 0,
    };

    Ok(Some(VisitRecord {
        patient_id: diagnosis.patient_id,
        diagnosis_id: diagnosis.id,
        prescription_id: prescription.as_ref().map(|p| p.id),
        prescription_number: prescription.map(|p| p.prescription_number),
        item_count,
        created: false,
    }))
}

fn write_visit(
    conn: &Connection,
    cfg: &CoreConfig,
    doctor: &Principal,
    visit: &StagedVisit,
    now: DateTime<Utc>,
) -> ClinicResult<VisitRecord> {
    let examined = NonEmptyText::new(patient_status::EXAMINED)?;
    let patient_id = match &visit.patient {
        PatientRef::Existing(id) => {
            patients::update_patient_status(conn, id, &examined, now)?;
            *id
        }
        PatientRef::New(patient) => patients::insert_patient(conn, patient, &examined, now)?.id,
    };

    let diagnosis_id = diagnoses::insert_diagnosis(
        conn,
        &NewDiagnosis {
            patient_id,
            doctor_id: &doctor.user_id,
            doctor_name: doctor.display_name(),
            diagnosis: &visit.diagnosis,
            symptoms: visit.symptoms.as_ref(),
            notes: visit.notes.as_ref(),
            submission_key: visit.submission_key.as_ref(),
        },
        now,
    )?;

    let mut record = VisitRecord {
        patient_id,
        diagnosis_id,
        prescription_id: None,
        prescription_number: None,
        item_count: 0,
        created: true,
    };
    if visit.items.is_empty() {
        return Ok(record);
    }

    let number =
        prescriptions::next_prescription_number(conn, cfg.prescription_prefix(), now.date_naive())?;
    let prescription_id = prescriptions::insert_prescription(
        conn,
        &NewPrescription {
            prescription_number: &number,
            diagnosis_id,
            patient_id,
            doctor_id: &doctor.user_id,
            doctor_name: doctor.display_name(),
        },
        now,
    )?;
    record.item_count = prescriptions::insert_items(conn, &prescription_id, &visit.items, now)?;
    record.prescription_id = Some(prescription_id);
    record.prescription_number = Some(number.to_string());
    Ok(record)
}
