//! Row types for the clinic tables and the inputs used to create them.

use crate::status::PrescriptionStatus;
use chrono::{DateTime, Utc};
use clinic_types::{Age, NonEmptyText, Quantity};
use clinic_uuid::{PrescriptionNumber, RecordId};
use serde::Serialize;

/// Intake details for a new patient.
#[derive(Clone, Debug)]
pub struct NewPatient {
    pub queue_number: NonEmptyText,
    pub name: NonEmptyText,
    pub age: Option<Age>,
    pub phone: Option<NonEmptyText>,
    pub complaint: Option<NonEmptyText>,
    pub appointment_time: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Patient {
    pub id: RecordId,
    pub queue_number: String,
    pub name: String,
    pub age: Option<u8>,
    pub phone: Option<String>,
    pub complaint: Option<String>,
    pub appointment_time: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Diagnosis {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub doctor_id: String,
    pub doctor_name: String,
    pub diagnosis: String,
    pub symptoms: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One medicine line as authored by a doctor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MedicineItem {
    pub medicine_name: NonEmptyText,
    pub dosage: NonEmptyText,
    pub quantity: Quantity,
    pub instructions: Option<NonEmptyText>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Prescription {
    pub id: RecordId,
    pub prescription_number: String,
    pub diagnosis_id: RecordId,
    pub patient_id: RecordId,
    pub doctor_id: String,
    pub doctor_name: String,
    pub status: PrescriptionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PrescriptionItem {
    pub id: RecordId,
    pub prescription_id: RecordId,
    pub position: u32,
    pub medicine_name: String,
    pub dosage: String,
    pub quantity: u32,
    pub instructions: Option<String>,
}

/// Pharmacist queue entry.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PrescriptionSummary {
    pub prescription_number: String,
    pub patient_name: String,
    pub doctor_name: String,
    pub status: PrescriptionStatus,
    pub item_count: u32,
    pub created_at: DateTime<Utc>,
}

/// Consolidated prescription view: prescription, patient name, diagnosis text and items.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PrescriptionDetail {
    pub prescription_number: String,
    pub patient_name: String,
    pub doctor_name: String,
    pub diagnosis: String,
    pub status: PrescriptionStatus,
    pub created_at: DateTime<Utc>,
    pub items: Vec<PrescriptionItem>,
}

/// The linked records produced by one examination.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VisitRecord {
    pub patient_id: RecordId,
    pub diagnosis_id: RecordId,
    pub prescription_id: Option<RecordId>,
    pub prescription_number: Option<String>,
    pub item_count: u32,
    /// False when an earlier submission with the same key was returned instead.
    pub created: bool,
}

impl VisitRecord {
    pub fn parsed_prescription_number(&self) -> Option<PrescriptionNumber> {
        self.prescription_number.as_deref().and_then(|n| n.parse().ok())
    }
}
