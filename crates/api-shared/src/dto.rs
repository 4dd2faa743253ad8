//! Request and response bodies for the clinic API.
//!
//! Identifiers are canonical 32-character hex strings and timestamps are RFC 3339 strings.

use chrono::{DateTime, SecondsFormat, Utc};
use clinic_core::{
    Age, ClinicError, ClinicResult, Diagnosis, MedicineItemInput, NewPatient, NonEmptyText,
    Patient, PrescriptionDetail, PrescriptionItem, PrescriptionSummary, VisitRecord,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

fn timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Optional `?status=` filter on list endpoints.
#[derive(Clone, Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatusQuery {
    pub status: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct IntakeReq {
    pub queue_number: String,
    pub name: String,
    pub age: Option<i64>,
    pub phone: Option<String>,
    pub complaint: Option<String>,
    /// RFC 3339 timestamp.
    pub appointment_time: Option<String>,
}

impl IntakeReq {
    /// # Errors
    ///
    /// Returns a client error if the queue number or name is blank, the age is outside
    /// 0..=150, or the appointment time is not RFC 3339.
    pub fn into_new_patient(self) -> ClinicResult<NewPatient> {
        let appointment_time = NonEmptyText::optional(self.appointment_time)
            .map(|t| {
                DateTime::parse_from_rfc3339(t.as_str())
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| {
                        ClinicError::InvalidInput(format!("appointment_time: {}", e))
                    })
            })
            .transpose()?;

        Ok(NewPatient {
            queue_number: NonEmptyText::new(&self.queue_number)
                .map_err(|_| ClinicError::Validation("queue_number is required".into()))?,
            name: NonEmptyText::new(&self.name)
                .map_err(|_| ClinicError::Validation("name is required".into()))?,
            age: self.age.map(Age::new).transpose()?,
            phone: NonEmptyText::optional(self.phone),
            complaint: NonEmptyText::optional(self.complaint),
            appointment_time,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PatientRes {
    pub id: String,
    pub queue_number: String,
    pub name: String,
    pub age: Option<u8>,
    pub phone: Option<String>,
    pub complaint: Option<String>,
    pub appointment_time: Option<String>,
    pub status: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Patient> for PatientRes {
    fn from(p: Patient) -> Self {
        Self {
            id: p.id.to_string(),
            queue_number: p.queue_number,
            name: p.name,
            age: p.age,
            phone: p.phone,
            complaint: p.complaint,
            appointment_time: p.appointment_time.map(timestamp),
            status: p.status,
            created_at: timestamp(p.created_at),
            updated_at: timestamp(p.updated_at),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ListPatientsRes {
    pub patients: Vec<PatientRes>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateStatusReq {
    pub status: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DiagnosisRes {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub doctor_name: String,
    pub diagnosis: String,
    pub symptoms: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
}

impl From<Diagnosis> for DiagnosisRes {
    fn from(d: Diagnosis) -> Self {
        Self {
            id: d.id.to_string(),
            patient_id: d.patient_id.to_string(),
            doctor_id: d.doctor_id,
            doctor_name: d.doctor_name,
            diagnosis: d.diagnosis,
            symptoms: d.symptoms,
            notes: d.notes,
            created_at: timestamp(d.created_at),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ListDiagnosesRes {
    pub diagnoses: Vec<DiagnosisRes>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct MedicineItemReq {
    pub medicine_name: String,
    pub dosage: String,
    pub quantity: i64,
    pub instructions: Option<String>,
}

impl From<MedicineItemReq> for MedicineItemInput {
    fn from(item: MedicineItemReq) -> Self {
        Self {
            medicine_name: item.medicine_name,
            dosage: item.dosage,
            quantity: item.quantity,
            instructions: item.instructions,
        }
    }
}

/// An examination for either a registered patient (`patient_id`) or a walk-in
/// (`new_patient`). Exactly one of the two must be given.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ExaminationReq {
    pub patient_id: Option<String>,
    pub new_patient: Option<IntakeReq>,
    pub diagnosis: String,
    pub symptoms: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<MedicineItemReq>,
    pub submission_key: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct VisitRes {
    pub patient_id: String,
    pub diagnosis_id: String,
    pub prescription_id: Option<String>,
    pub prescription_number: Option<String>,
    pub item_count: u32,
    /// False when the submission key matched an earlier visit.
    pub created: bool,
}

impl From<VisitRecord> for VisitRes {
    fn from(v: VisitRecord) -> Self {
        Self {
            patient_id: v.patient_id.to_string(),
            diagnosis_id: v.diagnosis_id.to_string(),
            prescription_id: v.prescription_id.map(|id| id.to_string()),
            prescription_number: v.prescription_number,
            item_count: v.item_count,
            created: v.created,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PrescriptionItemRes {
    pub position: u32,
    pub medicine_name: String,
    pub dosage: String,
    pub quantity: u32,
    pub instructions: Option<String>,
}

impl From<PrescriptionItem> for PrescriptionItemRes {
    fn from(i: PrescriptionItem) -> Self {
        Self {
            position: i.position,
            medicine_name: i.medicine_name,
            dosage: i.dosage,
            quantity: i.quantity,
            instructions: i.instructions,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PrescriptionDetailRes {
    pub prescription_number: String,
    pub patient_name: String,
    pub doctor_name: String,
    pub diagnosis: String,
    pub status: String,
    pub created_at: String,
    pub items: Vec<PrescriptionItemRes>,
}

impl From<PrescriptionDetail> for PrescriptionDetailRes {
    fn from(d: PrescriptionDetail) -> Self {
        Self {
            prescription_number: d.prescription_number,
            patient_name: d.patient_name,
            doctor_name: d.doctor_name,
            diagnosis: d.diagnosis,
            status: d.status.to_string(),
            created_at: timestamp(d.created_at),
            items: d.items.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PrescriptionSummaryRes {
    pub prescription_number: String,
    pub patient_name: String,
    pub doctor_name: String,
    pub status: String,
    pub item_count: u32,
    pub created_at: String,
}

impl From<PrescriptionSummary> for PrescriptionSummaryRes {
    fn from(s: PrescriptionSummary) -> Self {
        Self {
            prescription_number: s.prescription_number,
            patient_name: s.patient_name,
            doctor_name: s.doctor_name,
            status: s.status.to_string(),
            item_count: s.item_count,
            created_at: timestamp(s.created_at),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ListPrescriptionsRes {
    pub prescriptions: Vec<PrescriptionSummaryRes>,
}
