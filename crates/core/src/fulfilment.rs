//! Pharmacist-facing prescription fulfilment.

use crate::db::open_database;
use crate::models::{PrescriptionDetail, PrescriptionSummary};
use crate::principal::{Action, Principal};
use crate::repositories::prescriptions;
use crate::status::PrescriptionStatus;
use crate::{ClinicError, ClinicResult, CoreConfig};
use chrono::Utc;
use std::sync::Arc;

#[derive(Clone)]
pub struct FulfilmentService {
    cfg: Arc<CoreConfig>,
}

impl FulfilmentService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Consolidated view of one prescription: patient name, doctor, diagnosis text and the
    /// items in authored order.
    ///
    /// # Errors
    ///
    /// Returns `ClinicError::NotFound` if no prescription has `number`.
    pub fn prescription_detail(&self, number: &str) -> ClinicResult<PrescriptionDetail> {
        let number = number.trim();
        let conn = open_database(&self.cfg)?;
        prescriptions::detail(&conn, number)?
            .ok_or_else(|| ClinicError::not_found("prescription", number))
    }

    /// Pharmacist queue, newest first.
    pub fn list_prescriptions(
        &self,
        status: Option<PrescriptionStatus>,
    ) -> ClinicResult<Vec<PrescriptionSummary>> {
        let conn = open_database(&self.cfg)?;
        prescriptions::list_summaries(&conn, status)
    }

    /// `pending` → `preparing`.
    pub fn start_preparing(
        &self,
        pharmacist: &Principal,
        number: &str,
    ) -> ClinicResult<PrescriptionDetail> {
        self.transition(pharmacist, number, PrescriptionStatus::Preparing)
    }

    /// `pending` or `preparing` → `ready`. Only the status and `updated_at` change.
    ///
    /// # Errors
    ///
    /// - `ClinicError::Forbidden` if `pharmacist` may not dispense.
    /// - `ClinicError::NotFound` if no prescription has `number`.
    /// - `ClinicError::InvalidTransition` if the prescription is already `ready`.
    pub fn mark_ready(
        &self,
        pharmacist: &Principal,
        number: &str,
    ) -> ClinicResult<PrescriptionDetail> {
        self.transition(pharmacist, number, PrescriptionStatus::Ready)
    }

    fn transition(
        &self,
        pharmacist: &Principal,
        number: &str,
        to: PrescriptionStatus,
    ) -> ClinicResult<PrescriptionDetail> {
        pharmacist.authorise(Action::Dispense)?;
        let number = number.trim();
        let conn = open_database(&self.cfg)?;
        prescriptions::transition_status(&conn, number, to, Utc::now())?;
        tracing::info!("Prescription {} is now {} ({})", number, to, pharmacist.user_id);

        prescriptions::detail(&conn, number)?
            .ok_or_else(|| ClinicError::not_found("prescription", number))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::principal::Role;
    use crate::repositories::{diagnoses, patients};
    use crate::test_support::{new_patient, seed_principal, test_cfg};
    use crate::visit::{ExaminationInput, MedicineItemInput, PatientRef, VisitService};
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        cfg: Arc<CoreConfig>,
        service: FulfilmentService,
        pharmacist: Principal,
        number: String,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(&dir);
        let conn = open_database(&cfg).unwrap();
        let doctor = seed_principal(&conn, "doc-1", Some("Dr. Amanda Wijaya"), &[Role::Doctor]);
        let pharmacist = seed_principal(&conn, "pharm-1", Some("Budi"), &[Role::Pharmacist]);

        let record = VisitService::new(cfg.clone())
            .record_examination(
                &doctor,
                ExaminationInput {
                    patient: PatientRef::New(new_patient("A-025", "Jane Smith")),
                    diagnosis: "Common cold".into(),
                    symptoms: None,
                    notes: None,
                    items: vec![
                        MedicineItemInput {
                            medicine_name: "Paracetamol".into(),
                            dosage: "500mg".into(),
                            quantity: 10,
                            instructions: Some("3x daily".into()),
                        },
                        MedicineItemInput {
                            medicine_name: "Vitamin C".into(),
                            dosage: "1000mg".into(),
                            quantity: 7,
                            instructions: None,
                        },
                    ],
                    submission_key: None,
                },
            )
            .unwrap();

        Fixture {
            _dir: dir,
            service: FulfilmentService::new(cfg.clone()),
            cfg,
            pharmacist,
            number: record.prescription_number.unwrap(),
        }
    }

    #[test]
    fn detail_joins_patient_diagnosis_and_items() {
        let f = fixture();
        let detail = f.service.prescription_detail(&f.number).unwrap();

        assert_eq!(detail.prescription_number, f.number);
        assert_eq!(detail.patient_name, "Jane Smith");
        assert_eq!(detail.doctor_name, "Dr. Amanda Wijaya");
        assert_eq!(detail.diagnosis, "Common cold");
        assert_eq!(detail.status, PrescriptionStatus::Pending);
        let names: Vec<&str> = detail.items.iter().map(|i| i.medicine_name.as_str()).collect();
        assert_eq!(names, ["Paracetamol", "Vitamin C"]);
    }

    #[test]
    fn unknown_number_is_not_found() {
        let f = fixture();
        assert!(matches!(
            f.service.prescription_detail("R-19990101-0001"),
            Err(ClinicError::NotFound { entity: "prescription", .. })
        ));
        assert!(matches!(
            f.service.mark_ready(&f.pharmacist, "R-19990101-0001"),
            Err(ClinicError::NotFound { .. })
        ));
    }

    #[test]
    fn mark_ready_changes_only_the_status() {
        let f = fixture();
        let conn = open_database(&f.cfg).unwrap();
        let before = prescriptions::get_by_number(&conn, &f.number).unwrap().unwrap();
        let patients_before = patients::list_patients(&conn, None).unwrap();
        let diagnoses_before = diagnoses::list_for_patient(&conn, &before.patient_id).unwrap();
        let items_before = prescriptions::items_for(&conn, &before.id).unwrap();

        let detail = f.service.mark_ready(&f.pharmacist, &f.number).unwrap();
        assert_eq!(detail.status, PrescriptionStatus::Ready);

        let after = prescriptions::get_by_number(&conn, &f.number).unwrap().unwrap();
        assert_eq!(after.status, PrescriptionStatus::Ready);
        assert!(after.updated_at >= before.updated_at);
        assert_eq!(
            (after.id, after.patient_id, after.diagnosis_id, &after.doctor_id, after.created_at),
            (before.id, before.patient_id, before.diagnosis_id, &before.doctor_id, before.created_at)
        );
        assert_eq!(patients::list_patients(&conn, None).unwrap(), patients_before);
        assert_eq!(
            diagnoses::list_for_patient(&conn, &before.patient_id).unwrap(),
            diagnoses_before
        );
        assert_eq!(prescriptions::items_for(&conn, &before.id).unwrap(), items_before);
    }

    #[test]
    fn ready_prescription_cannot_be_marked_again() {
        let f = fixture();
        f.service.mark_ready(&f.pharmacist, &f.number).unwrap();
        assert!(matches!(
            f.service.mark_ready(&f.pharmacist, &f.number),
            Err(ClinicError::InvalidTransition {
                from: PrescriptionStatus::Ready,
                ..
            })
        ));
        assert!(matches!(
            f.service.start_preparing(&f.pharmacist, &f.number),
            Err(ClinicError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn preparing_then_ready() {
        let f = fixture();
        let detail = f.service.start_preparing(&f.pharmacist, &f.number).unwrap();
        assert_eq!(detail.status, PrescriptionStatus::Preparing);

        let queue = f
            .service
            .list_prescriptions(Some(PrescriptionStatus::Preparing))
            .unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].item_count, 2);
        assert_eq!(queue[0].patient_name, "Jane Smith");
        assert!(f
            .service
            .list_prescriptions(Some(PrescriptionStatus::Pending))
            .unwrap()
            .is_empty());

        let detail = f.service.mark_ready(&f.pharmacist, &f.number).unwrap();
        assert_eq!(detail.status, PrescriptionStatus::Ready);
    }

    #[test]
    fn doctors_cannot_dispense() {
        let f = fixture();
        let conn = open_database(&f.cfg).unwrap();
        let doctor = crate::repositories::profiles::load_principal(&conn, "doc-1")
            .unwrap()
            .unwrap();
        assert!(matches!(
            f.service.mark_ready(&doctor, &f.number),
            Err(ClinicError::Forbidden { .. })
        ));
        assert_eq!(
            f.service.prescription_detail(&f.number).unwrap().status,
            PrescriptionStatus::Pending
        );
    }
}
