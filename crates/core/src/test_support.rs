//! Fixtures shared by the core unit tests.

use crate::config::CoreConfig;
use crate::db::open_database;
use crate::models::{MedicineItem, NewPatient};
use crate::principal::{Principal, Role};
use crate::repositories::diagnoses::{insert_diagnosis, NewDiagnosis};
use crate::repositories::patients::insert_patient;
use crate::repositories::profiles::load_principal;
use crate::status::patient_status;
use chrono::Utc;
use clinic_types::{NonEmptyText, Quantity};
use clinic_uuid::RecordId;
use rusqlite::{params, Connection};
use std::sync::Arc;
use tempfile::TempDir;

pub(crate) fn test_cfg(dir: &TempDir) -> Arc<CoreConfig> {
    Arc::new(
        CoreConfig::with_database(dir.path().join("clinic.sqlite3"))
            .expect("test config should be valid"),
    )
}

/// A migrated database in a fresh temporary directory.
pub(crate) fn test_db() -> (TempDir, Connection) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let conn = open_database(&test_cfg(&dir)).expect("open test database");
    (dir, conn)
}

pub(crate) fn new_patient(queue_number: &str, name: &str) -> NewPatient {
    NewPatient {
        queue_number: NonEmptyText::new(queue_number).unwrap(),
        name: NonEmptyText::new(name).unwrap(),
        age: None,
        phone: None,
        complaint: None,
        appointment_time: None,
    }
}

pub(crate) fn medicine(
    name: &str,
    dosage: &str,
    quantity: i64,
    instructions: Option<&str>,
) -> MedicineItem {
    MedicineItem {
        medicine_name: NonEmptyText::new(name).unwrap(),
        dosage: NonEmptyText::new(dosage).unwrap(),
        quantity: Quantity::new(quantity).unwrap(),
        instructions: NonEmptyText::optional(instructions),
    }
}

/// Insert a profile and its role grants, as the authentication provider would.
pub(crate) fn seed_principal(
    conn: &Connection,
    user_id: &str,
    full_name: Option<&str>,
    roles: &[Role],
) -> Principal {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO profiles (id, full_name, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
        params![user_id, full_name, now],
    )
    .expect("insert profile");
    for role in roles {
        conn.execute(
            "INSERT INTO user_roles (id, user_id, role, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![RecordId::new().to_string(), user_id, role.as_str(), now],
        )
        .expect("insert role");
    }
    load_principal(conn, user_id)
        .expect("load principal")
        .expect("principal exists")
}

/// A patient with one diagnosis and no prescription. Returns `(patient_id, diagnosis_id)`.
pub(crate) fn seed_visit_without_prescription(conn: &Connection) -> (RecordId, RecordId) {
    let now = Utc::now();
    let status = NonEmptyText::new(patient_status::EXAMINED).unwrap();
    let patient = insert_patient(conn, &new_patient("A-001", "Jane Smith"), &status, now)
        .expect("insert patient");
    let text = NonEmptyText::new("Common cold").unwrap();
    let diagnosis_id = insert_diagnosis(
        conn,
        &NewDiagnosis {
            patient_id: patient.id,
            doctor_id: "doc-1",
            doctor_name: "Dr. Amanda Wijaya",
            diagnosis: &text,
            symptoms: None,
            notes: None,
            submission_key: None,
        },
        now,
    )
    .expect("insert diagnosis");
    (patient.id, diagnosis_id)
}
