//! `diagnoses` table.

use super::helpers::{id_from_sql, timestamp_from_sql, timestamp_to_sql};
use crate::models::Diagnosis;
use crate::ClinicResult;
use chrono::{DateTime, Utc};
use clinic_types::NonEmptyText;
use clinic_uuid::RecordId;
use rusqlite::{params, Connection, OptionalExtension};

const TABLE: &str = "diagnoses";

const SELECT_COLUMNS: &str = "SELECT id, patient_id, doctor_id, doctor_name, diagnosis,
     symptoms, notes, created_at FROM diagnoses";

/// Fields written when a doctor records a diagnosis.
#[derive(Clone, Debug)]
pub struct NewDiagnosis<'a> {
    pub patient_id: RecordId,
    pub doctor_id: &'a str,
    pub doctor_name: &'a str,
    pub diagnosis: &'a NonEmptyText,
    pub symptoms: Option<&'a NonEmptyText>,
    pub notes: Option<&'a NonEmptyText>,
    pub submission_key: Option<&'a NonEmptyText>,
}

struct DiagnosisRow {
    id: String,
    patient_id: String,
    doctor_id: String,
    doctor_name: String,
    diagnosis: String,
    symptoms: Option<String>,
    notes: Option<String>,
    created_at: String,
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DiagnosisRow> {
    Ok(DiagnosisRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        doctor_name: row.get(3)?,
        diagnosis: row.get(4)?,
        symptoms: row.get(5)?,
        notes: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn diagnosis_from_row(row: DiagnosisRow) -> ClinicResult<Diagnosis> {
    Ok(Diagnosis {
        id: id_from_sql(TABLE, &row.id)?,
        patient_id: id_from_sql(TABLE, &row.patient_id)?,
        doctor_id: row.doctor_id,
        doctor_name: row.doctor_name,
        diagnosis: row.diagnosis,
        symptoms: row.symptoms,
        notes: row.notes,
        created_at: timestamp_from_sql(TABLE, &row.created_at)?,
    })
}

/// Insert a diagnosis and return its generated id.
pub fn insert_diagnosis(
    conn: &Connection,
    diagnosis: &NewDiagnosis<'_>,
    now: DateTime<Utc>,
) -> ClinicResult<RecordId> {
    let id = RecordId::new();
    conn.execute(
        "INSERT INTO diagnoses (id, patient_id, doctor_id, doctor_name, diagnosis, symptoms,
         notes, submission_key, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
        params![
            id.to_string(),
            diagnosis.patient_id.to_string(),
            diagnosis.doctor_id,
            diagnosis.doctor_name,
            diagnosis.diagnosis.as_str(),
            diagnosis.symptoms.map(NonEmptyText::as_str),
            diagnosis.notes.map(NonEmptyText::as_str),
            diagnosis.submission_key.map(NonEmptyText::as_str),
            timestamp_to_sql(now),
        ],
    )?;
    Ok(id)
}

pub fn get_diagnosis(conn: &Connection, id: &RecordId) -> ClinicResult<Option<Diagnosis>> {
    let row = conn
        .query_row(
            &format!("{SELECT_COLUMNS} WHERE id = ?1"),
            params![id.to_string()],
            read_row,
        )
        .optional()?;
    row.map(diagnosis_from_row).transpose()
}

/// The diagnosis `doctor_id` recorded under `key`. Keys are scoped per doctor.
pub fn find_by_submission_key(
    conn: &Connection,
    doctor_id: &str,
    key: &str,
) -> ClinicResult<Option<Diagnosis>> {
    let row = conn
        .query_row(
            &format!("{SELECT_COLUMNS} WHERE doctor_id = ?1 AND submission_key = ?2"),
            params![doctor_id, key],
            read_row,
        )
        .optional()?;
    row.map(diagnosis_from_row).transpose()
}

/// Diagnoses recorded for a patient, oldest first.
pub fn list_for_patient(conn: &Connection, patient_id: &RecordId) -> ClinicResult<Vec<Diagnosis>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_COLUMNS} WHERE patient_id = ?1 ORDER BY created_at, rowid"
    ))?;
    let rows = stmt.query_map(params![patient_id.to_string()], read_row)?;

    let mut diagnoses = Vec::new();
    for row in rows {
        diagnoses.push(diagnosis_from_row(row?)?);
    }
    Ok(diagnoses)
}

pub fn count_diagnoses(conn: &Connection) -> ClinicResult<u64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM diagnoses", [], |row| row.get(0))?;
    Ok(count.max(0) as u64)
}
