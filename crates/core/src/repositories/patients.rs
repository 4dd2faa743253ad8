//! `patients` table.

use super::helpers::{
    id_from_sql, optional_timestamp_from_sql, timestamp_from_sql, timestamp_to_sql,
};
use crate::models::{NewPatient, Patient};
use crate::{ClinicError, ClinicResult};
use chrono::{DateTime, Utc};
use clinic_types::NonEmptyText;
use clinic_uuid::RecordId;
use rusqlite::{params, Connection, OptionalExtension};

const TABLE: &str = "patients";

const SELECT_COLUMNS: &str = "SELECT id, queue_number, name, age, phone, complaint,
     appointment_time, status, created_at, updated_at FROM patients";

struct PatientRow {
    id: String,
    queue_number: String,
    name: String,
    age: Option<i64>,
    phone: Option<String>,
    complaint: Option<String>,
    appointment_time: Option<String>,
    status: Option<String>,
    created_at: String,
    updated_at: String,
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PatientRow> {
    Ok(PatientRow {
        id: row.get(0)?,
        queue_number: row.get(1)?,
        name: row.get(2)?,
        age: row.get(3)?,
        phone: row.get(4)?,
        complaint: row.get(5)?,
        appointment_time: row.get(6)?,
        status: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn patient_from_row(row: PatientRow) -> ClinicResult<Patient> {
    let age = row
        .age
        .map(|a| {
            u8::try_from(a).map_err(|_| ClinicError::CorruptRow {
                table: TABLE,
                reason: format!("age out of range: {}", a),
            })
        })
        .transpose()?;

    Ok(Patient {
        id: id_from_sql(TABLE, &row.id)?,
        queue_number: row.queue_number,
        name: row.name,
        age,
        phone: row.phone,
        complaint: row.complaint,
        appointment_time: optional_timestamp_from_sql(TABLE, row.appointment_time)?,
        status: row.status,
        created_at: timestamp_from_sql(TABLE, &row.created_at)?,
        updated_at: timestamp_from_sql(TABLE, &row.updated_at)?,
    })
}

/// Insert a patient with the given initial status and return the stored row.
pub fn insert_patient(
    conn: &Connection,
    patient: &NewPatient,
    status: &NonEmptyText,
    now: DateTime<Utc>,
) -> ClinicResult<Patient> {
    let id = RecordId::new();
    let now_sql = timestamp_to_sql(now);

    conn.execute(
        "INSERT INTO patients (id, queue_number, name, age, phone, complaint,
         appointment_time, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
        params![
            id.to_string(),
            patient.queue_number.as_str(),
            patient.name.as_str(),
            patient.age.map(|a| i64::from(a.get())),
            patient.phone.as_ref().map(NonEmptyText::as_str),
            patient.complaint.as_ref().map(NonEmptyText::as_str),
            patient.appointment_time.map(timestamp_to_sql),
            status.as_str(),
            now_sql,
        ],
    )?;

    get_patient(conn, &id)?.ok_or_else(|| ClinicError::not_found("patient", id))
}

pub fn get_patient(conn: &Connection, id: &RecordId) -> ClinicResult<Option<Patient>> {
    let row = conn
        .query_row(
            &format!("{SELECT_COLUMNS} WHERE id = ?1"),
            params![id.to_string()],
            read_row,
        )
        .optional()?;
    row.map(patient_from_row).transpose()
}

/// The most recently registered patient holding `queue_number`.
pub fn find_latest_by_queue_number(
    conn: &Connection,
    queue_number: &str,
) -> ClinicResult<Option<Patient>> {
    let row = conn
        .query_row(
            &format!(
                "{SELECT_COLUMNS} WHERE queue_number = ?1
                 ORDER BY created_at DESC, rowid DESC LIMIT 1"
            ),
            params![queue_number.trim()],
            read_row,
        )
        .optional()?;
    row.map(patient_from_row).transpose()
}

/// Patients in registration order, optionally filtered by status.
pub fn list_patients(conn: &Connection, status: Option<&str>) -> ClinicResult<Vec<Patient>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_COLUMNS} WHERE (?1 IS NULL OR status = ?1) ORDER BY created_at, rowid"
    ))?;
    let rows = stmt.query_map(params![status], read_row)?;

    let mut patients = Vec::new();
    for row in rows {
        patients.push(patient_from_row(row?)?);
    }
    Ok(patients)
}

/// Set a patient's free-text status.
///
/// # Errors
///
/// Returns `ClinicError::NotFound` when no patient has `id`.
pub fn update_patient_status(
    conn: &Connection,
    id: &RecordId,
    status: &NonEmptyText,
    now: DateTime<Utc>,
) -> ClinicResult<()> {
    let changed = conn.execute(
        "UPDATE patients SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), timestamp_to_sql(now), id.to_string()],
    )?;
    if changed == 0 {
        return Err(ClinicError::not_found("patient", id));
    }
    Ok(())
}

pub fn count_patients(conn: &Connection) -> ClinicResult<u64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))?;
    Ok(count.max(0) as u64)
}
