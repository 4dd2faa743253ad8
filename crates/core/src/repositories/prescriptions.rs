//! `prescriptions`, `prescription_items` and the per-day number counter.

use super::helpers::{id_from_sql, timestamp_from_sql, timestamp_to_sql, u32_from_sql};
use crate::constants::{MISSING_DIAGNOSIS_TEXT, UNKNOWN_PATIENT_NAME};
use crate::models::{MedicineItem, Prescription, PrescriptionDetail, PrescriptionItem, PrescriptionSummary};
use crate::status::PrescriptionStatus;
use crate::{ClinicError, ClinicResult};
use chrono::{DateTime, NaiveDate, Utc};
use clinic_types::NonEmptyText;
use clinic_uuid::{PrescriptionNumber, PrescriptionPrefix, RecordId};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

const TABLE: &str = "prescriptions";
const ITEMS_TABLE: &str = "prescription_items";

const SELECT_COLUMNS: &str = "SELECT id, prescription_number, diagnosis_id, patient_id,
     doctor_id, doctor_name, status, created_at, updated_at FROM prescriptions";

/// Fields written when a prescription is created.
#[derive(Clone, Debug)]
pub struct NewPrescription<'a> {
    pub prescription_number: &'a PrescriptionNumber,
    pub diagnosis_id: RecordId,
    pub patient_id: RecordId,
    pub doctor_id: &'a str,
    pub doctor_name: &'a str,
}

struct PrescriptionRow {
    id: String,
    prescription_number: String,
    diagnosis_id: String,
    patient_id: String,
    doctor_id: String,
    doctor_name: String,
    status: String,
    created_at: String,
    updated_at: String,
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PrescriptionRow> {
    Ok(PrescriptionRow {
        id: row.get(0)?,
        prescription_number: row.get(1)?,
        diagnosis_id: row.get(2)?,
        patient_id: row.get(3)?,
        doctor_id: row.get(4)?,
        doctor_name: row.get(5)?,
        status: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn status_from_sql(table: &'static str, value: &str) -> ClinicResult<PrescriptionStatus> {
    value.parse().map_err(|_| ClinicError::CorruptRow {
        table,
        reason: format!("unknown status '{}'", value),
    })
}

fn prescription_from_row(row: PrescriptionRow) -> ClinicResult<Prescription> {
    Ok(Prescription {
        id: id_from_sql(TABLE, &row.id)?,
        prescription_number: row.prescription_number,
        diagnosis_id: id_from_sql(TABLE, &row.diagnosis_id)?,
        patient_id: id_from_sql(TABLE, &row.patient_id)?,
        doctor_id: row.doctor_id,
        doctor_name: row.doctor_name,
        status: status_from_sql(TABLE, &row.status)?,
        created_at: timestamp_from_sql(TABLE, &row.created_at)?,
        updated_at: timestamp_from_sql(TABLE, &row.updated_at)?,
    })
}

/// Allocate the next prescription number for `day`.
///
/// The counter row is bumped in the caller's connection, so inside a transaction the number is
/// only consumed if the transaction commits. The `UNIQUE` constraint on
/// `prescriptions.prescription_number` remains the final guard.
pub fn next_prescription_number(
    conn: &Connection,
    prefix: &PrescriptionPrefix,
    day: NaiveDate,
) -> ClinicResult<PrescriptionNumber> {
    let day_key = PrescriptionNumber::day_key(day);
    let sequence: i64 = conn.query_row(
        "INSERT INTO prescription_counters (day, last_sequence) VALUES (?1, 1)
         ON CONFLICT(day) DO UPDATE SET last_sequence = last_sequence + 1
         RETURNING last_sequence",
        params![day_key],
        |row| row.get(0),
    )?;
    let sequence = u32_from_sql("prescription_counters", "last_sequence", sequence)?;
    Ok(PrescriptionNumber::new(prefix.clone(), day, sequence)?)
}

/// Insert a `pending` prescription and return its generated id.
pub fn insert_prescription(
    conn: &Connection,
    prescription: &NewPrescription<'_>,
    now: DateTime<Utc>,
) -> ClinicResult<RecordId> {
    let id = RecordId::new();
    conn.execute(
        "INSERT INTO prescriptions (id, prescription_number, diagnosis_id, patient_id,
         doctor_id, doctor_name, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
        params![
            id.to_string(),
            prescription.prescription_number.to_string(),
            prescription.diagnosis_id.to_string(),
            prescription.patient_id.to_string(),
            prescription.doctor_id,
            prescription.doctor_name,
            PrescriptionStatus::Pending.as_str(),
            timestamp_to_sql(now),
        ],
    )?;
    Ok(id)
}

/// Insert all items of a prescription, numbering them by their position in `items`.
pub fn insert_items(
    conn: &Connection,
    prescription_id: &RecordId,
    items: &[MedicineItem],
    now: DateTime<Utc>,
) -> ClinicResult<u32> {
    let mut stmt = conn.prepare(
        "INSERT INTO prescription_items (id, prescription_id, position, medicine_name, dosage,
         quantity, instructions, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    let prescription_id = prescription_id.to_string();
    let now_sql = timestamp_to_sql(now);

    let mut inserted = 0u32;
    for (position, item) in items.iter().enumerate() {
        stmt.execute(params![
            RecordId::new().to_string(),
            prescription_id,
            position as i64,
            item.medicine_name.as_str(),
            item.dosage.as_str(),
            i64::from(item.quantity.get()),
            item.instructions.as_ref().map(NonEmptyText::as_str),
            now_sql,
        ])?;
        inserted += 1;
    }
    Ok(inserted)
}

pub fn get_by_number(conn: &Connection, number: &str) -> ClinicResult<Option<Prescription>> {
    let row = conn
        .query_row(
            &format!("{SELECT_COLUMNS} WHERE prescription_number = ?1"),
            params![number],
            read_row,
        )
        .optional()?;
    row.map(prescription_from_row).transpose()
}

pub fn get_by_diagnosis(conn: &Connection, diagnosis_id: &RecordId) -> ClinicResult<Option<Prescription>> {
    let row = conn
        .query_row(
            &format!("{SELECT_COLUMNS} WHERE diagnosis_id = ?1"),
            params![diagnosis_id.to_string()],
            read_row,
        )
        .optional()?;
    row.map(prescription_from_row).transpose()
}

/// Items of a prescription in authored order.
pub fn items_for(conn: &Connection, prescription_id: &RecordId) -> ClinicResult<Vec<PrescriptionItem>> {
    let mut stmt = conn.prepare(
        "SELECT id, prescription_id, position, medicine_name, dosage, quantity, instructions
         FROM prescription_items WHERE prescription_id = ?1 ORDER BY position",
    )?;
    let rows = stmt.query_map(params![prescription_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, i64>(5)?,
            row.get::<_, Option<String>>(6)?,
        ))
    })?;

    let mut items = Vec::new();
    for row in rows {
        let (id, prescription_id, position, medicine_name, dosage, quantity, instructions) = row?;
        items.push(PrescriptionItem {
            id: id_from_sql(ITEMS_TABLE, &id)?,
            prescription_id: id_from_sql(ITEMS_TABLE, &prescription_id)?,
            position: u32_from_sql(ITEMS_TABLE, "position", position)?,
            medicine_name,
            dosage,
            quantity: u32_from_sql(ITEMS_TABLE, "quantity", quantity)?,
            instructions,
        });
    }
    Ok(items)
}

/// Prescription joined with patient name and diagnosis text, plus its items.
///
/// Two queries: the item lookup needs the id resolved by the first.
pub fn detail(conn: &Connection, number: &str) -> ClinicResult<Option<PrescriptionDetail>> {
    let head = conn
        .query_row(
            "SELECT p.id, p.prescription_number, pt.name, p.doctor_name, d.diagnosis,
                    p.status, p.created_at
             FROM prescriptions p
             LEFT JOIN patients pt ON pt.id = p.patient_id
             LEFT JOIN diagnoses d ON d.id = p.diagnosis_id
             WHERE p.prescription_number = ?1",
            params![number],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                ))
            },
        )
        .optional()?;

    let Some((id, prescription_number, patient_name, doctor_name, diagnosis, status, created_at)) =
        head
    else {
        return Ok(None);
    };

    let id = id_from_sql(TABLE, &id)?;
    let items = items_for(conn, &id)?;

    Ok(Some(PrescriptionDetail {
        prescription_number,
        patient_name: patient_name.unwrap_or_else(|| UNKNOWN_PATIENT_NAME.to_string()),
        doctor_name,
        diagnosis: diagnosis.unwrap_or_else(|| MISSING_DIAGNOSIS_TEXT.to_string()),
        status: status_from_sql(TABLE, &status)?,
        created_at: timestamp_from_sql(TABLE, &created_at)?,
        items,
    }))
}

/// Prescriptions newest first, optionally limited to one status.
pub fn list_summaries(
    conn: &Connection,
    status: Option<PrescriptionStatus>,
) -> ClinicResult<Vec<PrescriptionSummary>> {
    let mut stmt = conn.prepare(
        "SELECT p.prescription_number, pt.name, p.doctor_name, p.status, p.created_at,
                (SELECT COUNT(*) FROM prescription_items i WHERE i.prescription_id = p.id)
         FROM prescriptions p
         LEFT JOIN patients pt ON pt.id = p.patient_id
         WHERE (?1 IS NULL OR p.status = ?1)
         ORDER BY p.created_at DESC, p.rowid DESC",
    )?;
    let rows = stmt.query_map(params![status.map(|s| s.as_str())], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, Option<String>>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, i64>(5)?,
        ))
    })?;

    let mut summaries = Vec::new();
    for row in rows {
        let (prescription_number, patient_name, doctor_name, status, created_at, item_count) =
            row?;
        summaries.push(PrescriptionSummary {
            prescription_number,
            patient_name: patient_name.unwrap_or_else(|| UNKNOWN_PATIENT_NAME.to_string()),
            doctor_name,
            status: status_from_sql(TABLE, &status)?,
            item_count: u32_from_sql(TABLE, "item_count", item_count)?,
            created_at: timestamp_from_sql(TABLE, &created_at)?,
        });
    }
    Ok(summaries)
}

/// Move a prescription to `to`, provided its current status allows it.
///
/// The precondition is part of the `UPDATE`, so a concurrent transition cannot be overwritten.
///
/// # Errors
///
/// - `ClinicError::NotFound` if no prescription has `number`.
/// - `ClinicError::InvalidTransition` if the current status does not permit the move.
pub fn transition_status(
    conn: &Connection,
    number: &str,
    to: PrescriptionStatus,
    now: DateTime<Utc>,
) -> ClinicResult<()> {
    let from = to.allowed_predecessors();
    if !from.is_empty() {
        let placeholders = (0..from.len())
            .map(|i| format!("?{}", i + 4))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE prescriptions SET status = ?1, updated_at = ?2
             WHERE prescription_number = ?3 AND status IN ({placeholders})"
        );

        let mut values: Vec<String> = vec![
            to.as_str().to_string(),
            timestamp_to_sql(now),
            number.to_string(),
        ];
        values.extend(from.iter().map(|s| s.as_str().to_string()));

        if conn.execute(&sql, params_from_iter(values.iter()))? == 1 {
            return Ok(());
        }
    }

    match get_by_number(conn, number)? {
        None => Err(ClinicError::not_found("prescription", number)),
        Some(current) => {
            tracing::warn!(
                "rejected transition of {} from {} to {}",
                number,
                current.status,
                to
            );
            Err(ClinicError::InvalidTransition {
                number: number.to_string(),
                from: current.status,
                to,
            })
        }
    }
}

pub fn count_prescriptions(conn: &Connection) -> ClinicResult<u64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM prescriptions", [], |row| row.get(0))?;
    Ok(count.max(0) as u64)
}

pub fn count_items(conn: &Connection) -> ClinicResult<u64> {
    let count: i64 =
        conn.query_row("SELECT COUNT(*) FROM prescription_items", [], |row| row.get(0))?;
    Ok(count.max(0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{medicine, seed_visit_without_prescription, test_db};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    #[test]
    fn numbers_count_up_per_day() {
        let (_dir, conn) = test_db();
        let prefix = PrescriptionPrefix::default();

        let first = next_prescription_number(&conn, &prefix, day()).unwrap();
        let second = next_prescription_number(&conn, &prefix, day()).unwrap();
        let next_day = next_prescription_number(&conn, &prefix, day().succ_opt().unwrap()).unwrap();

        assert_eq!(first.to_string(), "R-20261016-0001");
        assert_eq!(second.to_string(), "R-20261016-0002");
        assert_eq!(next_day.to_string(), "R-20261017-0001");
    }

    #[test]
    fn number_is_not_consumed_when_transaction_rolls_back() {
        let (_dir, mut conn) = test_db();
        let prefix = PrescriptionPrefix::default();
        {
            let tx = conn.transaction().unwrap();
            next_prescription_number(&tx, &prefix, day()).unwrap();
            // dropped without commit
        }
        let number = next_prescription_number(&conn, &prefix, day()).unwrap();
        assert_eq!(number.sequence(), 1);
    }

    #[test]
    fn items_are_returned_in_authored_order() {
        let (_dir, conn) = test_db();
        let now = Utc::now();
        let (patient_id, diagnosis_id) = seed_visit_without_prescription(&conn);
        let number = next_prescription_number(&conn, &PrescriptionPrefix::default(), day()).unwrap();
        let id = insert_prescription(
            &conn,
            &NewPrescription {
                prescription_number: &number,
                diagnosis_id,
                patient_id,
                doctor_id: "doc-1",
                doctor_name: "Dr. Amanda Wijaya",
            },
            now,
        )
        .unwrap();

        let items = vec![
            medicine("Paracetamol", "500mg", 10, Some("3x daily")),
            medicine("Amoxicillin", "250mg", 21, None),
            medicine("Cetirizine", "10mg", 5, Some("at night")),
        ];
        assert_eq!(insert_items(&conn, &id, &items, now).unwrap(), 3);

        let stored = items_for(&conn, &id).unwrap();
        let names: Vec<&str> = stored.iter().map(|i| i.medicine_name.as_str()).collect();
        assert_eq!(names, ["Paracetamol", "Amoxicillin", "Cetirizine"]);
        assert_eq!(stored[1].instructions, None);
        assert_eq!(stored[2].quantity, 5);
        assert!(stored.iter().all(|i| i.prescription_id == id));
    }

    #[test]
    fn detail_of_unknown_number_is_none() {
        let (_dir, conn) = test_db();
        assert!(detail(&conn, "R-20261016-0099").unwrap().is_none());
    }

    #[test]
    fn dangling_references_fall_back_to_placeholders() {
        let (_dir, conn) = test_db();
        conn.execute_batch("PRAGMA foreign_keys = OFF;").unwrap();
        let now = Utc::now();
        let number = next_prescription_number(&conn, &PrescriptionPrefix::default(), day()).unwrap();
        let id = insert_prescription(
            &conn,
            &NewPrescription {
                prescription_number: &number,
                diagnosis_id: RecordId::new(),
                patient_id: RecordId::new(),
                doctor_id: "doc-1",
                doctor_name: "Dr. Amanda Wijaya",
            },
            now,
        )
        .unwrap();
        insert_items(&conn, &id, &[medicine("Paracetamol", "500mg", 10, None)], now).unwrap();

        let found = detail(&conn, &number.to_string()).unwrap().unwrap();
        assert_eq!(found.patient_name, UNKNOWN_PATIENT_NAME);
        assert_eq!(found.diagnosis, MISSING_DIAGNOSIS_TEXT);
        assert_eq!(found.doctor_name, "Dr. Amanda Wijaya");
        assert_eq!(found.items.len(), 1);

        let summaries = list_summaries(&conn, None).unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].patient_name, UNKNOWN_PATIENT_NAME);
        assert_eq!(summaries[0].item_count, 1);
    }

    #[test]
    fn transition_reports_not_found_and_invalid_moves() {
        let (_dir, conn) = test_db();
        let now = Utc::now();
        let (patient_id, diagnosis_id) = seed_visit_without_prescription(&conn);
        let number = next_prescription_number(&conn, &PrescriptionPrefix::default(), day()).unwrap();
        insert_prescription(
            &conn,
            &NewPrescription {
                prescription_number: &number,
                diagnosis_id,
                patient_id,
                doctor_id: "doc-1",
                doctor_name: "Dr. A",
            },
            now,
        )
        .unwrap();
        let number = number.to_string();

        let err = transition_status(&conn, "R-20000101-0001", PrescriptionStatus::Ready, now)
            .unwrap_err();
        assert!(matches!(err, ClinicError::NotFound { .. }));

        transition_status(&conn, &number, PrescriptionStatus::Preparing, now).unwrap();
        transition_status(&conn, &number, PrescriptionStatus::Ready, now).unwrap();

        let err = transition_status(&conn, &number, PrescriptionStatus::Ready, now).unwrap_err();
        assert!(matches!(
            err,
            ClinicError::InvalidTransition {
                from: PrescriptionStatus::Ready,
                to: PrescriptionStatus::Ready,
                ..
            }
        ));

        let err =
            transition_status(&conn, &number, PrescriptionStatus::Pending, now).unwrap_err();
        assert!(matches!(err, ClinicError::InvalidTransition { .. }));
    }
}
