//! Row conversion utilities shared by the table repositories.

use crate::{ClinicError, ClinicResult};
use chrono::{DateTime, SecondsFormat, Utc};
use clinic_uuid::RecordId;

/// Formats a timestamp for storage.
///
/// Fixed microsecond precision keeps lexicographic order equal to chronological order, so
/// `ORDER BY created_at` sorts correctly on the text column.
pub(crate) fn timestamp_to_sql(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn timestamp_from_sql(table: &'static str, value: &str) -> ClinicResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ClinicError::CorruptRow {
            table,
            reason: format!("invalid timestamp '{}': {}", value, e),
        })
}

pub(crate) fn optional_timestamp_from_sql(
    table: &'static str,
    value: Option<String>,
) -> ClinicResult<Option<DateTime<Utc>>> {
    value.map(|v| timestamp_from_sql(table, &v)).transpose()
}

pub(crate) fn id_from_sql(table: &'static str, value: &str) -> ClinicResult<RecordId> {
    RecordId::parse(value).map_err(|e| ClinicError::CorruptRow {
        table,
        reason: e.to_string(),
    })
}

pub(crate) fn u32_from_sql(table: &'static str, column: &str, value: i64) -> ClinicResult<u32> {
    u32::try_from(value).map_err(|_| ClinicError::CorruptRow {
        table,
        reason: format!("{} out of range: {}", column, value),
    })
}
