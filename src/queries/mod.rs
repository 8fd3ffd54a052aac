//! Typed reads and writes over the portal tables
//!
//! Each module covers one table family: a row struct mirroring the wire
//! shape, query functions over the [`Backend`](aulanet_backend::Backend)
//! trait, and the pure aggregations the dashboards display. Rows that do
//! not decode are reported as malformed, never skipped silently.

pub mod attendance;
pub mod certificates;
pub mod grades;
pub mod messages;
pub mod tasks;

pub use attendance::{AttendanceRow, AttendanceState, AttendanceSummary, NewAttendance};
pub use certificates::{CertificateRow, NewCertificate};
pub use grades::{GradeRow, NewGrade, SubjectAverage};
pub use messages::{MessageRow, NewMessage};
pub use tasks::{NewTask, SubmissionRow, TaskRow};

use aulanet_shared::AccessorError;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub(crate) fn decode_rows<T: DeserializeOwned>(
    table: &'static str,
    rows: Vec<Value>,
) -> Result<Vec<T>, AccessorError> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row).map_err(|err| AccessorError::Malformed {
                table,
                reason: err.to_string(),
            })
        })
        .collect()
}

pub(crate) fn decode_row<T: DeserializeOwned>(
    table: &'static str,
    row: Value,
) -> Result<T, AccessorError> {
    serde_json::from_value(row).map_err(|err| AccessorError::Malformed {
        table,
        reason: err.to_string(),
    })
}
