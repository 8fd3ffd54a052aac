use aulanet_backend::{Backend, Filter};
use aulanet_shared::AccessorError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// `asistencias.estado` values.
#[derive(
    EnumString,
    Display,
    AsRefStr,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceState {
    Presente,
    Ausente,
    Tarde,
}

/// An `asistencias` row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRow {
    pub id: i64,
    pub alumno_id: Uuid,
    pub fecha: NaiveDate,
    pub estado: AttendanceState,
}

#[derive(Clone, Debug)]
pub struct NewAttendance {
    pub alumno_id: Uuid,
    pub fecha: NaiveDate,
    pub estado: AttendanceState,
}

pub async fn for_student<B: Backend>(
    backend: &B,
    alumno_id: Uuid,
) -> Result<Vec<AttendanceRow>, AccessorError> {
    let rows = backend
        .select("asistencias", "*", &[Filter::eq("alumno_id", alumno_id)])
        .await?;
    super::decode_rows("asistencias", rows)
}

pub async fn record<B: Backend>(
    backend: &B,
    attendance: NewAttendance,
) -> Result<AttendanceRow, AccessorError> {
    let row = backend
        .insert(
            "asistencias",
            json!({
                "alumno_id": attendance.alumno_id,
                "fecha": attendance.fecha,
                "estado": attendance.estado,
            }),
        )
        .await?;
    super::decode_row("asistencias", row)
}

/// Attendance counts for one alumno.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AttendanceSummary {
    pub presentes: usize,
    pub ausentes: usize,
    pub tardes: usize,
}

impl AttendanceSummary {
    pub fn total(&self) -> usize {
        self.presentes + self.ausentes + self.tardes
    }

    /// Fraction of days present, 0.0 when nothing was recorded. A tarde
    /// still counts as an attended day.
    pub fn attendance_rate(&self) -> f32 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.presentes + self.tardes) as f32 / total as f32
    }
}

pub fn summarize(rows: &[AttendanceRow]) -> AttendanceSummary {
    let mut summary = AttendanceSummary::default();
    for row in rows {
        match row.estado {
            AttendanceState::Presente => summary.presentes += 1,
            AttendanceState::Ausente => summary.ausentes += 1,
            AttendanceState::Tarde => summary.tardes += 1,
        }
    }
    summary
}
