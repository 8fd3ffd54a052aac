use aulanet_backend::{Backend, Filter};
use aulanet_shared::AccessorError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use uuid::Uuid;

/// A `notas` row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradeRow {
    pub id: i64,
    pub alumno_id: Uuid,
    pub materia: String,
    pub nota: f32,
    pub fecha: NaiveDate,
    pub docente_id: Uuid,
}

/// Grade a docente is about to record.
#[derive(Clone, Debug)]
pub struct NewGrade {
    pub alumno_id: Uuid,
    pub materia: String,
    pub nota: f32,
    pub fecha: NaiveDate,
    pub docente_id: Uuid,
}

pub async fn for_student<B: Backend>(
    backend: &B,
    alumno_id: Uuid,
) -> Result<Vec<GradeRow>, AccessorError> {
    let rows = backend
        .select("notas", "*", &[Filter::eq("alumno_id", alumno_id)])
        .await?;
    super::decode_rows("notas", rows)
}

pub async fn record<B: Backend>(backend: &B, grade: NewGrade) -> Result<GradeRow, AccessorError> {
    let row = backend
        .insert(
            "notas",
            json!({
                "alumno_id": grade.alumno_id,
                "materia": grade.materia,
                "nota": grade.nota,
                "fecha": grade.fecha,
                "docente_id": grade.docente_id,
            }),
        )
        .await?;
    super::decode_row("notas", row)
}

/// Per-subject mean over whatever grades the caller fetched.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SubjectAverage {
    pub materia: String,
    pub promedio: f32,
    pub grade_count: usize,
}

pub fn subject_averages(grades: &[GradeRow]) -> Vec<SubjectAverage> {
    let mut sums: BTreeMap<&str, (f32, usize)> = BTreeMap::new();
    for grade in grades {
        let entry = sums.entry(grade.materia.as_str()).or_insert((0.0, 0));
        entry.0 += grade.nota;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(materia, (sum, count))| SubjectAverage {
            materia: materia.to_string(),
            promedio: sum / count as f32,
            grade_count: count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grade(materia: &str, nota: f32) -> GradeRow {
        GradeRow {
            id: 0,
            alumno_id: Uuid::nil(),
            materia: materia.to_string(),
            nota,
            fecha: NaiveDate::from_ymd_opt(2026, 5, 4).unwrap(),
            docente_id: Uuid::nil(),
        }
    }

    #[test]
    fn averages_group_by_subject() {
        let grades = [
            grade("Lengua", 8.0),
            grade("Historia", 6.0),
            grade("Lengua", 9.0),
        ];
        let averages = subject_averages(&grades);
        assert_eq!(averages.len(), 2);
        assert_eq!(averages[0].materia, "Historia");
        assert_eq!(averages[0].promedio, 6.0);
        assert_eq!(averages[1].materia, "Lengua");
        assert_eq!(averages[1].promedio, 8.5);
        assert_eq!(averages[1].grade_count, 2);
    }

    #[test]
    fn averages_of_nothing_are_empty() {
        assert!(subject_averages(&[]).is_empty());
    }
}
