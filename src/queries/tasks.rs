use aulanet_backend::{Backend, Filter};
use aulanet_shared::AccessorError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use uuid::Uuid;

/// A `tareas` row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskRow {
    pub id: i64,
    pub titulo: String,
    pub descripcion: String,
    pub materia: String,
    pub fecha_entrega: NaiveDate,
    pub docente_id: Uuid,
}

#[derive(Clone, Debug)]
pub struct NewTask {
    pub titulo: String,
    pub descripcion: String,
    pub materia: String,
    pub fecha_entrega: NaiveDate,
    pub docente_id: Uuid,
}

/// An `entregas` row. `nota` stays empty until the docente grades it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRow {
    pub id: i64,
    pub tarea_id: i64,
    pub alumno_id: Uuid,
    /// Storage path of the uploaded file, relative to the `entregas` bucket.
    pub archivo: String,
    pub entregado_at: DateTime<Utc>,
    #[serde(default)]
    pub nota: Option<f32>,
}

pub async fn create<B: Backend>(backend: &B, task: NewTask) -> Result<TaskRow, AccessorError> {
    let row = backend
        .insert(
            "tareas",
            json!({
                "titulo": task.titulo,
                "descripcion": task.descripcion,
                "materia": task.materia,
                "fecha_entrega": task.fecha_entrega,
                "docente_id": task.docente_id,
            }),
        )
        .await?;
    super::decode_row("tareas", row)
}

pub async fn for_teacher<B: Backend>(
    backend: &B,
    docente_id: Uuid,
) -> Result<Vec<TaskRow>, AccessorError> {
    let rows = backend
        .select("tareas", "*", &[Filter::eq("docente_id", docente_id)])
        .await?;
    super::decode_rows("tareas", rows)
}

/// Tasks still worth showing to the alumno: due today or later and not
/// handed in yet.
pub async fn open_for_student<B: Backend>(
    backend: &B,
    alumno_id: Uuid,
    today: NaiveDate,
) -> Result<Vec<TaskRow>, AccessorError> {
    let tasks: Vec<TaskRow> = super::decode_rows("tareas", backend.select("tareas", "*", &[]).await?)?;
    let submissions: Vec<SubmissionRow> = super::decode_rows(
        "entregas",
        backend
            .select("entregas", "*", &[Filter::eq("alumno_id", alumno_id)])
            .await?,
    )?;
    let submitted: HashSet<i64> = submissions.iter().map(|entry| entry.tarea_id).collect();
    Ok(tasks
        .into_iter()
        .filter(|task| task.fecha_entrega >= today && !submitted.contains(&task.id))
        .collect())
}

pub async fn submit<B: Backend>(
    backend: &B,
    tarea_id: i64,
    alumno_id: Uuid,
    archivo: &str,
) -> Result<SubmissionRow, AccessorError> {
    let row = backend
        .insert(
            "entregas",
            json!({
                "tarea_id": tarea_id,
                "alumno_id": alumno_id,
                "archivo": archivo,
                "entregado_at": Utc::now(),
                "nota": null,
            }),
        )
        .await?;
    super::decode_row("entregas", row)
}

pub async fn submissions_for_task<B: Backend>(
    backend: &B,
    tarea_id: i64,
) -> Result<Vec<SubmissionRow>, AccessorError> {
    let rows = backend
        .select("entregas", "*", &[Filter::eq("tarea_id", tarea_id)])
        .await?;
    super::decode_rows("entregas", rows)
}

pub async fn find_submission<B: Backend>(
    backend: &B,
    entrega_id: i64,
) -> Result<Option<SubmissionRow>, AccessorError> {
    let rows = backend
        .select("entregas", "*", &[Filter::eq("id", entrega_id)])
        .await?;
    let Some(row) = rows.into_iter().next() else {
        return Ok(None);
    };
    super::decode_row("entregas", row).map(Some)
}

/// Submissions to this docente's tasks that nobody has graded yet.
pub async fn ungraded_for_teacher<B: Backend>(
    backend: &B,
    docente_id: Uuid,
) -> Result<Vec<SubmissionRow>, AccessorError> {
    let mut pending = Vec::new();
    for task in for_teacher(backend, docente_id).await? {
        let submissions = submissions_for_task(backend, task.id).await?;
        pending.extend(
            submissions
                .into_iter()
                .filter(|entry| entry.nota.is_none()),
        );
    }
    Ok(pending)
}

/// Returns how many rows were graded; zero means the entrega id matched
/// nothing.
pub async fn grade_submission<B: Backend>(
    backend: &B,
    entrega_id: i64,
    nota: f32,
) -> Result<u64, AccessorError> {
    backend
        .update(
            "entregas",
            &[Filter::eq("id", entrega_id)],
            json!({ "nota": nota }),
        )
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use aulanet_backend::MemoryBackend;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, d).unwrap()
    }

    fn seed_task(backend: &MemoryBackend, id: i64, docente_id: Uuid, due: NaiveDate) {
        backend.insert_row(
            "tareas",
            json!({
                "id": id,
                "titulo": format!("TP {id}"),
                "descripcion": "Resolver la guia",
                "materia": "Lengua",
                "fecha_entrega": due,
                "docente_id": docente_id,
            }),
        );
    }

    #[tokio::test]
    async fn open_tasks_skip_past_due_and_submitted() {
        let backend = MemoryBackend::new();
        let docente = Uuid::new_v4();
        let alumno = Uuid::new_v4();
        seed_task(&backend, 1, docente, day(10));
        seed_task(&backend, 2, docente, day(2));
        seed_task(&backend, 3, docente, day(20));
        submit(&backend, 3, alumno, "3/tp.pdf").await.unwrap();

        let open = open_for_student(&backend, alumno, day(5)).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, 1);
    }

    #[tokio::test]
    async fn ungraded_covers_only_this_teachers_tasks() {
        let backend = MemoryBackend::new();
        let docente = Uuid::new_v4();
        let other = Uuid::new_v4();
        let alumno = Uuid::new_v4();
        seed_task(&backend, 1, docente, day(10));
        seed_task(&backend, 2, other, day(10));

        let mine = submit(&backend, 1, alumno, "1/tp.pdf").await.unwrap();
        submit(&backend, 2, alumno, "2/tp.pdf").await.unwrap();

        let pending = ungraded_for_teacher(&backend, docente).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, mine.id);

        assert_eq!(grade_submission(&backend, mine.id, 9.0).await.unwrap(), 1);
        let pending = ungraded_for_teacher(&backend, docente).await.unwrap();
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn grading_a_missing_submission_changes_nothing() {
        let backend = MemoryBackend::new();
        assert_eq!(grade_submission(&backend, 99, 7.0).await.unwrap(), 0);
        assert!(find_submission(&backend, 99).await.unwrap().is_none());
    }
}
