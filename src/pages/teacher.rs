use super::{PageError, PanelIdentity, guard};
use crate::queries::{
    self, AttendanceRow, AttendanceState, GradeRow, NewAttendance, NewGrade, NewTask,
    SubmissionRow, TaskRow,
};
use aulanet_auth::{ProfileStore, UserProfile};
use aulanet_backend::Backend;
use aulanet_shared::Role;
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

const DOWNLOAD_URL_TTL_SECS: u64 = 3600;

/// Everything the docente landing page shows.
#[derive(Debug, Serialize)]
pub struct TeacherDashboard {
    pub profile: UserProfile,
    pub tasks: Vec<TaskRow>,
    pub ungraded_submissions: Vec<SubmissionRow>,
    pub unread_messages: usize,
}

pub struct TeacherPanel<B> {
    backend: Arc<B>,
    profiles: ProfileStore<B>,
}

impl<B: Backend> TeacherPanel<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            profiles: ProfileStore::new(backend.clone()),
            backend,
        }
    }

    pub async fn dashboard(&self) -> Result<TeacherDashboard, PageError> {
        let PanelIdentity { user_id, profile } =
            guard(self.backend.as_ref(), &self.profiles, Role::Docente).await?;

        let tasks = queries::tasks::for_teacher(self.backend.as_ref(), user_id).await?;
        let ungraded_submissions =
            queries::tasks::ungraded_for_teacher(self.backend.as_ref(), user_id).await?;
        let unread_messages =
            queries::messages::unread_count(self.backend.as_ref(), user_id).await?;

        Ok(TeacherDashboard {
            profile,
            tasks,
            ungraded_submissions,
            unread_messages,
        })
    }

    pub async fn create_task(
        &self,
        titulo: &str,
        descripcion: &str,
        materia: &str,
        fecha_entrega: NaiveDate,
    ) -> Result<TaskRow, PageError> {
        let PanelIdentity { user_id, .. } =
            guard(self.backend.as_ref(), &self.profiles, Role::Docente).await?;
        let task = queries::tasks::create(
            self.backend.as_ref(),
            NewTask {
                titulo: titulo.to_string(),
                descripcion: descripcion.to_string(),
                materia: materia.to_string(),
                fecha_entrega,
                docente_id: user_id,
            },
        )
        .await?;
        info!(docente_id = %user_id, tarea_id = task.id, "task created");
        Ok(task)
    }

    pub async fn record_grade(
        &self,
        alumno_id: Uuid,
        materia: &str,
        nota: f32,
        fecha: NaiveDate,
    ) -> Result<GradeRow, PageError> {
        let PanelIdentity { user_id, .. } =
            guard(self.backend.as_ref(), &self.profiles, Role::Docente).await?;
        Ok(queries::grades::record(
            self.backend.as_ref(),
            NewGrade {
                alumno_id,
                materia: materia.to_string(),
                nota,
                fecha,
                docente_id: user_id,
            },
        )
        .await?)
    }

    pub async fn record_attendance(
        &self,
        alumno_id: Uuid,
        fecha: NaiveDate,
        estado: AttendanceState,
    ) -> Result<AttendanceRow, PageError> {
        guard(self.backend.as_ref(), &self.profiles, Role::Docente).await?;
        Ok(queries::attendance::record(
            self.backend.as_ref(),
            NewAttendance {
                alumno_id,
                fecha,
                estado,
            },
        )
        .await?)
    }

    /// Returns false when the entrega id matched nothing.
    pub async fn grade_submission(&self, entrega_id: i64, nota: f32) -> Result<bool, PageError> {
        let PanelIdentity { user_id, .. } =
            guard(self.backend.as_ref(), &self.profiles, Role::Docente).await?;
        let changed =
            queries::tasks::grade_submission(self.backend.as_ref(), entrega_id, nota).await?;
        if changed > 0 {
            info!(docente_id = %user_id, entrega_id, nota, "submission graded");
        }
        Ok(changed > 0)
    }

    /// Time-limited download link for a handed-in file, or `None` when the
    /// entrega does not exist.
    pub async fn submission_download_url(
        &self,
        entrega_id: i64,
    ) -> Result<Option<String>, PageError> {
        guard(self.backend.as_ref(), &self.profiles, Role::Docente).await?;
        let Some(submission) =
            queries::tasks::find_submission(self.backend.as_ref(), entrega_id).await?
        else {
            return Ok(None);
        };
        let url = self
            .backend
            .create_signed_url("entregas", &submission.archivo, DOWNLOAD_URL_TTL_SECS)
            .await?;
        Ok(Some(url))
    }
}
