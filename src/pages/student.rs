use super::{PageError, PanelIdentity, content_type_for, guard, sanitize_filename};
use crate::queries::{
    self, AttendanceRow, AttendanceSummary, GradeRow, MessageRow, NewMessage, SubjectAverage,
    SubmissionRow, TaskRow,
};
use aulanet_auth::{ProfileStore, UserProfile};
use aulanet_backend::Backend;
use aulanet_shared::Role;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Everything the student landing page shows.
#[derive(Debug, Serialize)]
pub struct StudentDashboard {
    pub profile: UserProfile,
    pub grades: Vec<GradeRow>,
    pub averages: Vec<SubjectAverage>,
    pub attendance: Vec<AttendanceRow>,
    pub attendance_summary: AttendanceSummary,
    pub open_tasks: Vec<TaskRow>,
    pub unread_messages: usize,
}

pub struct StudentPanel<B> {
    backend: Arc<B>,
    profiles: ProfileStore<B>,
}

impl<B: Backend> StudentPanel<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            profiles: ProfileStore::new(backend.clone()),
            backend,
        }
    }

    pub async fn dashboard(&self) -> Result<StudentDashboard, PageError> {
        let PanelIdentity { user_id, profile } =
            guard(self.backend.as_ref(), &self.profiles, Role::Alumno).await?;

        let grades = queries::grades::for_student(self.backend.as_ref(), user_id).await?;
        let averages = queries::grades::subject_averages(&grades);
        let attendance = queries::attendance::for_student(self.backend.as_ref(), user_id).await?;
        let attendance_summary = queries::attendance::summarize(&attendance);
        let open_tasks = queries::tasks::open_for_student(
            self.backend.as_ref(),
            user_id,
            Utc::now().date_naive(),
        )
        .await?;
        let unread_messages =
            queries::messages::unread_count(self.backend.as_ref(), user_id).await?;

        Ok(StudentDashboard {
            profile,
            grades,
            averages,
            attendance,
            attendance_summary,
            open_tasks,
            unread_messages,
        })
    }

    /// Uploads the file and records the entrega in one operation.
    pub async fn submit_task(
        &self,
        tarea_id: i64,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<SubmissionRow, PageError> {
        let PanelIdentity { user_id, .. } =
            guard(self.backend.as_ref(), &self.profiles, Role::Alumno).await?;

        let safe_name = sanitize_filename(filename);
        let path = format!("{tarea_id}/{user_id}/{safe_name}");
        let content_type = content_type_for(&safe_name);
        self.backend
            .upload("entregas", &path, bytes, &content_type)
            .await?;
        let submission =
            queries::tasks::submit(self.backend.as_ref(), tarea_id, user_id, &path).await?;
        info!(user_id = %user_id, tarea_id, path, "task submitted");
        Ok(submission)
    }

    pub async fn messages(&self) -> Result<Vec<MessageRow>, PageError> {
        let PanelIdentity { user_id, .. } =
            guard(self.backend.as_ref(), &self.profiles, Role::Alumno).await?;
        Ok(queries::messages::inbox(self.backend.as_ref(), user_id).await?)
    }

    pub async fn send_message(
        &self,
        para_usuario: Uuid,
        asunto: &str,
        cuerpo: &str,
    ) -> Result<MessageRow, PageError> {
        let PanelIdentity { user_id, .. } =
            guard(self.backend.as_ref(), &self.profiles, Role::Alumno).await?;
        Ok(queries::messages::send(
            self.backend.as_ref(),
            NewMessage {
                de_usuario: user_id,
                para_usuario,
                asunto: asunto.to_string(),
                cuerpo: cuerpo.to_string(),
            },
        )
        .await?)
    }

    /// Returns false when the message id matched nothing.
    pub async fn mark_message_read(&self, message_id: i64) -> Result<bool, PageError> {
        guard(self.backend.as_ref(), &self.profiles, Role::Alumno).await?;
        let changed = queries::messages::mark_read(self.backend.as_ref(), message_id).await?;
        Ok(changed > 0)
    }
}
