use super::{PageError, PanelIdentity, content_type_for, guard, sanitize_filename};
use crate::queries::{self, CertificateRow, MessageRow, NewCertificate, NewMessage};
use aulanet_auth::{ProfileStore, UserProfile};
use aulanet_backend::Backend;
use aulanet_shared::{Role, display_phone};
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Everything the padre landing page shows. `telefono_display` carries the
/// stored number without the mobile country prefix; storage keeps the
/// captured form.
#[derive(Debug, Serialize)]
pub struct ParentDashboard {
    pub profile: UserProfile,
    pub telefono_display: Option<String>,
    pub messages: Vec<MessageRow>,
    pub certificates: Vec<CertificateRow>,
}

pub struct ParentPanel<B> {
    backend: Arc<B>,
    profiles: ProfileStore<B>,
}

impl<B: Backend> ParentPanel<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            profiles: ProfileStore::new(backend.clone()),
            backend,
        }
    }

    pub async fn dashboard(&self) -> Result<ParentDashboard, PageError> {
        let PanelIdentity { user_id, profile } =
            guard(self.backend.as_ref(), &self.profiles, Role::Padre).await?;

        let telefono_display = profile
            .telefono
            .as_deref()
            .map(|stored| display_phone(stored).to_string());
        let messages = queries::messages::inbox(self.backend.as_ref(), user_id).await?;
        let certificates = queries::certificates::for_user(self.backend.as_ref(), user_id).await?;

        Ok(ParentDashboard {
            profile,
            telefono_display,
            messages,
            certificates,
        })
    }

    /// Uploads the file and records the certificado in one operation.
    pub async fn upload_certificate(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        desde: NaiveDate,
        hasta: NaiveDate,
    ) -> Result<CertificateRow, PageError> {
        let PanelIdentity { user_id, .. } =
            guard(self.backend.as_ref(), &self.profiles, Role::Padre).await?;

        let safe_name = sanitize_filename(filename);
        let path = format!("{user_id}/{safe_name}");
        let content_type = content_type_for(&safe_name);
        self.backend
            .upload("certificados", &path, bytes, &content_type)
            .await?;
        let certificate = queries::certificates::record(
            self.backend.as_ref(),
            NewCertificate {
                usuario_id: user_id,
                archivo: path.clone(),
                desde,
                hasta,
            },
        )
        .await?;
        info!(user_id = %user_id, path, "certificate uploaded");
        Ok(certificate)
    }

    pub async fn messages(&self) -> Result<Vec<MessageRow>, PageError> {
        let PanelIdentity { user_id, .. } =
            guard(self.backend.as_ref(), &self.profiles, Role::Padre).await?;
        Ok(queries::messages::inbox(self.backend.as_ref(), user_id).await?)
    }

    pub async fn send_message(
        &self,
        para_usuario: Uuid,
        asunto: &str,
        cuerpo: &str,
    ) -> Result<MessageRow, PageError> {
        let PanelIdentity { user_id, .. } =
            guard(self.backend.as_ref(), &self.profiles, Role::Padre).await?;
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
        guard(self.backend.as_ref(), &self.profiles, Role::Padre).await?;
        let changed = queries::messages::mark_read(self.backend.as_ref(), message_id).await?;
        Ok(changed > 0)
    }
}
