use aulanet_backend::{Backend, Filter};
use aulanet_shared::AccessorError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

/// A `mensajes` row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRow {
    pub id: i64,
    pub de_usuario: Uuid,
    pub para_usuario: Uuid,
    pub asunto: String,
    pub cuerpo: String,
    pub enviado_at: DateTime<Utc>,
    pub leido: bool,
}

#[derive(Clone, Debug)]
pub struct NewMessage {
    pub de_usuario: Uuid,
    pub para_usuario: Uuid,
    pub asunto: String,
    pub cuerpo: String,
}

/// Messages addressed to this user, newest first.
pub async fn inbox<B: Backend>(
    backend: &B,
    user_id: Uuid,
) -> Result<Vec<MessageRow>, AccessorError> {
    let rows = backend
        .select("mensajes", "*", &[Filter::eq("para_usuario", user_id)])
        .await?;
    let mut messages: Vec<MessageRow> = super::decode_rows("mensajes", rows)?;
    messages.sort_by(|a, b| b.enviado_at.cmp(&a.enviado_at));
    Ok(messages)
}

pub async fn unread_count<B: Backend>(backend: &B, user_id: Uuid) -> Result<usize, AccessorError> {
    let rows = backend
        .select(
            "mensajes",
            "id",
            &[Filter::eq("para_usuario", user_id), Filter::eq("leido", false)],
        )
        .await?;
    Ok(rows.len())
}

pub async fn send<B: Backend>(
    backend: &B,
    message: NewMessage,
) -> Result<MessageRow, AccessorError> {
    let row = backend
        .insert(
            "mensajes",
            json!({
                "de_usuario": message.de_usuario,
                "para_usuario": message.para_usuario,
                "asunto": message.asunto,
                "cuerpo": message.cuerpo,
                "enviado_at": Utc::now(),
                "leido": false,
            }),
        )
        .await?;
    super::decode_row("mensajes", row)
}

pub async fn mark_read<B: Backend>(backend: &B, message_id: i64) -> Result<u64, AccessorError> {
    backend
        .update(
            "mensajes",
            &[Filter::eq("id", message_id)],
            json!({ "leido": true }),
        )
        .await
}
