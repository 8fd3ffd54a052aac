use aulanet_backend::{Backend, Filter};
use aulanet_shared::AccessorError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

/// A `certificados` row. The file itself lives in the `certificados`
/// bucket under `archivo`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRow {
    pub id: i64,
    pub usuario_id: Uuid,
    pub archivo: String,
    pub desde: NaiveDate,
    pub hasta: NaiveDate,
    pub subido_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct NewCertificate {
    pub usuario_id: Uuid,
    pub archivo: String,
    pub desde: NaiveDate,
    pub hasta: NaiveDate,
}

/// Certificates this user uploaded, newest first.
pub async fn for_user<B: Backend>(
    backend: &B,
    usuario_id: Uuid,
) -> Result<Vec<CertificateRow>, AccessorError> {
    let rows = backend
        .select("certificados", "*", &[Filter::eq("usuario_id", usuario_id)])
        .await?;
    let mut certificates: Vec<CertificateRow> = super::decode_rows("certificados", rows)?;
    certificates.sort_by(|a, b| b.subido_at.cmp(&a.subido_at));
    Ok(certificates)
}

pub async fn record<B: Backend>(
    backend: &B,
    certificate: NewCertificate,
) -> Result<CertificateRow, AccessorError> {
    let row = backend
        .insert(
            "certificados",
            json!({
                "usuario_id": certificate.usuario_id,
                "archivo": certificate.archivo,
                "desde": certificate.desde,
                "hasta": certificate.hasta,
                "subido_at": Utc::now(),
            }),
        )
        .await?;
    super::decode_row("certificados", row)
}

/// The most recently uploaded certificates across every user.
pub async fn recent<B: Backend>(
    backend: &B,
    limit: usize,
) -> Result<Vec<CertificateRow>, AccessorError> {
    let rows = backend.select("certificados", "*", &[]).await?;
    let mut certificates: Vec<CertificateRow> = super::decode_rows("certificados", rows)?;
    certificates.sort_by(|a, b| b.subido_at.cmp(&a.subido_at));
    certificates.truncate(limit);
    Ok(certificates)
}
