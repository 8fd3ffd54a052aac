//! Seeded demo world
//!
//! `--demo` runs swap the hosted deployment for a [`MemoryBackend`]
//! populated here: one account per role, a docente application still
//! pending, and enough rows in every table for the dashboards to show
//! something real.

use anyhow::Context;
use aulanet_auth::{NewProfile, ProfileStore};
use aulanet_backend::{Backend, Filter, MemoryBackend};
use aulanet_shared::{Role, TeacherStatus};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Every seeded account signs in with this.
pub const DEMO_PASSWORD: &str = "aulanet-demo";

pub const DEMO_ALUMNA: &str = "ana@demo.escuela";
pub const DEMO_DOCENTE: &str = "diego@demo.escuela";
pub const DEMO_ASPIRANTE: &str = "dora@demo.escuela";
pub const DEMO_ADMIN: &str = "marta@demo.escuela";
pub const DEMO_PADRE: &str = "pedro@demo.escuela";

/// Ids of the seeded accounts.
pub struct DemoWorld {
    pub alumna: Uuid,
    pub docente: Uuid,
    /// Docente application still pendiente.
    pub aspirante: Uuid,
    pub admin: Uuid,
    pub padre: Uuid,
}

pub async fn seed(backend: &Arc<MemoryBackend>) -> anyhow::Result<DemoWorld> {
    let profiles = ProfileStore::new(backend.clone());

    let alumna = seed_user(
        backend, &profiles, "Ana", "Alvarez", "30.111.222", DEMO_ALUMNA, None,
        Role::Alumno,
    )
    .await?;
    let docente = seed_user(
        backend, &profiles, "Diego", "Diaz", "27.333.444", DEMO_DOCENTE, None,
        Role::Docente,
    )
    .await?;
    let aspirante = seed_user(
        backend, &profiles, "Dora", "Duarte", "28.555.666", DEMO_ASPIRANTE, None,
        Role::Docente,
    )
    .await?;
    let admin = seed_user(
        backend, &profiles, "Marta", "Molina", "20.777.888", DEMO_ADMIN, None,
        Role::Admin,
    )
    .await?;
    let padre = seed_user(
        backend,
        &profiles,
        "Pedro",
        "Perez",
        "22.999.000",
        DEMO_PADRE,
        Some("5491160001111"),
        Role::Padre,
    )
    .await?;

    // Diego is already through the approval queue; Dora is not.
    backend
        .update(
            "docentes",
            &[Filter::eq("usuario_id", docente)],
            json!({ "estado": TeacherStatus::Aprobado }),
        )
        .await?;

    for (materia, nota, fecha) in [
        ("Lengua", 8.0, "2026-04-06"),
        ("Historia", 6.0, "2026-04-13"),
        ("Lengua", 9.0, "2026-04-20"),
    ] {
        backend.insert_row(
            "notas",
            json!({
                "id": backend.rows("notas").len() + 1,
                "alumno_id": alumna,
                "materia": materia,
                "nota": nota,
                "fecha": fecha,
                "docente_id": docente,
            }),
        );
    }

    for (id, fecha, estado) in [
        (1, "2026-04-06", "presente"),
        (2, "2026-04-07", "presente"),
        (3, "2026-04-08", "tarde"),
        (4, "2026-04-09", "ausente"),
    ] {
        backend.insert_row(
            "asistencias",
            json!({ "id": id, "alumno_id": alumna, "fecha": fecha, "estado": estado }),
        );
    }

    backend.insert_row(
        "tareas",
        json!({
            "id": 1,
            "titulo": "TP 1: Analisis sintactico",
            "descripcion": "Resolver la guia y subir el archivo",
            "materia": "Lengua",
            "fecha_entrega": "2030-12-01",
            "docente_id": docente,
        }),
    );
    backend.insert_row(
        "tareas",
        json!({
            "id": 2,
            "titulo": "Ensayo sobre la revolucion",
            "descripcion": "Dos carillas como maximo",
            "materia": "Historia",
            "fecha_entrega": "2026-03-01",
            "docente_id": docente,
        }),
    );

    // Ana already handed in the essay; nobody graded it yet.
    let essay_path = format!("2/{alumna}/ensayo.pdf");
    backend
        .upload("entregas", &essay_path, b"%PDF-demo".to_vec(), "application/pdf")
        .await?;
    backend.insert_row(
        "entregas",
        json!({
            "id": 1,
            "tarea_id": 2,
            "alumno_id": alumna,
            "archivo": essay_path,
            "entregado_at": "2026-02-27T14:30:00Z",
            "nota": null,
        }),
    );

    for (id, de, para, asunto, cuerpo, enviado, leido) in [
        (
            1,
            docente,
            alumna,
            "Reunion de padres",
            "La reunion es el viernes a las 18.",
            "2026-04-20T09:00:00Z",
            false,
        ),
        (
            2,
            docente,
            padre,
            "Boletin disponible",
            "Ya puede consultar las notas de Ana.",
            "2026-04-21T10:00:00Z",
            false,
        ),
        (
            3,
            padre,
            docente,
            "Consulta",
            "Ana falto por turno medico.",
            "2026-04-09T08:00:00Z",
            true,
        ),
    ] {
        backend.insert_row(
            "mensajes",
            json!({
                "id": id,
                "de_usuario": de,
                "para_usuario": para,
                "asunto": asunto,
                "cuerpo": cuerpo,
                "enviado_at": enviado,
                "leido": leido,
            }),
        );
    }

    let certificate_path = format!("{padre}/constancia-medica.pdf");
    backend
        .upload(
            "certificados",
            &certificate_path,
            b"%PDF-demo".to_vec(),
            "application/pdf",
        )
        .await?;
    backend.insert_row(
        "certificados",
        json!({
            "id": 1,
            "usuario_id": padre,
            "archivo": certificate_path,
            "desde": "2026-04-09",
            "hasta": "2026-04-10",
            "subido_at": "2026-04-09T08:15:00Z",
        }),
    );

    // Account creation leaves the last session open; the demo starts
    // signed out.
    backend.sign_out().await?;

    Ok(DemoWorld {
        alumna,
        docente,
        aspirante,
        admin,
        padre,
    })
}

#[allow(clippy::too_many_arguments)]
async fn seed_user(
    backend: &Arc<MemoryBackend>,
    profiles: &ProfileStore<MemoryBackend>,
    nombre: &str,
    apellido: &str,
    dni: &str,
    email: &str,
    telefono: Option<&str>,
    role: Role,
) -> anyhow::Result<Uuid> {
    let response = backend.sign_up(email, DEMO_PASSWORD).await?;
    let user = response
        .user
        .with_context(|| format!("demo sign-up for {email} returned no user"))?;
    profiles
        .create_full_profile(NewProfile {
            user_id: user.id,
            nombre: nombre.to_string(),
            apellido: apellido.to_string(),
            dni: dni.to_string(),
            email: email.to_string(),
            telefono: telefono.map(str::to_string),
            role,
        })
        .await?;
    Ok(user.id)
}
