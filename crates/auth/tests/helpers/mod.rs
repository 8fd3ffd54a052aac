#![allow(dead_code)]

use aulanet_auth::{AuthFlow, RedirectMap, SignInInput, SignUpInput, SignUpOutcome};
use aulanet_backend::{Backend, Filter, MemoryBackend};
use aulanet_notify::BufferNotifier;
use aulanet_shared::Role;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

pub struct TestFlow {
    pub backend: Arc<MemoryBackend>,
    pub notices: BufferNotifier,
    pub flow: AuthFlow<MemoryBackend, BufferNotifier>,
}

/// Flow against a fresh in-memory backend with the stock redirect map.
pub fn setup() -> TestFlow {
    let backend = Arc::new(MemoryBackend::new());
    let notices = BufferNotifier::new();
    let flow = AuthFlow::new(backend.clone(), notices.clone(), RedirectMap::default());
    TestFlow {
        backend,
        notices,
        flow,
    }
}

pub fn sign_up_input(role: Role, email: &str) -> SignUpInput {
    SignUpInput {
        nombre: "Ana".to_owned(),
        apellido: "Pérez".to_owned(),
        dni: "30.123.456".to_owned(),
        email: email.to_owned(),
        password: "secreta1".to_owned(),
        telefono: Some("5491155512345".to_owned()),
        role,
    }
}

pub fn sign_in_input(role: Role, email: &str) -> SignInInput {
    SignInInput {
        email: email.to_owned(),
        password: "secreta1".to_owned(),
        intended_role: role,
    }
}

/// Registers an account through the real flow and returns its user id.
/// Notices produced along the way are discarded.
pub async fn register(ctx: &TestFlow, role: Role, email: &str) -> Uuid {
    let outcome = ctx.flow.sign_up(sign_up_input(role, email)).await;
    assert!(
        matches!(outcome, SignUpOutcome::Completed { .. }),
        "registration failed: {outcome:?}"
    );
    let user_id = ctx
        .backend
        .get_session()
        .await
        .expect("registration leaves a session")
        .user_id;
    ctx.notices.clear();
    user_id
}

pub async fn set_teacher_status(ctx: &TestFlow, user_id: Uuid, estado: &str) {
    let changed = ctx
        .backend
        .update(
            "docentes",
            &[Filter::eq("usuario_id", user_id)],
            json!({ "estado": estado }),
        )
        .await
        .expect("docentes update");
    assert_eq!(changed, 1, "expected one docentes row for {user_id}");
}
