use aulanet_auth::{AuthFlow, RedirectMap, RejectReason, SignInOutcome};
use aulanet_backend::{AuthResponse, Backend, Filter, MemoryBackend, Session};
use aulanet_notify::{BufferNotifier, Level};
use aulanet_shared::{AccessorError, AuthError, Role, StorageError};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

mod helpers;

#[tokio::test]
async fn student_sign_in_routes_to_the_student_panel() -> anyhow::Result<()> {
    let ctx = helpers::setup();
    helpers::register(&ctx, Role::Alumno, "ana@example.com").await;

    let sign_outs = ctx.backend.sign_out_count();
    let outcome = ctx
        .flow
        .sign_in(helpers::sign_in_input(Role::Alumno, "ana@example.com"))
        .await;

    assert_eq!(
        outcome,
        SignInOutcome::Redirect {
            role: Role::Alumno,
            target: "/paneles/alumno.html".to_owned(),
        }
    );
    // A successful login never signs out and says nothing; it just routes.
    assert_eq!(ctx.backend.sign_out_count(), sign_outs);
    assert!(ctx.notices.notices().is_empty());
    assert!(ctx.backend.get_session().await.is_some());
    Ok(())
}

#[tokio::test]
async fn every_wrong_panel_pair_is_refused_and_signed_out() -> anyhow::Result<()> {
    let ctx = helpers::setup();
    let roles = [Role::Alumno, Role::Docente, Role::Admin, Role::Padre];
    for role in roles {
        helpers::register(&ctx, role, &format!("{role}@example.com")).await;
    }

    for intended in roles {
        for actual in roles {
            if intended == actual {
                continue;
            }
            let sign_outs = ctx.backend.sign_out_count();
            let outcome = ctx
                .flow
                .sign_in(helpers::sign_in_input(
                    intended,
                    &format!("{actual}@example.com"),
                ))
                .await;

            assert_eq!(
                outcome,
                SignInOutcome::Rejected(RejectReason::WrongPanel { actual }),
                "{actual} credentials against the {intended} panel"
            );
            assert_eq!(
                ctx.backend.sign_out_count(),
                sign_outs + 1,
                "{actual} into the {intended} panel must end signed out"
            );
            let notice = ctx.notices.last().expect("one notice per refusal");
            assert_eq!(notice.level, Level::Error);
            assert_eq!(
                notice.message,
                format!(
                    "You are a {}. You cannot enter this panel.",
                    actual.display_name()
                )
            );
        }
    }
    Ok(())
}

#[tokio::test]
async fn pending_docente_is_turned_away_until_approved() -> anyhow::Result<()> {
    let ctx = helpers::setup();
    let user_id = helpers::register(&ctx, Role::Docente, "d@example.com").await;

    let sign_outs = ctx.backend.sign_out_count();
    let outcome = ctx
        .flow
        .sign_in(helpers::sign_in_input(Role::Docente, "d@example.com"))
        .await;
    assert_eq!(
        outcome,
        SignInOutcome::Rejected(RejectReason::TeacherPending)
    );
    assert_eq!(ctx.backend.sign_out_count(), sign_outs + 1);
    assert_eq!(
        ctx.notices.last().unwrap().message,
        "Your account is pending administrator approval."
    );

    helpers::set_teacher_status(&ctx, user_id, "aprobado").await;
    let sign_outs = ctx.backend.sign_out_count();
    let outcome = ctx
        .flow
        .sign_in(helpers::sign_in_input(Role::Docente, "d@example.com"))
        .await;
    assert_eq!(
        outcome,
        SignInOutcome::Redirect {
            role: Role::Docente,
            target: "/paneles/docente.html".to_owned(),
        }
    );
    assert_eq!(ctx.backend.sign_out_count(), sign_outs);
    Ok(())
}

#[tokio::test]
async fn rejected_docente_gets_the_rejection_notice() -> anyhow::Result<()> {
    let ctx = helpers::setup();
    let user_id = helpers::register(&ctx, Role::Docente, "d@example.com").await;
    helpers::set_teacher_status(&ctx, user_id, "rechazado").await;

    let outcome = ctx
        .flow
        .sign_in(helpers::sign_in_input(Role::Docente, "d@example.com"))
        .await;
    assert_eq!(
        outcome,
        SignInOutcome::Rejected(RejectReason::TeacherRejected)
    );
    assert_eq!(
        ctx.notices.last().unwrap().message,
        "Your application was rejected. Please contact the administration."
    );
    Ok(())
}

#[tokio::test]
async fn wrong_password_is_generic_and_touches_no_tables() -> anyhow::Result<()> {
    let ctx = helpers::setup();
    helpers::register(&ctx, Role::Alumno, "ana@example.com").await;

    let reads = ctx.backend.table_reads();
    let sign_outs = ctx.backend.sign_out_count();
    let mut input = helpers::sign_in_input(Role::Alumno, "ana@example.com");
    input.password = "wrong-secret".to_owned();
    let outcome = ctx.flow.sign_in(input).await;

    assert_eq!(
        outcome,
        SignInOutcome::Rejected(RejectReason::BadCredentials)
    );
    assert_eq!(
        ctx.notices.last().unwrap().message,
        "Incorrect email or password."
    );
    // No profile lookups and no sign-out happen for a refused password.
    assert_eq!(ctx.backend.table_reads(), reads);
    assert_eq!(ctx.backend.sign_out_count(), sign_outs);
    Ok(())
}

#[tokio::test]
async fn unconfirmed_account_is_told_to_confirm() -> anyhow::Result<()> {
    let ctx = helpers::setup();
    ctx.backend.set_require_confirmation(true);
    let outcome = ctx
        .flow
        .sign_up(helpers::sign_up_input(Role::Alumno, "ana@example.com"))
        .await;
    assert_eq!(outcome, aulanet_auth::SignUpOutcome::ConfirmationRequired);
    ctx.notices.clear();

    let reads = ctx.backend.table_reads();
    let outcome = ctx
        .flow
        .sign_in(helpers::sign_in_input(Role::Alumno, "ana@example.com"))
        .await;

    assert_eq!(outcome, SignInOutcome::EmailUnconfirmed);
    let notice = ctx.notices.last().unwrap();
    assert_eq!(notice.level, Level::Info);
    assert_eq!(
        notice.message,
        "Login incomplete: please confirm your email address and try again."
    );
    assert_eq!(ctx.backend.table_reads(), reads);
    Ok(())
}

#[tokio::test]
async fn account_without_profile_is_signed_back_out() -> anyhow::Result<()> {
    let ctx = helpers::setup();
    ctx.backend.sign_up("ghost@example.com", "secreta1").await?;
    ctx.backend.sign_out().await?;

    let sign_outs = ctx.backend.sign_out_count();
    let outcome = ctx
        .flow
        .sign_in(helpers::sign_in_input(Role::Alumno, "ghost@example.com"))
        .await;

    assert_eq!(
        outcome,
        SignInOutcome::Rejected(RejectReason::ProfileMissing)
    );
    assert_eq!(ctx.backend.sign_out_count(), sign_outs + 1);
    assert_eq!(
        ctx.notices.last().unwrap().message,
        "Your profile could not be loaded. Please contact the administrator."
    );
    assert!(ctx.backend.get_session().await.is_none());
    Ok(())
}

#[tokio::test]
async fn unrecognized_role_name_is_refused_by_name() -> anyhow::Result<()> {
    let ctx = helpers::setup();
    let user_id = helpers::register(&ctx, Role::Alumno, "ana@example.com").await;
    ctx.backend
        .insert_row("roles", json!({ "id": 99, "nombre": "director" }));
    ctx.backend
        .update(
            "usuarios",
            &[Filter::eq("id", user_id)],
            json!({ "rol_id": 99 }),
        )
        .await?;

    let sign_outs = ctx.backend.sign_out_count();
    let outcome = ctx
        .flow
        .sign_in(helpers::sign_in_input(Role::Alumno, "ana@example.com"))
        .await;

    assert_eq!(
        outcome,
        SignInOutcome::Rejected(RejectReason::UnknownRole("director".to_owned()))
    );
    assert_eq!(ctx.backend.sign_out_count(), sign_outs + 1);
    assert!(ctx.notices.last().unwrap().message.contains("director"));
    Ok(())
}

#[tokio::test]
async fn dangling_role_id_cannot_be_determined() -> anyhow::Result<()> {
    let ctx = helpers::setup();
    let user_id = helpers::register(&ctx, Role::Alumno, "ana@example.com").await;
    ctx.backend
        .update(
            "usuarios",
            &[Filter::eq("id", user_id)],
            json!({ "rol_id": 77 }),
        )
        .await?;

    let outcome = ctx
        .flow
        .sign_in(helpers::sign_in_input(Role::Alumno, "ana@example.com"))
        .await;

    assert_eq!(
        outcome,
        SignInOutcome::Rejected(RejectReason::RoleUndetermined)
    );
    assert_eq!(
        ctx.notices.last().unwrap().message,
        "Your role could not be determined. Please contact the administrator."
    );
    Ok(())
}

#[tokio::test]
async fn timeouts_get_their_own_notice() -> anyhow::Result<()> {
    let backend = Arc::new(ScriptedBackend::new());
    backend.fail_sign_in_with(AuthError::Timeout);
    let notices = BufferNotifier::new();
    let flow = AuthFlow::new(backend, notices.clone(), RedirectMap::default());

    let outcome = flow
        .sign_in(helpers::sign_in_input(Role::Alumno, "ana@example.com"))
        .await;

    assert_eq!(outcome, SignInOutcome::Rejected(RejectReason::Backend));
    assert_eq!(
        notices.last().unwrap().message,
        "The request timed out. Please try again."
    );
    Ok(())
}

#[tokio::test]
async fn a_second_submission_while_one_runs_is_refused() -> anyhow::Result<()> {
    let backend = Arc::new(ScriptedBackend::new());
    backend.sign_up("ana@example.com", "secreta1").await?;
    backend.sign_out().await?;
    backend.hold_sign_in();

    let notices = BufferNotifier::new();
    let flow = Arc::new(AuthFlow::new(
        backend.clone(),
        notices.clone(),
        RedirectMap::default(),
    ));

    let first = tokio::spawn({
        let flow = flow.clone();
        async move {
            flow.sign_in(helpers::sign_in_input(Role::Alumno, "ana@example.com"))
                .await
        }
    });
    // Let the spawned attempt claim the submission slot and park.
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }

    let second = flow
        .sign_in(helpers::sign_in_input(Role::Alumno, "ana@example.com"))
        .await;
    assert_eq!(second, SignInOutcome::Busy);
    let notice = notices.last().unwrap();
    assert_eq!(notice.level, Level::Info);
    assert_eq!(
        notice.message,
        "Another request is already in progress. Please wait."
    );

    backend.release_sign_in();
    let outcome = first.await?;
    // The held attempt finishes normally once released; the account has no
    // profile, which is fine for what this test observes.
    assert_eq!(
        outcome,
        SignInOutcome::Rejected(RejectReason::ProfileMissing)
    );
    Ok(())
}

/// Wrapper around [`MemoryBackend`] that can park or fail the next sign-in,
/// for exercising the in-flight guard and the timeout notice.
struct ScriptedBackend {
    inner: MemoryBackend,
    gate: tokio::sync::Notify,
    holding: AtomicBool,
    next_error: Mutex<Option<AuthError>>,
}

impl ScriptedBackend {
    fn new() -> Self {
        Self {
            inner: MemoryBackend::new(),
            gate: tokio::sync::Notify::new(),
            holding: AtomicBool::new(false),
            next_error: Mutex::new(None),
        }
    }

    fn hold_sign_in(&self) {
        self.holding.store(true, Ordering::SeqCst);
    }

    fn release_sign_in(&self) {
        self.holding.store(false, Ordering::SeqCst);
        self.gate.notify_one();
    }

    fn fail_sign_in_with(&self, err: AuthError) {
        *self.next_error.lock().unwrap() = Some(err);
    }
}

#[async_trait::async_trait]
impl Backend for ScriptedBackend {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, AuthError> {
        if let Some(err) = self.next_error.lock().unwrap().take() {
            return Err(err);
        }
        if self.holding.load(Ordering::SeqCst) {
            self.gate.notified().await;
        }
        self.inner.sign_in_with_password(email, password).await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        self.inner.sign_up(email, password).await
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.inner.sign_out().await
    }

    async fn get_session(&self) -> Option<Session> {
        self.inner.get_session().await
    }

    async fn select(
        &self,
        table: &str,
        columns: &str,
        filters: &[Filter],
    ) -> Result<Vec<Value>, AccessorError> {
        self.inner.select(table, columns, filters).await
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, AccessorError> {
        self.inner.insert(table, row).await
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
    ) -> Result<u64, AccessorError> {
        self.inner.update(table, filters, patch).await
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<u64, AccessorError> {
        self.inner.delete(table, filters).await
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.inner.upload(bucket, path, bytes, content_type).await
    }

    async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in_secs: u64,
    ) -> Result<String, StorageError> {
        self.inner
            .create_signed_url(bucket, path, expires_in_secs)
            .await
    }
}
