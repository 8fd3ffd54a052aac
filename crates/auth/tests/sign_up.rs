use aulanet_auth::SignUpOutcome;
use aulanet_backend::Backend;
use aulanet_notify::Level;
use aulanet_shared::{RegistrationStatus, Role};

mod helpers;

#[tokio::test]
async fn student_registration_stores_the_normalized_profile() -> anyhow::Result<()> {
    let ctx = helpers::setup();
    let outcome = ctx
        .flow
        .sign_up(helpers::sign_up_input(Role::Alumno, "ana@example.com"))
        .await;

    assert_eq!(
        outcome,
        SignUpOutcome::Completed {
            status: RegistrationStatus::Active
        }
    );
    let notice = ctx.notices.last().unwrap();
    assert_eq!(notice.level, Level::Success);
    assert_eq!(notice.message, "Registration complete. You may now sign in.");

    let usuarios = ctx.backend.rows("usuarios");
    assert_eq!(usuarios.len(), 1);
    // The DNI loses its dots on the way in; the phone is stored as typed.
    assert_eq!(usuarios[0]["dni"], "30123456");
    assert_eq!(usuarios[0]["telefono"], "5491155512345");
    assert_eq!(usuarios[0]["rol_id"], 1);

    let alumnos = ctx.backend.rows("alumnos");
    assert_eq!(alumnos.len(), 1);
    assert_eq!(alumnos[0]["estado"], "activo");
    Ok(())
}

#[tokio::test]
async fn docente_registration_awaits_approval() -> anyhow::Result<()> {
    let ctx = helpers::setup();
    let outcome = ctx
        .flow
        .sign_up(helpers::sign_up_input(Role::Docente, "d@example.com"))
        .await;

    assert_eq!(
        outcome,
        SignUpOutcome::Completed {
            status: RegistrationStatus::PendingApproval
        }
    );
    assert_eq!(
        ctx.notices.last().unwrap().message,
        "Registration received. A docente account awaits administrator approval."
    );

    let docentes = ctx.backend.rows("docentes");
    assert_eq!(docentes.len(), 1);
    assert_eq!(docentes[0]["estado"], "pendiente");
    Ok(())
}

#[tokio::test]
async fn padre_registration_creates_no_role_record() -> anyhow::Result<()> {
    let ctx = helpers::setup();
    let outcome = ctx
        .flow
        .sign_up(helpers::sign_up_input(Role::Padre, "p@example.com"))
        .await;

    assert_eq!(
        outcome,
        SignUpOutcome::Completed {
            status: RegistrationStatus::Complete
        }
    );
    assert_eq!(ctx.backend.rows("usuarios").len(), 1);
    assert!(ctx.backend.rows("alumnos").is_empty());
    assert!(ctx.backend.rows("docentes").is_empty());
    Ok(())
}

#[tokio::test]
async fn failed_role_record_write_rolls_back_the_profile() -> anyhow::Result<()> {
    let ctx = helpers::setup();
    ctx.backend.fail_next_insert("alumnos");

    let sign_outs = ctx.backend.sign_out_count();
    let outcome = ctx
        .flow
        .sign_up(helpers::sign_up_input(Role::Alumno, "ana@example.com"))
        .await;

    assert_eq!(outcome, SignUpOutcome::Rejected);
    assert_eq!(
        ctx.notices.last().unwrap().message,
        "We could not complete your registration. Please try again later."
    );
    // The compensating delete removed the half-written profile, and the
    // fresh session was signed back out.
    assert!(ctx.backend.rows("usuarios").is_empty());
    assert!(ctx.backend.rows("alumnos").is_empty());
    assert_eq!(ctx.backend.sign_out_count(), sign_outs + 1);
    assert!(ctx.backend.get_session().await.is_none());
    Ok(())
}

#[tokio::test]
async fn duplicate_email_reports_the_provider_message() -> anyhow::Result<()> {
    let ctx = helpers::setup();
    helpers::register(&ctx, Role::Alumno, "ana@example.com").await;

    let outcome = ctx
        .flow
        .sign_up(helpers::sign_up_input(Role::Alumno, "ana@example.com"))
        .await;

    assert_eq!(outcome, SignUpOutcome::Rejected);
    assert_eq!(
        ctx.notices.last().unwrap().message,
        "Registration failed: User already registered"
    );
    assert_eq!(ctx.backend.rows("usuarios").len(), 1);
    Ok(())
}

#[tokio::test]
async fn confirmation_gated_deployment_still_writes_the_profile() -> anyhow::Result<()> {
    let ctx = helpers::setup();
    ctx.backend.set_require_confirmation(true);

    let outcome = ctx
        .flow
        .sign_up(helpers::sign_up_input(Role::Alumno, "ana@example.com"))
        .await;

    assert_eq!(outcome, SignUpOutcome::ConfirmationRequired);
    let notice = ctx.notices.last().unwrap();
    assert_eq!(notice.level, Level::Info);
    assert_eq!(
        notice.message,
        "Registration started: check your email to confirm your account."
    );
    assert_eq!(ctx.backend.rows("usuarios").len(), 1);
    assert!(ctx.backend.get_session().await.is_none());
    Ok(())
}

#[tokio::test]
async fn invalid_forms_never_reach_the_backend() -> anyhow::Result<()> {
    let ctx = helpers::setup();
    let reads = ctx.backend.table_reads();

    let mut input = helpers::sign_up_input(Role::Alumno, "ana@example.com");
    input.email = "not-an-email".to_owned();
    let outcome = ctx.flow.sign_up(input).await;

    assert_eq!(outcome, SignUpOutcome::Rejected);
    assert_eq!(ctx.notices.last().unwrap().message, "Invalid email format");
    assert!(ctx.backend.rows("usuarios").is_empty());
    assert_eq!(ctx.backend.table_reads(), reads);
    Ok(())
}

#[tokio::test]
async fn unprovisioned_role_is_reported_before_any_write() -> anyhow::Result<()> {
    let ctx = helpers::setup();
    ctx.backend.clear_table("roles");

    let outcome = ctx
        .flow
        .sign_up(helpers::sign_up_input(Role::Alumno, "ana@example.com"))
        .await;

    assert_eq!(outcome, SignUpOutcome::Rejected);
    assert!(
        ctx.notices
            .last()
            .unwrap()
            .message
            .contains("is not provisioned")
    );
    assert!(ctx.backend.rows("usuarios").is_empty());
    Ok(())
}
