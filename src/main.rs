use anyhow::Result;
use aulanet::config::Config;
use aulanet::demo;
use aulanet::portal::Portal;
use aulanet_auth::{SignInInput, SignInOutcome, SignUpInput};
use aulanet_backend::{Backend, HostedBackend, MemoryBackend};
use aulanet_notify::{Notifier, TermNotifier};
use aulanet_shared::Role;
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;
use strum::VariantArray;

/// aulanet - school portal client
#[derive(Parser)]
#[command(name = "aulanet")]
#[command(about = "Role-aware client for the school portal backend", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration and probe the backend
    Check,
    /// Create an account and its profile
    Register(RegisterArgs),
    /// Sign in to a panel and print the redirect decision
    Login(LoginArgs),
    /// Sign in, load the panel dashboard and print it as JSON
    Panel(LoginArgs),
}

#[derive(Args)]
struct RegisterArgs {
    #[arg(long)]
    email: String,

    #[arg(long)]
    password: String,

    #[arg(long)]
    nombre: String,

    #[arg(long)]
    apellido: String,

    /// DNI, dots allowed
    #[arg(long)]
    dni: String,

    #[arg(long)]
    telefono: Option<String>,

    /// Role to register as
    #[arg(long, default_value = "alumno")]
    role: Role,

    /// Run against the seeded in-memory backend instead of a deployment
    #[arg(long)]
    demo: bool,
}

#[derive(Args)]
struct LoginArgs {
    #[arg(long)]
    email: String,

    #[arg(long)]
    password: String,

    /// Panel being entered
    #[arg(long, default_value = "alumno")]
    panel: Role,

    /// Run against the seeded in-memory backend instead of a deployment
    #[arg(long)]
    demo: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.clone())?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    // Initialize observability (tracing + logging)
    aulanet::observability::init_observability(
        &config.observability.log_level,
        &config.observability.log_format,
    )?;

    match cli.command {
        Commands::Check => check_command(config).await,
        Commands::Register(args) => register_command(config, args).await,
        Commands::Login(args) => login_command(config, args).await,
        Commands::Panel(args) => panel_command(config, args).await,
    }
}

/// Constructs the client and reads the `roles` table, the cheapest request
/// that exercises the URL, the key and the REST surface at once.
#[tracing::instrument(skip(config))]
async fn check_command(config: Config) -> Result<()> {
    let backend = HostedBackend::new(
        &config.backend.url,
        config.backend.anon_key.clone(),
        config.backend.timeout(),
    )?;
    let roles = backend.select("roles", "*", &[]).await?;
    println!(
        "Backend at {} is reachable; {} roles provisioned.",
        config.backend.url,
        roles.len()
    );
    for role in Role::VARIANTS {
        let provisioned = roles.iter().any(|row| {
            row.get("nombre")
                .and_then(Value::as_str)
                .and_then(|name| Role::from_str(name).ok())
                == Some(*role)
        });
        if !provisioned {
            println!("warning: role \"{role}\" has no row in roles; sign-ups for it will fail");
        }
    }
    Ok(())
}

#[tracing::instrument(skip(config, args), fields(email = %args.email, role = %args.role))]
async fn register_command(config: Config, args: RegisterArgs) -> Result<()> {
    let input = SignUpInput {
        nombre: args.nombre,
        apellido: args.apellido,
        dni: args.dni,
        email: args.email,
        password: args.password,
        telefono: args.telefono,
        role: args.role,
    };
    if args.demo {
        let portal = demo_portal(&config).await?;
        portal.flow.sign_up(input).await;
    } else {
        let portal = Portal::hosted(&config)?;
        portal.flow.sign_up(input).await;
    }
    Ok(())
}

#[tracing::instrument(skip(config, args), fields(email = %args.email, panel = %args.panel))]
async fn login_command(config: Config, args: LoginArgs) -> Result<()> {
    let input = SignInInput {
        email: args.email,
        password: args.password,
        intended_role: args.panel,
    };
    let outcome = if args.demo {
        let portal = demo_portal(&config).await?;
        portal.flow.sign_in(input).await
    } else {
        let portal = Portal::hosted(&config)?;
        portal.flow.sign_in(input).await
    };
    if let SignInOutcome::Redirect { role, target } = outcome {
        println!("{role} -> {target}");
    }
    Ok(())
}

#[tracing::instrument(skip(config, args), fields(email = %args.email, panel = %args.panel))]
async fn panel_command(config: Config, args: LoginArgs) -> Result<()> {
    let panel = args.panel;
    let input = SignInInput {
        email: args.email,
        password: args.password,
        intended_role: panel,
    };
    if args.demo {
        let portal = demo_portal(&config).await?;
        print_panel(&portal, input, panel).await
    } else {
        let portal = Portal::hosted(&config)?;
        print_panel(&portal, input, panel).await
    }
}

async fn print_panel<B: Backend, N: Notifier>(
    portal: &Portal<B, N>,
    input: SignInInput,
    panel: Role,
) -> Result<()> {
    let SignInOutcome::Redirect { .. } = portal.flow.sign_in(input).await else {
        anyhow::bail!("sign-in was refused; see the message above");
    };
    let rendered = match panel {
        Role::Alumno => serde_json::to_string_pretty(&portal.student.dashboard().await?)?,
        Role::Docente => serde_json::to_string_pretty(&portal.teacher.dashboard().await?)?,
        Role::Admin => serde_json::to_string_pretty(&portal.admin.dashboard().await?)?,
        Role::Padre => serde_json::to_string_pretty(&portal.parent.dashboard().await?)?,
    };
    println!("{rendered}");
    Ok(())
}

async fn demo_portal(config: &Config) -> Result<Portal<MemoryBackend, TermNotifier>> {
    let backend = Arc::new(MemoryBackend::new());
    let world = demo::seed(&backend).await?;
    tracing::info!(
        alumna = %world.alumna,
        docente = %world.docente,
        "demo world seeded; every account signs in with {:?}",
        demo::DEMO_PASSWORD
    );
    Ok(Portal::new(backend, TermNotifier, config.redirect_map()))
}
