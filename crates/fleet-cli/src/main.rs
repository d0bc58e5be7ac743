//! `fleet`: CLI de operador sobre el workflow de habilitación.
//!
//! Requiere `DATABASE_URL` (backend Postgres). Imprime JSON en stdout y usa
//! códigos de salida según la clase de error:
//! - 2: uso incorrecto (clap)
//! - 3: error accionable (permisos o datos)
//! - 4: vista desactualizada (workflow o etapa inexistente)
//! - 5: fallo de almacenamiento, reintentar

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use fleet_core::{classify_error, EngineConfig, ErrorClass, TransitionRequest, WorkflowEngine, WorkflowError};
use fleet_domain::{Actor, RoleSet, StepKind};
use fleet_persistence::{PgWorkflowStore, PoolProvider};
use serde::Serialize;
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "fleet")]
#[command(about = "Vehicle readiness validation workflow")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the vehicle's workflow (created on first access)
    Workflow {
        #[arg(long)]
        vehicle: String,
    },
    /// Change the status of one step
    Transition {
        #[arg(long)]
        workflow: Uuid,
        /// maintenance | administrative | hseq | operations
        #[arg(long)]
        step: String,
        /// en_attente | valide | rejete
        #[arg(long)]
        status: String,
        #[arg(long)]
        actor: String,
        /// Comma separated role names from the user directory
        #[arg(long, value_delimiter = ',')]
        roles: Vec<String>,
        /// Required when rejecting
        #[arg(long)]
        comment: Option<String>,
    },
    /// Audit history, optionally filtered by step
    History {
        #[arg(long)]
        workflow: Uuid,
        #[arg(long)]
        step: Option<String>,
    },
    /// Count of workflows per aggregate status
    Stats,
    /// Whether the vehicle may be dispatched
    Eligibility {
        #[arg(long)]
        vehicle: String,
    },
    /// Per-step views for an actor (read-only where not authorized)
    Views {
        #[arg(long)]
        workflow: Uuid,
        #[arg(long)]
        actor: String,
        #[arg(long, value_delimiter = ',')]
        roles: Vec<String>,
    },
}

/// Fallo de la CLI con su código de salida.
struct Failure {
    code: u8,
    message: String,
}

impl From<WorkflowError> for Failure {
    fn from(err: WorkflowError) -> Self {
        let code = match classify_error(&err) {
            ErrorClass::Actionable => 3,
            ErrorClass::StaleView => 4,
            ErrorClass::RetryLater => 5,
        };
        Self { code,
               message: err.to_string() }
    }
}

impl From<fleet_persistence::PersistenceError> for Failure {
    fn from(err: fleet_persistence::PersistenceError) -> Self {
        Self { code: 5,
               message: err.to_string() }
    }
}

fn init_tracing() {
    tracing_subscriber::registry().with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
                                  .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                                  .init();
}

fn actor(name: String, roles: &[String]) -> Actor {
    Actor { name,
            roles: RoleSet::from_names(roles.iter().map(String::as_str)) }
}

fn emit<T: Serialize>(value: &T) -> Result<(), Failure> {
    let json = serde_json::to_string_pretty(value).map_err(|e| Failure { code: 5,
                                                                         message: format!("serialize output: {e}") })?;
    println!("{json}");
    Ok(())
}

fn run(cli: Cli) -> Result<(), Failure> {
    let store = fleet_persistence::store_from_env()?;
    let engine: WorkflowEngine<PgWorkflowStore<PoolProvider>> =
        WorkflowEngine::builder(store).config(EngineConfig::from_env()).build();
    debug!("engine ready config={:?}", engine.config());

    match cli.command {
        Commands::Workflow { vehicle } => emit(&engine.get_workflow(&vehicle)?),
        Commands::Transition { workflow,
                               step,
                               status,
                               actor: name,
                               roles,
                               comment, } => {
            let request = TransitionRequest::parse(workflow, &step, actor(name, &roles), &status, comment)?;
            let outcome = engine.transition(request)?;
            #[derive(Serialize)]
            struct Output<'a> {
                #[serde(flatten)]
                outcome: &'a fleet_core::TransitionOutcome,
                invalidations: Vec<fleet_core::ReadView>,
            }
            emit(&Output { invalidations: outcome.invalidations(),
                           outcome: &outcome })
        }
        Commands::History { workflow, step } => {
            let entries = match step {
                Some(raw) => {
                    let kind: StepKind = raw.parse().map_err(WorkflowError::from)?;
                    engine.step_history(workflow, kind)?
                }
                None => engine.history(workflow)?,
            };
            emit(&entries)
        }
        Commands::Stats => emit(&engine.global_stats()?),
        Commands::Eligibility { vehicle } => emit(&engine.eligibility(&vehicle)?),
        Commands::Views { workflow,
                          actor: name,
                          roles, } => emit(&engine.step_views(workflow, &actor(name, &roles))?),
    }
}

fn main() -> ExitCode {
    // Cargar .env si existe para obtener DATABASE_URL
    let _ = dotenvy::dotenv();
    init_tracing();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(Failure { code, message }) => {
            error!("{message}");
            eprintln!("error: {message}");
            ExitCode::from(code)
        }
    }
}
