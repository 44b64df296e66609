//! Entrada de un step aislado.
//!
//! `rentflow-step run <step> --clave valor ...` ejecuta un step con el
//! contexto del run tomado del entorno (`RENTFLOW_*`). `rentflow-step
//! promote <ref> <alias>` mueve un alias fuera de banda (`reference`, `prod`).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use rent_core::constants::ENV_PROJECT;
use rent_core::{ArtifactRef, ArtifactStore, RunContext, StepId, StepParams};
use rent_steps::run_step;
use rent_store::{init_dotenv, FsArtifactStore, StoreConfig};

#[derive(Parser, Debug)]
#[command(name = "rentflow-step", version, about = "Run a single rentflow step or promote an artifact alias")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one step with `--name value` parameters
    Run {
        step: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        params: Vec<String>,
    },
    /// Point `alias` at the version `reference` resolves to
    Promote {
        /// `[project/]name:version`
        reference: String,
        alias: String,
        /// Project used when the reference has none (defaults to RENTFLOW_PROJECT)
        #[arg(long)]
        project: Option<String>,
    },
}

fn main() -> Result<()> {
    init_dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let mut store = FsArtifactStore::from_config(&StoreConfig::from_env());

    match args.command {
        Command::Run { step, params } => {
            let step: StepId = step.parse()?;
            let params = StepParams::from_args(&params).context("parsing step parameters")?;
            let ctx = RunContext::from_env().context("reading run context from environment")?;
            let outcome = run_step(step, &params, &ctx, &mut store).with_context(|| format!("step `{step}`"))?;
            println!("{}", outcome.summary);
        }
        Command::Promote { reference, alias, project } => {
            let reference: ArtifactRef = reference.parse()?;
            let reference = match (&reference.project, project.or_else(|| std::env::var(ENV_PROJECT).ok())) {
                (None, Some(p)) => reference.in_project(p),
                _ => reference,
            };
            let handle = store.promote(&reference, &alias)?;
            info!("{} now points at {}", alias, handle.pinned());
        }
    }
    Ok(())
}
