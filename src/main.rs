//! `rentflow [--config PATH] [clave.con.puntos=valor ...]`
//!
//! Carga la configuración, ejecuta los steps activos en orden y termina con
//! 0 si todo fue bien, 2 ante un error de configuración y 1 si falló un step.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use rent_core::PipelineDriver;
use rent_store::{init_dotenv, StoreConfig};
use rentflow::config::{self, ENV_CONFIG};
use rentflow::{build_executor, exit_code, run_context};

#[derive(Parser, Debug)]
#[command(name = "rentflow", version, about = "Short-term rental price pipeline")]
struct Args {
    /// Pipeline configuration file
    #[arg(long, env = ENV_CONFIG)]
    config: Option<PathBuf>,

    /// Overrides such as `main.steps=download,basic_cleaning` or `etl.min_price=20`
    overrides: Vec<String>,
}

fn main() -> ExitCode {
    init_dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}

fn run(args: Args) -> Result<()> {
    let path = config::config_path(args.config);
    let cfg = config::load(&path, &args.overrides).with_context(|| format!("loading {}", path.display()))?;
    let ctx = run_context(&cfg, &path).context("resolving project root")?;

    let store_root = StoreConfig::from_env().root;
    let store_root = if store_root.is_absolute() { store_root } else { env::current_dir()?.join(store_root) };
    info!("artifact store at {}", store_root.display());

    let executor = build_executor(cfg.main.executor, &store_root).context("preparing step executor")?;
    let mut driver = PipelineDriver::new(executor);
    let report = driver.run(&cfg, &ctx)?;
    for step in &report.steps {
        info!("{}: {}", step.step, step.outcome.summary);
    }
    info!("run {} finished, fingerprint {}", report.run_id, report.run_fingerprint);
    Ok(())
}
