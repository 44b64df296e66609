//! Ensamblado del run: executor según `main.executor`, contexto y códigos
//! de salida.

use std::env;
use std::path::{Path, PathBuf};

use rent_core::{ConfigError, ExecutorKind, PipelineConfig, PipelineError, ProcessExecutor, RunContext, StepExecutor};
use rent_steps::BuiltinExecutor;
use rent_store::config::ENV_STORE_DIR;
use rent_store::FsArtifactStore;

pub const ENV_STEP_BIN: &str = "RENTFLOW_STEP_BIN";
pub const STEP_BIN_NAME: &str = "rentflow-step";

/// Contexto del run: proyecto y grupo de la configuración, raíz en el
/// directorio del fichero de configuración.
pub fn run_context(config: &PipelineConfig, config_path: &Path) -> Result<RunContext, std::io::Error> {
    let root = match config_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok(RunContext::new(config.main.project_name.clone(),
                       config.main.experiment_name.clone(),
                       root.canonicalize()?))
}

/// Binario de steps: `RENTFLOW_STEP_BIN` o `rentflow-step` junto al
/// ejecutable actual.
pub fn step_binary() -> Result<PathBuf, std::io::Error> {
    if let Some(p) = env::var_os(ENV_STEP_BIN).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(p));
    }
    let exe = env::current_exe()?;
    let dir = exe.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok(dir.join(format!("{STEP_BIN_NAME}{}", env::consts::EXE_SUFFIX)))
}

/// `store_root` debe ser absoluta: los procesos hijo corren en el directorio
/// de trabajo del run.
pub fn build_executor(kind: ExecutorKind, store_root: &Path) -> Result<Box<dyn StepExecutor>, std::io::Error> {
    Ok(match kind {
        ExecutorKind::Builtin => Box::new(BuiltinExecutor::new(FsArtifactStore::new(store_root))),
        ExecutorKind::Process => Box::new(ProcessExecutor::new(step_binary()?).with_env(ENV_STORE_DIR,
                                                                                       store_root.display()
                                                                                                 .to_string())),
    })
}

/// 2 para errores de configuración, 1 para cualquier otro fallo.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    let config = err.chain().any(|e| {
                                e.downcast_ref::<ConfigError>().is_some()
                                || matches!(e.downcast_ref::<PipelineError>(), Some(PipelineError::Configuration(_)))
                            });
    if config {
        2
    } else {
        1
    }
}
