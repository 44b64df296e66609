//! Executor que lanza cada step como proceso hijo.
//!
//! Línea de comandos: `<program> run <step> --clave valor ...`. El
//! `RunContext` viaja en el entorno del hijo (nunca en el del driver) y el
//! directorio de trabajo del hijo es el del run. La última línea no vacía
//! del stdout del hijo es su resumen JSON.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use log::{debug, info, warn};
use serde_json::Value;
use thiserror::Error;

use super::{StepExecutor, StepOutcome};
use crate::errors::BoxError;
use crate::model::RunContext;
use crate::step::{StepId, StepParams};

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("could not start `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("step process exited with {status}: {stderr_tail}")]
    Exit { status: String, stderr_tail: String },
}

#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    program: PathBuf,
    envs: Vec<(String, String)>,
}

impl ProcessExecutor {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into(),
               envs: Vec::new() }
    }

    /// Variable extra para todos los hijos (p. ej. la raíz del store).
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn command(&self, step: StepId, params: &StepParams, ctx: &RunContext) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("run")
           .arg(step.name())
           .args(params.to_args())
           .envs(ctx.to_env())
           .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
           .current_dir(&ctx.work_dir)
           .stdin(Stdio::null())
           .stdout(Stdio::piped())
           .stderr(Stdio::piped());
        cmd
    }
}

impl StepExecutor for ProcessExecutor {
    fn execute(&mut self, step: StepId, params: &StepParams, ctx: &RunContext) -> Result<StepOutcome, BoxError> {
        let mut cmd = self.command(step, params, ctx);
        debug!("spawn {:?}", cmd);
        let output = cmd.output().map_err(|source| ProcessError::Spawn { program: self.program.display().to_string(),
                                                                          source })?;
        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines() {
            info!("[{step}] {line}");
        }
        if !output.status.success() {
            let tail = stderr.lines().rev().map(str::trim).find(|l| !l.is_empty()).unwrap_or("").to_string();
            warn!("step `{step}` process exited with {}", output.status);
            return Err(Box::new(ProcessError::Exit { status: output.status.to_string(),
                                                     stderr_tail: tail }));
        }
        Ok(StepOutcome { summary: parse_summary(step, &String::from_utf8_lossy(&output.stdout)) })
    }
}

fn parse_summary(step: StepId, stdout: &str) -> Value {
    let Some(last) = stdout.lines().rev().find(|l| !l.trim().is_empty()) else {
        return Value::Null;
    };
    match serde_json::from_str(last) {
        Ok(summary) => summary,
        Err(e) => {
            warn!("step `{step}` printed no JSON summary ({e}): {last}");
            Value::Null
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn command_carries_step_params_and_context() {
        let exec = ProcessExecutor::new("/opt/rentflow-step").with_env("RENTFLOW_STORE_DIR", "/srv/artifacts");
        let ctx = RunContext::new("nyc_airbnb", "dev", "/srv/rf").with_work_dir(Path::new("/tmp/rf-run"));
        let params = StepParams::new().with("min_price", 10.0).with("input_artifact", "nyc_airbnb/sample.csv:latest");
        let cmd = exec.command(StepId::BasicCleaning, &params, &ctx);
        let args: Vec<String> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args,
                   vec!["run",
                        "basic_cleaning",
                        "--input_artifact",
                        "nyc_airbnb/sample.csv:latest",
                        "--min_price",
                        "10.0"]);
        assert_eq!(cmd.get_current_dir(), Some(Path::new("/tmp/rf-run")));
        let envs: Vec<(String, String)> =
            cmd.get_envs()
               .filter_map(|(k, v)| Some((k.to_string_lossy().into_owned(), v?.to_string_lossy().into_owned())))
               .collect();
        assert!(envs.contains(&("RENTFLOW_PROJECT".to_string(), "nyc_airbnb".to_string())));
        assert!(envs.contains(&("RENTFLOW_STORE_DIR".to_string(), "/srv/artifacts".to_string())));
    }

    /// `sh run <step> ...` interpreta el fichero `run` del directorio de
    /// trabajo, así el script hace de binario de steps.
    #[cfg(unix)]
    fn shell_step(script: &str) -> (tempfile::TempDir, ProcessExecutor, RunContext) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("run"), script).unwrap();
        let ctx = RunContext::new("nyc_airbnb", "dev", dir.path()).with_work_dir(dir.path());
        (dir, ProcessExecutor::new("sh"), ctx)
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_reports_status_and_stderr_tail() {
        let (_dir, mut exec, ctx) = shell_step(r#"
            echo "loading params" >&2
            echo "invalid price range: 500 > 10" >&2
            exit 3
        "#);
        let err = exec.execute(StepId::BasicCleaning, &StepParams::new(), &ctx).unwrap_err();
        match err.downcast_ref::<ProcessError>() {
            Some(ProcessError::Exit { status, stderr_tail }) => {
                assert!(status.contains('3'), "status was {status}");
                assert_eq!(stderr_tail, "invalid price range: 500 > 10");
            }
            other => panic!("expected exit error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn last_stdout_line_becomes_the_summary() {
        let (_dir, mut exec, ctx) = shell_step(r#"
            echo starting
            echo "{\"step\": \"$1\", \"rows\": 12}"
        "#);
        let outcome = exec.execute(StepId::DataSplit, &StepParams::new(), &ctx).unwrap();
        assert_eq!(outcome.summary, serde_json::json!({"step": "data_split", "rows": 12}));
    }

    #[test]
    fn summary_without_json_is_null() {
        assert_eq!(parse_summary(StepId::Download, ""), Value::Null);
        assert_eq!(parse_summary(StepId::Download, "done\n\n"), Value::Null);
        assert_eq!(parse_summary(StepId::Download, "log\n{\"rows\": 3}\n"), serde_json::json!({"rows": 3}));
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut exec = ProcessExecutor::new(dir.path().join("does-not-exist"));
        let ctx = RunContext::new("p", "g", dir.path()).with_work_dir(dir.path());
        let err = exec.execute(StepId::Download, &StepParams::new(), &ctx).unwrap_err();
        assert!(err.to_string().starts_with("could not start"));
    }
}
