//! Driver del pipeline.
//!
//! Recorre los steps activos en el orden global, construye el mapping de
//! parámetros de cada uno justo antes de invocarlo y se detiene en el primer
//! fallo. Todo lo que ocurre queda en el `EventStore`; `state()` es un replay.

use log::{error, info, warn};
use serde_json::json;
use uuid::Uuid;

use super::{StepExecutor, StepOutcome};
use crate::config::PipelineConfig;
use crate::constants::ENGINE_VERSION;
use crate::errors::PipelineError;
use crate::event::{EventStore, InMemoryEventStore, RunEvent, RunEventKind};
use crate::hashing::hash_value;
use crate::model::RunContext;
use crate::repo::{DriverState, RunInstance};
use crate::step::{check_wiring, spec, StepId};

/// Resumen de un run completado.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub steps: Vec<StepReport>,
    pub run_fingerprint: String,
}

#[derive(Debug, Clone)]
pub struct StepReport {
    pub step: StepId,
    pub params_fingerprint: String,
    pub outcome: StepOutcome,
}

#[derive(Debug)]
pub struct PipelineDriver<X, E = InMemoryEventStore>
    where X: StepExecutor,
          E: EventStore
{
    executor: X,
    events: E,
    last_run: Option<Uuid>,
}

impl<X: StepExecutor> PipelineDriver<X, InMemoryEventStore> {
    pub fn new(executor: X) -> Self {
        Self::with_event_store(executor, InMemoryEventStore::default())
    }
}

impl<X, E> PipelineDriver<X, E>
    where X: StepExecutor,
          E: EventStore
{
    pub fn with_event_store(executor: X, events: E) -> Self {
        Self { executor,
               events,
               last_run: None }
    }

    pub fn executor(&self) -> &X {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut X {
        &mut self.executor
    }

    pub fn event_store(&self) -> &E {
        &self.events
    }

    /// Id del último run iniciado.
    pub fn last_run(&self) -> Option<Uuid> {
        self.last_run
    }

    /// Eventos del último run.
    pub fn events(&self) -> Vec<RunEvent> {
        self.last_run.map(|id| self.events.list(id)).unwrap_or_default()
    }

    /// Estado del driver reconstruido desde los eventos del último run.
    pub fn state(&self) -> DriverState {
        self.instance().map(|i| i.state).unwrap_or(DriverState::Idle)
    }

    pub fn instance(&self) -> Option<RunInstance> {
        self.last_run.map(|id| RunInstance::replay(id, &self.events.list(id)))
    }

    /// Todos los runs de este driver, del más antiguo al último.
    pub fn history(&self) -> Vec<RunInstance> {
        self.events.runs().into_iter().map(|id| RunInstance::replay(id, &self.events.list(id))).collect()
    }

    /// Ejecuta los steps activos de `config`.
    ///
    /// El directorio de trabajo temporal se crea aquí y se libera al salir,
    /// tanto si el run termina bien como si falla.
    pub fn run(&mut self, config: &PipelineConfig, base: &RunContext) -> Result<RunReport, PipelineError> {
        config.validate()?;
        let active = config.main.steps.active();
        for gap in check_wiring(&active) {
            warn!("step `{}` reads `{}` but no earlier selected step produces it; relying on the store",
                  gap.step, gap.artifact);
        }

        let scratch = tempfile::Builder::new().prefix("rentflow-").tempdir()?;
        let ctx = base.with_work_dir(scratch.path());
        let run_id = ctx.run_id;
        self.last_run = Some(run_id);
        self.events.append_kind(run_id,
                                RunEventKind::RunInitialized { project: ctx.project.clone(),
                                                               group: ctx.group.clone(),
                                                               active_steps: active.clone() });
        info!("run {run_id} ({}/{}): steps {:?}",
              ctx.project,
              ctx.group,
              active.iter().map(|s| s.name()).collect::<Vec<_>>());

        let mut reports = Vec::with_capacity(active.len());
        for step in active {
            reports.push(self.run_step(step, config, &ctx)?);
        }

        let run_fingerprint = hash_value(&json!({
            "engine_version": ENGINE_VERSION,
            "steps": reports.iter()
                            .map(|r| json!({"step": r.step.name(), "params": r.params_fingerprint}))
                            .collect::<Vec<_>>(),
        }));
        self.events
            .append_kind(run_id, RunEventKind::RunCompleted { run_fingerprint: run_fingerprint.clone() });
        info!("run {run_id} completed");
        Ok(RunReport { run_id,
                       steps: reports,
                       run_fingerprint })
    }

    fn run_step(&mut self, step: StepId, config: &PipelineConfig, ctx: &RunContext) -> Result<StepReport, PipelineError> {
        let spec = spec(step);
        let params = match (spec.build_params)(config, ctx) {
            Ok(p) => p,
            Err(e) => {
                self.fail(ctx.run_id, step, &e.to_string());
                return Err(e);
            }
        };
        let params_fingerprint = params.fingerprint_in(&ctx.work_dir);
        self.events.append_kind(ctx.run_id,
                                RunEventKind::StepStarted { step,
                                                            params_fingerprint: params_fingerprint.clone() });
        info!("step `{step}` started");

        match self.executor.execute(step, &params, ctx) {
            Ok(outcome) => {
                self.events.append_kind(ctx.run_id,
                                        RunEventKind::StepFinished { step,
                                                                     produced: spec.produces
                                                                                   .iter()
                                                                                   .map(|s| s.to_string())
                                                                                   .collect(),
                                                                     summary: outcome.summary.clone() });
                info!("step `{step}` finished");
                Ok(StepReport { step,
                                params_fingerprint,
                                outcome })
            }
            Err(source) => {
                self.fail(ctx.run_id, step, &error_chain(source.as_ref()));
                Err(PipelineError::StepExecution { step, source })
            }
        }
    }

    fn fail(&mut self, run_id: Uuid, step: StepId, error: &str) {
        error!("step `{step}` failed: {error}");
        self.events.append_kind(run_id,
                                RunEventKind::StepFailed { step,
                                                           error: error.to_string() });
    }
}

/// Mensaje del error seguido de sus causas, separadas por `: `.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut cause = err.source();
    while let Some(c) = cause {
        out.push_str(": ");
        out.push_str(&c.to_string());
        cause = c.source();
    }
    out
}
