//! Estado reconstruido de un run (`RunInstance`).
//!
//! El replay es lineal: consume los eventos en orden y deriva el estado de
//! cada step y del driver. No guarda artifacts, sólo sus nombres.
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::event::{RunEvent, RunEventKind};
use crate::step::{StepId, StepStatus};

/// Estado de la máquina del driver.
///
/// `Idle` → `InStep(download)` → … → `Done`, o `Failed(step)` en el primer
/// fallo. Sólo se visitan los steps activos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    InStep(StepId),
    Done,
    Failed(StepId),
}

#[derive(Debug, Clone)]
pub struct RunInstance {
    pub id: Uuid,
    pub slots: Vec<StepSlot>,
    pub state: DriverState,
}

/// Estado de un step en la instancia.
#[derive(Debug, Clone)]
pub struct StepSlot {
    pub step: StepId,
    pub status: StepStatus,
    pub params_fingerprint: Option<String>,
    pub produced: Vec<String>,
    pub error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunInstance {
    pub fn replay(run_id: Uuid, events: &[RunEvent]) -> Self {
        let mut slots: Vec<StepSlot> = StepId::ALL.into_iter()
                                                  .map(|step| StepSlot { step,
                                                                         status: StepStatus::Skipped,
                                                                         params_fingerprint: None,
                                                                         produced: vec![],
                                                                         error: None,
                                                                         started_at: None,
                                                                         finished_at: None })
                                                  .collect();
        let mut state = DriverState::Idle;
        for ev in events {
            match &ev.kind {
                RunEventKind::RunInitialized { active_steps, .. } => {
                    for step in active_steps {
                        slots[step.index()].status = StepStatus::Pending;
                    }
                }
                RunEventKind::StepStarted { step, params_fingerprint } => {
                    let slot = &mut slots[step.index()];
                    slot.status = StepStatus::Running;
                    slot.params_fingerprint = Some(params_fingerprint.clone());
                    slot.started_at = Some(ev.ts);
                    state = DriverState::InStep(*step);
                }
                RunEventKind::StepFinished { step, produced, .. } => {
                    let slot = &mut slots[step.index()];
                    slot.status = StepStatus::FinishedOk;
                    slot.produced = produced.clone();
                    slot.finished_at = Some(ev.ts);
                    state = DriverState::InStep(*step);
                }
                RunEventKind::StepFailed { step, error } => {
                    let slot = &mut slots[step.index()];
                    slot.status = StepStatus::Failed;
                    slot.error = Some(error.clone());
                    slot.finished_at = Some(ev.ts);
                    state = DriverState::Failed(*step);
                }
                RunEventKind::RunCompleted { .. } => state = DriverState::Done,
            }
        }
        Self { id: run_id, slots, state }
    }

    pub fn slot(&self, step: StepId) -> &StepSlot {
        &self.slots[step.index()]
    }

    /// Steps que terminaron bien, en orden de ejecución.
    pub fn finished(&self) -> Vec<StepId> {
        self.slots
            .iter()
            .filter(|s| s.status == StepStatus::FinishedOk)
            .map(|s| s.step)
            .collect()
    }
}
