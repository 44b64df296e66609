//! Tipos de evento del run y estructura `RunEvent`.
//!
//! Rol en el pipeline:
//! - Cada run del driver emite eventos a un `EventStore` append-only.
//! - El estado del driver (`DriverState`) se reconstruye por replay de estos
//!   eventos, sin estructuras mutables paralelas.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::step::StepId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RunEventKind {
    /// Primer evento de un `run_id`: fija proyecto, grupo y steps activos.
    RunInitialized {
        project: String,
        group: String,
        active_steps: Vec<StepId>,
    },
    /// Un step comenzó. No implica éxito.
    StepStarted { step: StepId, params_fingerprint: String },
    /// Un step terminó bien; `produced` son los nombres convencionales que
    /// el driver le indicó publicar.
    StepFinished {
        step: StepId,
        produced: Vec<String>,
        summary: Value,
    },
    /// Un step falló. El run no continúa.
    StepFailed { step: StepId, error: String },
    /// Cierre con el fingerprint agregado del run.
    RunCompleted { run_fingerprint: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEvent {
    pub seq: u64,
    pub run_id: Uuid,
    pub kind: RunEventKind,
    pub ts: DateTime<Utc>, // metadato (no entra en fingerprint)
}
