//! Errores del orquestador.
//!
//! Taxonomía:
//! - `ConfigError`: configuración mal formada o incompleta; aborta antes de
//!   ejecutar cualquier step.
//! - `StoreError`: contrato del artifact store (fetch/publish/promote).
//! - `ParamError`: un step recibió un mapping de parámetros incompleto.
//! - `PipelineError`: lo que ve el caller del driver. Los fallos de un step
//!   viajan como `BoxError` y se envuelven en `StepExecution` sin alterarse.

use thiserror::Error;

use crate::step::StepId;

/// Error opaco que cruza la frontera del executor.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing configuration key `{0}`")]
    Missing(String),
    #[error("unknown configuration key `{0}`")]
    UnknownKey(String),
    #[error("invalid value for `{key}`: {reason}")]
    Invalid { key: String, reason: String },
    #[error("unknown step `{0}`")]
    UnknownStep(String),
    #[error("malformed configuration: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("artifact not found: {0}")]
    NotFound(String),
    #[error("artifact version is ambiguous: {reference} matches {candidates} versions")]
    AmbiguousVersion { reference: String, candidates: usize },
    #[error("publish conflict: {0}")]
    Conflict(String),
    #[error("invalid artifact reference `{0}`")]
    InvalidReference(String),
    #[error("corrupt store entry: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamError {
    #[error("missing parameter `{0}`")]
    Missing(String),
    #[error("invalid parameter `{name}`: {reason}")]
    Invalid { name: String, reason: String },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error")]
    Configuration(#[from] ConfigError),
    #[error("step `{step}` failed")]
    StepExecution {
        step: StepId,
        #[source]
        source: BoxError,
    },
    #[error("working directory")]
    Workspace(#[from] std::io::Error),
}

impl PipelineError {
    /// Step que detuvo el run, si el fallo ocurrió dentro de uno.
    pub fn failed_step(&self) -> Option<StepId> {
        match self {
            PipelineError::StepExecution { step, .. } => Some(*step),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_execution_names_step_and_cause() {
        let err = PipelineError::StepExecution { step: StepId::BasicCleaning,
                                                 source: Box::new(StoreError::NotFound("nyc_airbnb/sample.csv:latest".into())) };
        assert_eq!(err.to_string(),
                   "step `basic_cleaning` failed: artifact not found: nyc_airbnb/sample.csv:latest");
        assert_eq!(err.failed_step(), Some(StepId::BasicCleaning));
    }

    #[test]
    fn config_error_formats() {
        let err = ConfigError::Invalid { key: "modeling.test_size".into(),
                                         reason: "must be in (0, 1)".into() };
        assert_eq!(err.to_string(), "invalid value for `modeling.test_size`: must be in (0, 1)");
        assert_eq!(ConfigError::UnknownStep("deploy".into()).to_string(), "unknown step `deploy`");
    }
}
