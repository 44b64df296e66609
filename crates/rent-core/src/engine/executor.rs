use serde_json::Value;

use crate::errors::BoxError;
use crate::model::RunContext;
use crate::step::{StepId, StepParams};

/// Resultado de un step exitoso. Los artifacts emitidos no se inspeccionan:
/// el driver ya conoce los nombres que le indicó publicar.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepOutcome {
    /// Resumen libre (conteos, métricas) que el step quiera reportar.
    pub summary: Value,
}

/// Ejecuta un step aislado hasta terminar.
///
/// La llamada bloquea al driver mientras el step corre; no hay cancelación
/// ni timeout. Cualquier `Err` detiene el pipeline.
pub trait StepExecutor {
    fn execute(&mut self, step: StepId, params: &StepParams, ctx: &RunContext) -> Result<StepOutcome, BoxError>;
}

impl<T: StepExecutor + ?Sized> StepExecutor for Box<T> {
    fn execute(&mut self, step: StepId, params: &StepParams, ctx: &RunContext) -> Result<StepOutcome, BoxError> {
        (**self).execute(step, params, ctx)
    }
}
