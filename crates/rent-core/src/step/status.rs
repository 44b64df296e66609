/// Estado de un step dentro de un run.
///
/// Transiciones válidas:
/// - `Pending` -> `Running`
/// - `Running` -> `FinishedOk`
/// - `Running` -> `Failed`
///
/// Los steps no seleccionados quedan en `Skipped` durante todo el run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// Seleccionado, todavía no ejecutado.
    Pending,
    /// No forma parte de los steps activos.
    Skipped,
    /// En ejecución.
    Running,
    /// Finalizó correctamente.
    FinishedOk,
    /// Falló; el run se detuvo aquí.
    Failed,
}
