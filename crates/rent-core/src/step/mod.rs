//! Definiciones relacionadas a Steps.
//!
//! Un step es una unidad ejecutable independiente (download, cleaning,
//! check, split, train, test). Este módulo define:
//! - `StepId`: enumeración cerrada y ordenada de los steps.
//! - `StepParams`: mapping de parámetros construido por invocación.
//! - `PIPELINE`: tabla identificador → builder de parámetros + artifacts.
//! - `StepStatus`: estado de cada step dentro de un run.

mod id;
pub mod params;
mod status;
pub mod table;

pub use id::StepId;
pub use params::StepParams;
pub use status::StepStatus;
pub use table::{check_wiring, spec, StepSpec, WiringGap, PIPELINE};
