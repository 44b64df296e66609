//! rent-steps
//!
//! Steps integrados del pipeline de precios sobre un `ArtifactStore`:
//! - `dataset`: tabla CSV en memoria.
//! - `cleaning`: filtro de precio y normalización de `last_review`.
//! - `split` / `model`: partición reproducible y modelo de referencia.
//! - `steps`: los seis steps; `executor`: su `StepExecutor` en proceso.

pub mod cleaning;
pub mod dataset;
pub mod error;
pub mod executor;
pub mod model;
pub mod session;
pub mod split;
pub mod steps;

pub use cleaning::{clean, CleaningError, CleaningReport, CleaningRule};
pub use dataset::{Cell, Dataset, DatasetError};
pub use error::StepError;
pub use executor::BuiltinExecutor;
pub use steps::run_step;
