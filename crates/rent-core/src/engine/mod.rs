//! Driver secuencial y executors de steps.

pub mod driver;
pub mod executor;
pub mod process;

pub use driver::{PipelineDriver, RunReport, StepReport};
pub use executor::{StepExecutor, StepOutcome};
pub use process::{ProcessError, ProcessExecutor};
