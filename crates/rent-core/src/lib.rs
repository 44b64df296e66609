//! rent-core: driver secuencial del pipeline de precios y contrato del
//! artifact store.
pub mod config;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod event;
pub mod hashing;
pub mod model;
pub mod repo;
pub mod step;

pub use config::{DatePolicy, ExecutorKind, PipelineConfig, StepSelection};
pub use engine::{PipelineDriver, ProcessExecutor, RunReport, StepExecutor, StepOutcome};
pub use errors::{BoxError, ConfigError, ParamError, PipelineError, StoreError};
pub use event::{EventStore, InMemoryEventStore, RunEvent, RunEventKind};
pub use model::{ArtifactHandle, ArtifactRef, ArtifactStore, FetchedArtifact, PublishRequest, RunContext, VersionSpec};
pub use repo::{DriverState, RunInstance};
pub use step::{StepId, StepParams, StepStatus};
