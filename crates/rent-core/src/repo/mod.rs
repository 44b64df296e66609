pub mod types;
pub use types::{DriverState, RunInstance, StepSlot};
