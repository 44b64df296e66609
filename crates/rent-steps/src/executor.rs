//! Executor en proceso: corre los steps integrados contra un store propio.

use rent_core::{ArtifactStore, BoxError, RunContext, StepExecutor, StepId, StepOutcome, StepParams};

use crate::steps::run_step;

#[derive(Debug)]
pub struct BuiltinExecutor<S: ArtifactStore> {
    store: S,
}

impl<S: ArtifactStore> BuiltinExecutor<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

impl<S: ArtifactStore> StepExecutor for BuiltinExecutor<S> {
    fn execute(&mut self, step: StepId, params: &StepParams, ctx: &RunContext) -> Result<StepOutcome, BoxError> {
        run_step(step, params, ctx, &mut self.store).map_err(|e| Box::new(e) as BoxError)
    }
}
