//! Steps integrados. Cada uno recibe su mapping de parámetros y una sesión
//! contra el store, y devuelve un resumen JSON.

pub mod basic_cleaning;
pub mod data_check;
pub mod data_split;
pub mod download;
pub mod test_model;
pub mod train;

use rent_core::{ArtifactStore, RunContext, StepId, StepOutcome, StepParams};

use crate::error::StepError;
use crate::session::StepSession;

pub fn run_step<S>(step: StepId, params: &StepParams, ctx: &RunContext, store: &mut S) -> Result<StepOutcome, StepError>
    where S: ArtifactStore + ?Sized
{
    let mut session = StepSession::open(step, ctx, store)?;
    let summary = match step {
        StepId::Download => download::run(params, &mut session)?,
        StepId::BasicCleaning => basic_cleaning::run(params, &mut session)?,
        StepId::DataCheck => data_check::run(params, &mut session)?,
        StepId::DataSplit => data_split::run(params, &mut session)?,
        StepId::TrainRandomForest => train::run(params, &mut session)?,
        StepId::TestRegressionModel => test_model::run(params, &mut session)?,
    };
    Ok(StepOutcome { summary })
}
