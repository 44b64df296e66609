//! Evalúa el modelo promovido a `prod` contra `test_data.csv`.

use log::info;
use rent_core::{ArtifactStore, StepParams};
use serde_json::{json, Value};

use crate::dataset::Dataset;
use crate::error::StepError;
use crate::model::PriceModel;
use crate::session::StepSession;

pub fn run<S: ArtifactStore + ?Sized>(params: &StepParams, session: &mut StepSession<'_, S>) -> Result<Value, StepError> {
    let model = PriceModel::load(&session.use_artifact(&params.artifact("mlflow_model")?)?.path)?;
    let test = Dataset::read_csv(&session.use_artifact(&params.artifact("test_dataset")?)?.path)?;
    let metrics = model.evaluate(&test)?;
    info!("test MAE {:.3}, R2 {:.3} on {} rows", metrics.mae, metrics.r2, metrics.rows);
    Ok(json!({"test": metrics}))
}
