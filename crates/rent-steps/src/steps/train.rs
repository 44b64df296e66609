//! Entrena el modelo de precios sobre `trainval_data.csv` y lo exporta.
//!
//! Se reserva `val_size` del trainval para validación con el mismo
//! separador que `data_split`; las métricas quedan en la metadata del export.

use std::fs;

use log::info;
use rent_core::{ArtifactStore, StepParams};
use serde_json::{json, Value};

use super::data_split::{fraction, split_dataset};
use crate::dataset::Dataset;
use crate::error::StepError;
use crate::model::PriceModel;
use crate::session::StepSession;
use crate::split::Split;

pub const MODEL_EXPORT_TYPE: &str = "model_export";

pub fn run<S: ArtifactStore + ?Sized>(params: &StepParams, session: &mut StepSession<'_, S>) -> Result<Value, StepError> {
    let val_size = fraction(params, "val_size")?;
    let seed = params.u64("random_seed")?;
    let stratify = params.optional_column("stratify_by")?;
    let max_tfidf_features = params.u64("max_tfidf_features")?;
    let output = params.text("output_artifact")?;
    let rf_config: Value = serde_json::from_slice(&fs::read(params.text("rf_config")?)?)?;

    let data = Dataset::read_csv(&session.use_artifact(&params.artifact("trainval_artifact")?)?.path)?;
    let Split { train, test: val } = split_dataset(&data, stratify.as_deref(), val_size, seed)?;
    let model = PriceModel::fit(&data.select(&train), rf_config, max_tfidf_features)?;
    let metrics = model.evaluate(&data.select(&val))?;
    info!("validation MAE {:.3}, R2 {:.3} on {} rows", metrics.mae, metrics.r2, metrics.rows);

    let local = session.scratch_path(&format!("{output}.json"));
    model.save(&local)?;
    let metrics = serde_json::to_value(metrics)?;
    let handle = session.log_artifact(&output,
                                      MODEL_EXPORT_TYPE,
                                      "Price model export",
                                      &local,
                                      json!({"validation": metrics.clone()}))?;
    Ok(json!({"artifact": handle.pinned().to_string(), "validation": metrics}))
}
