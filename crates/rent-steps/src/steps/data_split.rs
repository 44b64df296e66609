//! Separa el dato limpio en `trainval_data.csv` y `test_data.csv`.

use rent_core::constants::{TEST_DATA_ARTIFACT, TRAINVAL_ARTIFACT};
use rent_core::{ArtifactStore, ParamError, StepParams};
use serde_json::{json, Value};

use crate::dataset::Dataset;
use crate::error::StepError;
use crate::session::StepSession;
use crate::split::{split_indices, Split};

pub const SEGREGATED_TYPE: &str = "segregated_data";

pub fn run<S: ArtifactStore + ?Sized>(params: &StepParams, session: &mut StepSession<'_, S>) -> Result<Value, StepError> {
    let test_size = fraction(params, "test_size")?;
    let seed = params.u64("random_seed")?;
    let stratify = params.optional_column("stratify")?;
    let data = Dataset::read_csv(&session.use_artifact(&params.artifact("input")?)?.path)?;

    let Split { train, test } = split_dataset(&data, stratify.as_deref(), test_size, seed)?;
    let mut published = Vec::new();
    for (name, rows, description) in [(TRAINVAL_ARTIFACT, &train, "Train and validation rows"),
                                      (TEST_DATA_ARTIFACT, &test, "Held-out test rows")]
    {
        let local = session.scratch_path(name);
        data.select(rows).write_csv(&local)?;
        let handle = session.log_artifact(name, SEGREGATED_TYPE, description, &local, json!({"rows": rows.len()}))?;
        published.push(handle.pinned().to_string());
    }
    Ok(json!({"artifacts": published, "train_rows": train.len(), "test_rows": test.len()}))
}

/// Partición por índices, opcionalmente estratificada por `stratify`.
pub fn split_dataset(data: &Dataset, stratify: Option<&str>, size: f64, seed: u64) -> Result<Split, StepError> {
    let labels = match stratify {
        Some(column) => Some(data.column(column)?.into_iter().map(|c| c.render()).collect::<Vec<_>>()),
        None => None,
    };
    Ok(split_indices(data.len(), labels.as_deref(), size, seed))
}

pub(crate) fn fraction(params: &StepParams, key: &str) -> Result<f64, StepError> {
    let v = params.f64(key)?;
    if v > 0.0 && v < 1.0 {
        Ok(v)
    } else {
        Err(ParamError::Invalid { name: key.to_string(),
                                  reason: format!("{v} is not in (0, 1)") }.into())
    }
}
