//! Errores de los steps integrados.

use rent_core::{ParamError, StoreError};
use thiserror::Error;

use crate::cleaning::CleaningError;
use crate::dataset::DatasetError;

#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Params(#[from] ParamError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Cleaning(#[from] CleaningError),
    #[error("data checks failed: {}", .0.join("; "))]
    Checks(Vec<String>),
    #[error("model: {0}")]
    Model(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
