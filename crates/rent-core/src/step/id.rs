use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Identificador cerrado de los steps del pipeline.
///
/// El orden de declaración es el orden global de ejecución.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    Download,
    BasicCleaning,
    DataCheck,
    DataSplit,
    TrainRandomForest,
    TestRegressionModel,
}

impl StepId {
    pub const ALL: [StepId; 6] = [StepId::Download,
                                  StepId::BasicCleaning,
                                  StepId::DataCheck,
                                  StepId::DataSplit,
                                  StepId::TrainRandomForest,
                                  StepId::TestRegressionModel];

    pub fn name(self) -> &'static str {
        match self {
            StepId::Download => "download",
            StepId::BasicCleaning => "basic_cleaning",
            StepId::DataCheck => "data_check",
            StepId::DataSplit => "data_split",
            StepId::TrainRandomForest => "train_random_forest",
            StepId::TestRegressionModel => "test_regression_model",
        }
    }

    /// Posición en el orden global.
    pub fn index(self) -> usize {
        self as usize
    }

    /// `test_regression_model` queda fuera de `all`: exige un modelo
    /// promovido a `prod` y se pide siempre de forma explícita.
    pub fn in_default_selection(self) -> bool {
        !matches!(self, StepId::TestRegressionModel)
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StepId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StepId::ALL.into_iter()
                   .find(|id| id.name() == s)
                   .ok_or_else(|| ConfigError::UnknownStep(s.to_string()))
    }
}
