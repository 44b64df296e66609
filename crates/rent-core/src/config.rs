//! Configuración tipada del pipeline.
//!
//! Se deserializa una sola vez al arrancar y es inmutable durante el run.
//! Cada sección rechaza claves desconocidas; `validate` comprueba rangos
//! antes de ejecutar ningún step. La carga (fichero + overrides) vive en el
//! binario; aquí sólo está la forma de los datos.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ConfigError;
use crate::step::StepId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    pub main: MainConfig,
    pub etl: EtlConfig,
    pub data_check: DataCheckConfig,
    pub modeling: ModelingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MainConfig {
    pub project_name: String,
    pub experiment_name: String,
    pub steps: StepSelection,
    #[serde(default)]
    pub executor: ExecutorKind,
}

/// Cómo se ejecuta cada step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorKind {
    /// En el mismo proceso que el driver.
    #[default]
    Builtin,
    /// Un proceso hijo `rentflow-step` por step.
    Process,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EtlConfig {
    /// Fichero de muestra, relativo a `<root>/data`.
    pub sample: String,
    pub min_price: f64,
    pub max_price: f64,
    #[serde(default)]
    pub last_review_policy: DatePolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataCheckConfig {
    pub kl_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelingConfig {
    pub test_size: f64,
    pub val_size: f64,
    pub random_seed: u64,
    /// Columna de estratificación o `none`.
    pub stratify_by: String,
    pub max_tfidf_features: u32,
    /// Hiperparámetros del modelo; se pasan tal cual al step de training.
    pub random_forest: Map<String, Value>,
}

/// Política ante un `last_review` no parseable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatePolicy {
    /// La celda queda nula y la fila se reporta.
    #[default]
    Flag,
    /// El step falla con un error de parseo.
    Reject,
}

impl DatePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            DatePolicy::Flag => "flag",
            DatePolicy::Reject => "reject",
        }
    }
}

impl FromStr for DatePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flag" => Ok(DatePolicy::Flag),
            "reject" => Ok(DatePolicy::Reject),
            other => Err(ConfigError::Invalid { key: "etl.last_review_policy".into(),
                                                reason: format!("`{other}` is not one of flag, reject") }),
        }
    }
}

/// Steps seleccionados: `all` o una lista separada por comas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StepSelection {
    All,
    Only(Vec<StepId>),
}

impl StepSelection {
    /// Steps activos en el orden global, sin importar el orden de la lista.
    pub fn active(&self) -> Vec<StepId> {
        StepId::ALL.into_iter()
                   .filter(|id| match self {
                       StepSelection::All => id.in_default_selection(),
                       StepSelection::Only(list) => list.contains(id),
                   })
                   .collect()
    }
}

impl FromStr for StepSelection {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "all" {
            return Ok(StepSelection::All);
        }
        let ids = s.split(',')
                   .map(str::trim)
                   .filter(|p| !p.is_empty())
                   .map(str::parse)
                   .collect::<Result<Vec<StepId>, _>>()?;
        if ids.is_empty() {
            return Err(ConfigError::Invalid { key: "main.steps".into(),
                                              reason: "no steps selected".into() });
        }
        Ok(StepSelection::Only(ids))
    }
}

impl TryFrom<String> for StepSelection {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StepSelection> for String {
    fn from(value: StepSelection) -> Self {
        value.to_string()
    }
}

impl fmt::Display for StepSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepSelection::All => f.write_str("all"),
            StepSelection::Only(list) => {
                let names: Vec<&str> = list.iter().map(|s| s.name()).collect();
                f.write_str(&names.join(","))
            }
        }
    }
}

impl ModelingConfig {
    pub fn stratify_column(&self) -> Option<&str> {
        let s = self.stratify_by.trim();
        (!s.is_empty() && !s.eq_ignore_ascii_case("none")).then_some(s)
    }
}

impl PipelineConfig {
    /// Comprobaciones de rango que serde no puede expresar. El orden
    /// `min_price <= max_price` lo valida el propio step de limpieza.
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_empty("main.project_name", &self.main.project_name)?;
        non_empty("main.experiment_name", &self.main.experiment_name)?;
        non_empty("etl.sample", &self.etl.sample)?;
        finite("etl.min_price", self.etl.min_price)?;
        finite("etl.max_price", self.etl.max_price)?;
        fraction("modeling.test_size", self.modeling.test_size)?;
        fraction("modeling.val_size", self.modeling.val_size)?;
        finite("data_check.kl_threshold", self.data_check.kl_threshold)?;
        if self.data_check.kl_threshold < 0.0 {
            return Err(invalid("data_check.kl_threshold", "must be >= 0"));
        }
        Ok(())
    }
}

fn non_empty(key: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Missing(key.to_string()));
    }
    Ok(())
}

fn finite(key: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(invalid(key, "must be finite"));
    }
    Ok(())
}

fn fraction(key: &str, value: f64) -> Result<(), ConfigError> {
    if !(value > 0.0 && value < 1.0) {
        return Err(invalid(key, "must be in (0, 1)"));
    }
    Ok(())
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { key: key.to_string(),
                           reason: reason.to_string() }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn sample_config() -> PipelineConfig {
        serde_json::from_value(json!({
            "main": {"project_name": "nyc_airbnb", "experiment_name": "development", "steps": "all"},
            "etl": {"sample": "sample1.csv", "min_price": 10, "max_price": 350},
            "data_check": {"kl_threshold": 0.2},
            "modeling": {
                "test_size": 0.2, "val_size": 0.2, "random_seed": 42,
                "stratify_by": "neighbourhood_group", "max_tfidf_features": 5,
                "random_forest": {"n_estimators": 100, "max_depth": 15}
            }
        })).expect("valid config")
    }

    #[test]
    fn all_excludes_test_step() {
        let active = StepSelection::All.active();
        assert_eq!(active.len(), 5);
        assert!(!active.contains(&StepId::TestRegressionModel));
    }

    #[test]
    fn explicit_list_is_visited_in_global_order() {
        let sel: StepSelection = "data_split, download".parse().unwrap();
        assert_eq!(sel.active(), vec![StepId::Download, StepId::DataSplit]);
        let sel: StepSelection = "test_regression_model".parse().unwrap();
        assert_eq!(sel.active(), vec![StepId::TestRegressionModel]);
    }

    #[test]
    fn unknown_or_empty_selection_is_rejected() {
        assert!(matches!("download,deploy".parse::<StepSelection>(), Err(ConfigError::UnknownStep(s)) if s == "deploy"));
        assert!(" , ".parse::<StepSelection>().is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut v = serde_json::to_value(sample_config()).unwrap();
        v["etl"]["min_prize"] = json!(1);
        assert!(serde_json::from_value::<PipelineConfig>(v).is_err());
    }

    #[test]
    fn validate_checks_ranges() {
        let mut cfg = sample_config();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.modeling.stratify_column(), Some("neighbourhood_group"));
        assert_eq!(cfg.etl.last_review_policy, DatePolicy::Flag);
        assert_eq!(cfg.main.executor, ExecutorKind::Builtin);
        cfg.modeling.test_size = 1.5;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid { key, .. }) if key == "modeling.test_size"));
        cfg.modeling.test_size = 0.2;
        cfg.main.project_name = " ".into();
        assert!(matches!(cfg.validate(), Err(ConfigError::Missing(_))));
    }
}
