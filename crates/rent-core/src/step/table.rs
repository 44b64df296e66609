//! Tabla ordenada de steps: identificador → (builder de parámetros,
//! artifacts consumidos, artifacts producidos).
//!
//! Los nombres de artifacts son convención: el driver le dice a cada step qué
//! leer y qué publicar. `check_wiring` detecta estáticamente los consumos que
//! ningún step activo anterior produce.

use std::fs;

use serde_json::Value;

use super::{StepId, StepParams};
use crate::config::PipelineConfig;
use crate::constants::{CLEAN_DATA_ARTIFACT, MODEL_EXPORT_ARTIFACT, PROD_ALIAS, RAW_SAMPLE_ARTIFACT,
                       REFERENCE_ALIAS, TEST_DATA_ARTIFACT, TRAINVAL_ARTIFACT};
use crate::errors::PipelineError;
use crate::model::{ArtifactRef, RunContext, VersionSpec};

pub type ParamBuilder = fn(&PipelineConfig, &RunContext) -> Result<StepParams, PipelineError>;

pub struct StepSpec {
    pub id: StepId,
    pub consumes: &'static [&'static str],
    pub produces: &'static [&'static str],
    pub build_params: ParamBuilder,
}

/// Orden global del pipeline; `PIPELINE[id.index()].id == id`.
pub static PIPELINE: [StepSpec; 6] = [StepSpec { id: StepId::Download,
                                                 consumes: &[],
                                                 produces: &[RAW_SAMPLE_ARTIFACT],
                                                 build_params: download_params },
                                      StepSpec { id: StepId::BasicCleaning,
                                                 consumes: &[RAW_SAMPLE_ARTIFACT],
                                                 produces: &[CLEAN_DATA_ARTIFACT],
                                                 build_params: cleaning_params },
                                      StepSpec { id: StepId::DataCheck,
                                                 consumes: &[CLEAN_DATA_ARTIFACT],
                                                 produces: &[],
                                                 build_params: data_check_params },
                                      StepSpec { id: StepId::DataSplit,
                                                 consumes: &[CLEAN_DATA_ARTIFACT],
                                                 produces: &[TRAINVAL_ARTIFACT, TEST_DATA_ARTIFACT],
                                                 build_params: split_params },
                                      StepSpec { id: StepId::TrainRandomForest,
                                                 consumes: &[TRAINVAL_ARTIFACT],
                                                 produces: &[MODEL_EXPORT_ARTIFACT],
                                                 build_params: train_params },
                                      StepSpec { id: StepId::TestRegressionModel,
                                                 consumes: &[MODEL_EXPORT_ARTIFACT, TEST_DATA_ARTIFACT],
                                                 produces: &[],
                                                 build_params: test_params }];

pub fn spec(id: StepId) -> &'static StepSpec {
    &PIPELINE[id.index()]
}

/// Un artifact consumido por `step` que ningún step activo previo produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WiringGap {
    pub step: StepId,
    pub artifact: &'static str,
}

pub fn check_wiring(active: &[StepId]) -> Vec<WiringGap> {
    let mut produced: Vec<&'static str> = Vec::new();
    let mut gaps = Vec::new();
    for id in StepId::ALL.into_iter().filter(|id| active.contains(id)) {
        let s = spec(id);
        for artifact in s.consumes {
            if !produced.contains(artifact) {
                gaps.push(WiringGap { step: id, artifact });
            }
        }
        produced.extend_from_slice(s.produces);
    }
    gaps
}

fn artifact(ctx: &RunContext, name: &str, version: VersionSpec) -> String {
    ArtifactRef::new(name, version).in_project(ctx.project.clone()).to_string()
}

fn download_params(cfg: &PipelineConfig, ctx: &RunContext) -> Result<StepParams, PipelineError> {
    let sample = ctx.root_dir.join("data").join(&cfg.etl.sample);
    Ok(StepParams::new().with("sample", sample.display().to_string())
                        .with("artifact_name", RAW_SAMPLE_ARTIFACT)
                        .with("artifact_type", "raw_data")
                        .with("artifact_description", "Raw file as downloaded"))
}

fn cleaning_params(cfg: &PipelineConfig, ctx: &RunContext) -> Result<StepParams, PipelineError> {
    Ok(StepParams::new().with("input_artifact", artifact(ctx, RAW_SAMPLE_ARTIFACT, VersionSpec::Latest))
                        .with("output_artifact", CLEAN_DATA_ARTIFACT)
                        .with("output_type", "clean_data")
                        .with("output_description", "Clean dataset with outliers removed")
                        .with("min_price", cfg.etl.min_price)
                        .with("max_price", cfg.etl.max_price)
                        .with("last_review_policy", cfg.etl.last_review_policy.as_str()))
}

fn data_check_params(cfg: &PipelineConfig, ctx: &RunContext) -> Result<StepParams, PipelineError> {
    Ok(StepParams::new().with("csv", artifact(ctx, CLEAN_DATA_ARTIFACT, VersionSpec::Latest))
                        .with("ref",
                              artifact(ctx, CLEAN_DATA_ARTIFACT, VersionSpec::Alias(REFERENCE_ALIAS.to_string())))
                        .with("kl_threshold", cfg.data_check.kl_threshold)
                        .with("min_price", cfg.etl.min_price)
                        .with("max_price", cfg.etl.max_price))
}

fn split_params(cfg: &PipelineConfig, ctx: &RunContext) -> Result<StepParams, PipelineError> {
    Ok(StepParams::new().with("input", artifact(ctx, CLEAN_DATA_ARTIFACT, VersionSpec::Latest))
                        .with("test_size", cfg.modeling.test_size)
                        .with("random_seed", cfg.modeling.random_seed)
                        .with("stratify", cfg.modeling.stratify_column().unwrap_or("none")))
}

/// Los hiperparámetros se serializan a `rf_config.json` en el directorio de
/// trabajo del run; el step recibe la ruta.
fn train_params(cfg: &PipelineConfig, ctx: &RunContext) -> Result<StepParams, PipelineError> {
    let rf_config = ctx.work_dir.join("rf_config.json");
    let body = serde_json::to_vec(&Value::Object(cfg.modeling.random_forest.clone())).map_err(std::io::Error::other)?;
    fs::write(&rf_config, body)?;
    Ok(StepParams::new().with("trainval_artifact", artifact(ctx, TRAINVAL_ARTIFACT, VersionSpec::Latest))
                        .with("val_size", cfg.modeling.val_size)
                        .with("random_seed", cfg.modeling.random_seed)
                        .with("stratify_by", cfg.modeling.stratify_column().unwrap_or("none"))
                        .with("rf_config", rf_config.display().to_string())
                        .with("max_tfidf_features", cfg.modeling.max_tfidf_features)
                        .with("output_artifact", MODEL_EXPORT_ARTIFACT))
}

fn test_params(_cfg: &PipelineConfig, ctx: &RunContext) -> Result<StepParams, PipelineError> {
    Ok(StepParams::new().with("mlflow_model",
                              artifact(ctx, MODEL_EXPORT_ARTIFACT, VersionSpec::Alias(PROD_ALIAS.to_string())))
                        .with("test_dataset", artifact(ctx, TEST_DATA_ARTIFACT, VersionSpec::Latest)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::sample_config;

    fn keys(p: &StepParams) -> Vec<&str> {
        p.keys().collect()
    }

    #[test]
    fn table_is_indexed_by_step_id() {
        for id in StepId::ALL {
            assert_eq!(spec(id).id, id);
        }
    }

    #[test]
    fn full_pipeline_is_self_consistent() {
        assert!(check_wiring(&StepId::ALL).is_empty());
    }

    #[test]
    fn partial_selection_reports_missing_upstream() {
        let gaps = check_wiring(&[StepId::DataSplit, StepId::TrainRandomForest]);
        assert_eq!(gaps, vec![WiringGap { step: StepId::DataSplit,
                                          artifact: CLEAN_DATA_ARTIFACT }]);
    }

    #[test]
    fn cleaning_params_reference_download_output() {
        let ctx = RunContext::new("nyc_airbnb", "dev", "/srv/rf");
        let p = (spec(StepId::BasicCleaning).build_params)(&sample_config(), &ctx).unwrap();
        assert_eq!(keys(&p),
                   vec!["input_artifact", "last_review_policy", "max_price", "min_price", "output_artifact",
                        "output_description", "output_type"]);
        assert_eq!(p.text("input_artifact").unwrap(), "nyc_airbnb/sample.csv:latest");
        assert_eq!(p.f64("min_price").unwrap(), 10.0);
        assert_eq!(p.f64("max_price").unwrap(), 350.0);
    }

    #[test]
    fn data_check_and_split_params() {
        let ctx = RunContext::new("nyc_airbnb", "dev", "/srv/rf");
        let cfg = sample_config();
        let p = (spec(StepId::DataCheck).build_params)(&cfg, &ctx).unwrap();
        assert_eq!(keys(&p), vec!["csv", "kl_threshold", "max_price", "min_price", "ref"]);
        assert_eq!(p.text("ref").unwrap(), "nyc_airbnb/clean_data.csv:reference");
        let p = (spec(StepId::DataSplit).build_params)(&cfg, &ctx).unwrap();
        assert_eq!(keys(&p), vec!["input", "random_seed", "stratify", "test_size"]);
        assert_eq!(p.text("stratify").unwrap(), "neighbourhood_group");
        let p = (spec(StepId::Download).build_params)(&cfg, &ctx).unwrap();
        assert!(p.text("sample").unwrap().ends_with("sample1.csv"));
    }

    #[test]
    fn train_params_write_hyperparameters_to_work_dir() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RunContext::new("nyc_airbnb", "dev", "/srv/rf").with_work_dir(dir.path());
        let cfg = sample_config();
        let p = (spec(StepId::TrainRandomForest).build_params)(&cfg, &ctx).unwrap();
        let path = p.text("rf_config").unwrap();
        let written: Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(written, Value::Object(cfg.modeling.random_forest.clone()));
        assert_eq!(p.text("output_artifact").unwrap(), MODEL_EXPORT_ARTIFACT);
    }

    #[test]
    fn test_step_reads_promoted_model() {
        let ctx = RunContext::new("nyc_airbnb", "dev", "/srv/rf");
        let p = (spec(StepId::TestRegressionModel).build_params)(&sample_config(), &ctx).unwrap();
        assert_eq!(p.text("mlflow_model").unwrap(), "nyc_airbnb/random_forest_export:prod");
        assert_eq!(p.text("test_dataset").unwrap(), "nyc_airbnb/test_data.csv:latest");
    }
}
