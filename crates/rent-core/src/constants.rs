//! Constantes del orquestador.
//!
//! Agrupa valores estáticos que participan en el cálculo de fingerprints y
//! los nombres convencionales con los que los steps se encadenan a través
//! del artifact store.

/// Versión lógica del orquestador. Entra en el fingerprint de cada run, de
/// modo que un cambio incompatible del cableado de parámetros produce
/// fingerprints distintos aunque la configuración no cambie.
pub const ENGINE_VERSION: &str = "R1.0";

/// Artifact publicado por `download`.
pub const RAW_SAMPLE_ARTIFACT: &str = "sample.csv";
/// Artifact publicado por `basic_cleaning`.
pub const CLEAN_DATA_ARTIFACT: &str = "clean_data.csv";
/// Artifacts publicados por `data_split`.
pub const TRAINVAL_ARTIFACT: &str = "trainval_data.csv";
pub const TEST_DATA_ARTIFACT: &str = "test_data.csv";
/// Export del modelo publicado por `train_random_forest`.
pub const MODEL_EXPORT_ARTIFACT: &str = "random_forest_export";

/// Alias de la versión base usada por `data_check` para comparar distribuciones.
pub const REFERENCE_ALIAS: &str = "reference";
/// Alias que habilita `test_regression_model`; se asigna fuera del pipeline.
pub const PROD_ALIAS: &str = "prod";

// Variables de entorno con las que un step en proceso hijo recibe su RunContext.
pub const ENV_PROJECT: &str = "RENTFLOW_PROJECT";
pub const ENV_RUN_GROUP: &str = "RENTFLOW_RUN_GROUP";
pub const ENV_RUN_ID: &str = "RENTFLOW_RUN_ID";
pub const ENV_ROOT_DIR: &str = "RENTFLOW_ROOT_DIR";
pub const ENV_WORK_DIR: &str = "RENTFLOW_WORK_DIR";
