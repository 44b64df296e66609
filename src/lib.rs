//! rentflow
//!
//! Orquestador del pipeline de precios de alquiler de corta estancia:
//! - `config`: carga de `config.yaml` con overrides por línea de comandos.
//! - `app`: arma el executor y el contexto del run a partir de la
//!   configuración y el entorno.
//!
//! El driver, el store y los steps viven en `rent-core`, `rent-store` y
//! `rent-steps`.

pub mod app;
pub mod config;

pub use app::{build_executor, exit_code, run_context, STEP_BIN_NAME};
