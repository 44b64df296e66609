//! Limpieza básica: descarga el dato crudo, filtra precios atípicos,
//! normaliza `last_review` y publica el resultado.

use log::{info, warn};
use rent_core::{ArtifactStore, DatePolicy, ParamError, StepParams};
use serde_json::{json, Value};

use crate::cleaning::CleaningRule;
use crate::dataset::Dataset;
use crate::error::StepError;
use crate::session::StepSession;

pub fn run<S: ArtifactStore + ?Sized>(params: &StepParams, session: &mut StepSession<'_, S>) -> Result<Value, StepError> {
    // El rango se valida antes de tocar el store.
    let rule = CleaningRule::new(params.f64("min_price")?, params.f64("max_price")?, date_policy(params)?)?;
    let input = params.artifact("input_artifact")?;
    let output = params.text("output_artifact")?;
    let output_type = params.text("output_type")?;
    let description = params.text("output_description")?;

    let fetched = session.use_artifact(&input)?;
    let raw = Dataset::read_csv(&fetched.path)?;
    info!("cleaning {} rows with price in [{}, {}]", raw.len(), rule.min_price, rule.max_price);
    let (clean, report) = rule.apply(&raw)?;
    if !report.flagged.is_empty() {
        warn!("{} rows had an unparseable last_review", report.flagged.len());
    }

    let local = session.scratch_path(&output);
    clean.write_csv(&local)?;
    let report = serde_json::to_value(&report)?;
    let handle = session.log_artifact(&output, &output_type, &description, &local, report.clone())?;
    Ok(json!({"artifact": handle.pinned().to_string(), "report": report}))
}

/// Parámetro opcional; sin él se aplica `flag`.
fn date_policy(params: &StepParams) -> Result<DatePolicy, StepError> {
    match params.get("last_review_policy") {
        None => Ok(DatePolicy::default()),
        Some(_) => {
            let raw = params.text("last_review_policy")?;
            raw.parse().map_err(|_| {
                            StepError::Params(ParamError::Invalid { name: "last_review_policy".into(),
                                                                    reason: format!("unknown policy `{raw}`") })
                        })
        }
    }
}
