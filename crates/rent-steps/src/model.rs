//! Modelo de referencia de precios: media por grupo categórico.
//!
//! Se ajusta sobre las columnas `neighbourhood_group` y `room_type`; los
//! grupos con menos de `min_samples_leaf` filas caen a la media global. Los
//! hiperparámetros del bosque viajan tal cual dentro del export.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cleaning::PRICE_COLUMN;
use crate::dataset::{Cell, Dataset};
use crate::error::StepError;

pub const FEATURE_COLUMNS: &[&str] = &["neighbourhood_group", "room_type"];
const MODEL_KIND: &str = "group_mean";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceModel {
    pub kind: String,
    pub features: Vec<String>,
    pub means: BTreeMap<String, f64>,
    pub global_mean: f64,
    pub hyperparameters: Value,
    pub max_tfidf_features: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub mae: f64,
    pub r2: f64,
    pub rows: usize,
}

impl PriceModel {
    pub fn fit(data: &Dataset, hyperparameters: Value, max_tfidf_features: u64) -> Result<Self, StepError> {
        let min_leaf = hyperparameters.get("min_samples_leaf").and_then(Value::as_u64).unwrap_or(1).max(1) as usize;
        let keys = group_keys(data)?;
        let prices = prices(data)?;

        let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
        let (mut total, mut count) = (0.0, 0usize);
        for (key, price) in keys.into_iter().zip(prices) {
            let Some(p) = price else { continue };
            let e = sums.entry(key).or_insert((0.0, 0));
            e.0 += p;
            e.1 += 1;
            total += p;
            count += 1;
        }
        if count == 0 {
            return Err(StepError::Model("no rows with a usable price to fit".into()));
        }
        let means = sums.into_iter()
                        .filter(|(_, (_, n))| *n >= min_leaf)
                        .map(|(k, (s, n))| (k, s / n as f64))
                        .collect();
        Ok(Self { kind: MODEL_KIND.to_string(),
                  features: FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect(),
                  means,
                  global_mean: total / count as f64,
                  hyperparameters,
                  max_tfidf_features })
    }

    pub fn predict(&self, data: &Dataset) -> Result<Vec<f64>, StepError> {
        Ok(group_keys(data)?.into_iter()
                            .map(|k| self.means.get(&k).copied().unwrap_or(self.global_mean))
                            .collect())
    }

    /// Predice y compara contra la columna `price` (filas sin precio se ignoran).
    pub fn evaluate(&self, data: &Dataset) -> Result<Metrics, StepError> {
        let predicted = self.predict(data)?;
        let pairs: Vec<(f64, f64)> = prices(data)?.into_iter()
                                                  .zip(predicted)
                                                  .filter_map(|(t, p)| t.map(|t| (t, p)))
                                                  .collect();
        Ok(metrics(&pairs))
    }

    pub fn save(&self, path: &Path) -> Result<(), StepError> {
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, StepError> {
        let model: Self = serde_json::from_slice(&fs::read(path)?)?;
        if model.kind != MODEL_KIND {
            return Err(StepError::Model(format!("unsupported model kind `{}`", model.kind)));
        }
        Ok(model)
    }
}

fn group_keys(data: &Dataset) -> Result<Vec<String>, StepError> {
    let idx = FEATURE_COLUMNS.iter().map(|c| data.column_index(c)).collect::<Result<Vec<_>, _>>()?;
    Ok(data.rows()
           .iter()
           .map(|r| idx.iter().map(|&i| r[i].render()).collect::<Vec<_>>().join("|"))
           .collect())
}

fn prices(data: &Dataset) -> Result<Vec<Option<f64>>, StepError> {
    Ok(data.column(PRICE_COLUMN)?.into_iter().map(Cell::as_f64).collect())
}

/// MAE y R² sobre pares (real, predicho). R² es 0 si la varianza real es 0.
pub fn metrics(pairs: &[(f64, f64)]) -> Metrics {
    if pairs.is_empty() {
        return Metrics { mae: 0.0,
                         r2: 0.0,
                         rows: 0 };
    }
    let n = pairs.len() as f64;
    let mean = pairs.iter().map(|(t, _)| t).sum::<f64>() / n;
    let mae = pairs.iter().map(|(t, p)| (t - p).abs()).sum::<f64>() / n;
    let ss_res: f64 = pairs.iter().map(|(t, p)| (t - p).powi(2)).sum();
    let ss_tot: f64 = pairs.iter().map(|(t, _)| (t - mean).powi(2)).sum();
    let r2 = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };
    Metrics { mae,
              r2,
              rows: pairs.len() }
}
