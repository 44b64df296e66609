//! Verificaciones del dato limpio contra expectativas fijas y contra la
//! versión `reference`.
//!
//! Todas las comprobaciones se evalúan; el step falla listando las que no
//! pasan.

use std::collections::BTreeMap;

use log::info;
use rent_core::{ArtifactStore, StepParams};
use serde_json::{json, Value};

use crate::cleaning::PRICE_COLUMN;
use crate::dataset::{Cell, Dataset};
use crate::error::StepError;
use crate::session::StepSession;

pub const EXPECTED_COLUMNS: &[&str] = &["id",
                                        "name",
                                        "host_id",
                                        "host_name",
                                        "neighbourhood_group",
                                        "neighbourhood",
                                        "latitude",
                                        "longitude",
                                        "room_type",
                                        "price",
                                        "minimum_nights",
                                        "number_of_reviews",
                                        "last_review",
                                        "reviews_per_month",
                                        "calculated_host_listings_count",
                                        "availability_365"];

pub const KNOWN_NEIGHBOURHOOD_GROUPS: &[&str] = &["Bronx", "Brooklyn", "Manhattan", "Queens", "Staten Island"];

const LATITUDE_RANGE: (f64, f64) = (40.5, 41.2);
const LONGITUDE_RANGE: (f64, f64) = (-74.25, -73.50);

pub fn run<S: ArtifactStore + ?Sized>(params: &StepParams, session: &mut StepSession<'_, S>) -> Result<Value, StepError> {
    let kl_threshold = params.f64("kl_threshold")?;
    let min_price = params.f64("min_price")?;
    let max_price = params.f64("max_price")?;
    let sample = Dataset::read_csv(&session.use_artifact(&params.artifact("csv")?)?.path)?;
    let reference = Dataset::read_csv(&session.use_artifact(&params.artifact("ref")?)?.path)?;

    let mut failures = Vec::new();
    check_columns(&sample, &mut failures);
    if sample.is_empty() {
        failures.push("dataset has no rows".to_string());
    }
    check_neighbourhoods(&sample, &mut failures);
    check_boundaries(&sample, &mut failures);
    check_price_range(&sample, min_price, max_price, &mut failures);
    let kl = neighbourhood_kl(&sample, &reference);
    match kl {
        Some(d) if d < kl_threshold => {}
        Some(d) => failures.push(format!("neighbourhood_group KL divergence {d:.4} >= {kl_threshold}")),
        None => failures.push("neighbourhood_group distribution unavailable".to_string()),
    }

    if !failures.is_empty() {
        return Err(StepError::Checks(failures));
    }
    info!("all data checks passed on {} rows", sample.len());
    Ok(json!({"rows": sample.len(), "kl_divergence": kl}))
}

fn check_columns(ds: &Dataset, failures: &mut Vec<String>) {
    let actual: Vec<&str> = ds.columns().collect();
    if actual != EXPECTED_COLUMNS {
        failures.push(format!("unexpected column set: {}", actual.join(",")));
    }
}

fn check_neighbourhoods(ds: &Dataset, failures: &mut Vec<String>) {
    let Ok(cells) = ds.column("neighbourhood_group") else { return };
    let mut unknown: Vec<String> = cells.iter()
                                        .map(|c| c.render())
                                        .filter(|v| !KNOWN_NEIGHBOURHOOD_GROUPS.contains(&v.as_str()))
                                        .collect();
    unknown.sort();
    unknown.dedup();
    if !unknown.is_empty() {
        failures.push(format!("unknown neighbourhood_group values: {}", unknown.join(",")));
    }
}

fn check_boundaries(ds: &Dataset, failures: &mut Vec<String>) {
    for (column, (lo, hi)) in [("latitude", LATITUDE_RANGE), ("longitude", LONGITUDE_RANGE)] {
        let Ok(cells) = ds.column(column) else { continue };
        let outside = cells.iter()
                           .filter(|c| !matches!(c.as_f64(), Some(v) if lo <= v && v <= hi))
                           .count();
        if outside > 0 {
            failures.push(format!("{outside} rows with {column} outside [{lo}, {hi}]"));
        }
    }
}

fn check_price_range(ds: &Dataset, min: f64, max: f64, failures: &mut Vec<String>) {
    let Ok(cells) = ds.column(PRICE_COLUMN) else { return };
    let outside = cells.iter()
                       .filter(|c| !matches!(c.as_f64(), Some(v) if min <= v && v <= max))
                       .count();
    if outside > 0 {
        failures.push(format!("{outside} rows with price outside [{min}, {max}]"));
    }
}

fn distribution(ds: &Dataset) -> Option<BTreeMap<String, f64>> {
    let cells = ds.column("neighbourhood_group").ok()?;
    let present: Vec<&Cell> = cells.into_iter().filter(|c| !c.is_null()).collect();
    if present.is_empty() {
        return None;
    }
    let mut counts: BTreeMap<String, f64> = BTreeMap::new();
    for c in &present {
        *counts.entry(c.render()).or_default() += 1.0;
    }
    let total = present.len() as f64;
    counts.values_mut().for_each(|v| *v /= total);
    Some(counts)
}

/// KL(sample ‖ reference) en base 2 sobre `neighbourhood_group`. Infinita si
/// la muestra tiene una categoría ausente en la referencia.
pub fn neighbourhood_kl(sample: &Dataset, reference: &Dataset) -> Option<f64> {
    let p = distribution(sample)?;
    let q = distribution(reference)?;
    Some(p.iter()
          .map(|(k, &pk)| match q.get(k) {
              Some(&qk) if qk > 0.0 => pk * (pk / qk).log2(),
              _ => f64::INFINITY,
          })
          .sum())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ds(groups: &[&str]) -> Dataset {
        let mut csv = String::from("neighbourhood_group\n");
        for g in groups {
            csv.push_str(g);
            csv.push('\n');
        }
        Dataset::from_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn identical_distributions_have_zero_divergence() {
        let a = ds(&["Bronx", "Manhattan", "Manhattan"]);
        let b = ds(&["Manhattan", "Bronx", "Manhattan", "Manhattan", "Bronx", "Manhattan"]);
        assert!(neighbourhood_kl(&a, &b).unwrap().abs() < 1e-12);
    }

    #[test]
    fn unseen_category_is_infinite() {
        let a = ds(&["Queens"]);
        let b = ds(&["Bronx"]);
        assert!(neighbourhood_kl(&a, &b).unwrap().is_infinite());
    }

    #[test]
    fn known_divergence() {
        let a = ds(&["Bronx", "Manhattan"]);
        let b = ds(&["Bronx", "Manhattan", "Manhattan", "Manhattan"]);
        // 0.5*log2(0.5/0.25) + 0.5*log2(0.5/0.75)
        let expected = 0.5 + 0.5 * (2.0f64 / 3.0).log2();
        assert!((neighbourhood_kl(&a, &b).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn range_checks_count_offending_rows() {
        let d = Dataset::from_reader("latitude,longitude,price\n40.7,-73.9,50\n10,-73.9,5000\n".as_bytes()).unwrap();
        let mut failures = Vec::new();
        check_boundaries(&d, &mut failures);
        check_price_range(&d, 10.0, 350.0, &mut failures);
        assert_eq!(failures,
                   vec!["1 rows with latitude outside [40.5, 41.2]".to_string(),
                        "1 rows with price outside [10, 350]".to_string()]);
    }
}
