//! Transformación de limpieza: filtro de precio + normalización de
//! `last_review`.
//!
//! Función pura sobre `Dataset`; el step que la invoca hace todo el IO.
//! Conserva orden de filas y columnas. Aplicarla dos veces con el mismo rango
//! da el mismo resultado que aplicarla una vez.

use chrono::{NaiveDate, NaiveDateTime};
use log::warn;
use rent_core::DatePolicy;
use serde::Serialize;
use thiserror::Error;

use crate::dataset::{Cell, Dataset};

pub const PRICE_COLUMN: &str = "price";
pub const LAST_REVIEW_COLUMN: &str = "last_review";

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S",
                                    "%Y-%m-%d %H:%M:%S%.f",
                                    "%Y-%m-%dT%H:%M:%S",
                                    "%Y-%m-%dT%H:%M:%S%.f",
                                    "%Y-%m-%d %H:%M"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

#[derive(Debug, Error, PartialEq)]
pub enum CleaningError {
    #[error("invalid price range: min_price {min} > max_price {max}")]
    InvalidRange { min: f64, max: f64 },
    #[error("cannot parse `{value}` in column `{column}` at row {row}")]
    Parse { row: usize, column: String, value: String },
    #[error("missing column `{0}`")]
    MissingColumn(String),
}

/// Celda de `last_review` que no se pudo interpretar (política `Flag`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlaggedCell {
    /// Índice de la fila en la entrada.
    pub row: usize,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleaningReport {
    pub rows_in: usize,
    pub rows_out: usize,
    /// Filas descartadas por precio ausente, no numérico o fuera de rango.
    pub dropped: usize,
    pub flagged: Vec<FlaggedCell>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CleaningRule {
    pub min_price: f64,
    pub max_price: f64,
    pub policy: DatePolicy,
}

impl CleaningRule {
    pub fn new(min_price: f64, max_price: f64, policy: DatePolicy) -> Result<Self, CleaningError> {
        let rule = Self { min_price,
                          max_price,
                          policy };
        rule.check_range()?;
        Ok(rule)
    }

    fn check_range(&self) -> Result<(), CleaningError> {
        if !self.min_price.is_finite() || !self.max_price.is_finite() || self.min_price > self.max_price {
            return Err(CleaningError::InvalidRange { min: self.min_price,
                                                     max: self.max_price });
        }
        Ok(())
    }

    pub fn accepts(&self, price: f64) -> bool {
        self.min_price <= price && price <= self.max_price
    }

    pub fn apply(&self, input: &Dataset) -> Result<(Dataset, CleaningReport), CleaningError> {
        clean(input, self)
    }
}

/// Filtra por precio (bordes inclusivos) y convierte `last_review` al
/// timestamp canónico.
pub fn clean(input: &Dataset, rule: &CleaningRule) -> Result<(Dataset, CleaningReport), CleaningError> {
    rule.check_range()?;
    let mut report = CleaningReport { rows_in: input.len(),
                                      ..Default::default() };
    if input.is_empty() {
        return Ok((input.empty_like(), report));
    }
    let column = |name: &str| input.column_index(name).map_err(|_| CleaningError::MissingColumn(name.to_string()));
    let price_idx = column(PRICE_COLUMN)?;
    let review_idx = column(LAST_REVIEW_COLUMN)?;

    let mut kept = Vec::with_capacity(input.len());
    for (row, cells) in input.rows().iter().enumerate() {
        match cells[price_idx].as_f64() {
            Some(p) if rule.accepts(p) => {}
            _ => {
                report.dropped += 1;
                continue;
            }
        }
        let mut cells = cells.clone();
        cells[review_idx] = match &cells[review_idx] {
            Cell::Text(raw) => match parse_timestamp(raw) {
                Some(ts) => Cell::Timestamp(ts),
                None => match rule.policy {
                    DatePolicy::Reject => {
                        return Err(CleaningError::Parse { row,
                                                          column: LAST_REVIEW_COLUMN.to_string(),
                                                          value: raw.clone() })
                    }
                    DatePolicy::Flag => {
                        warn!("row {row}: unparseable {LAST_REVIEW_COLUMN} `{raw}` set to null");
                        report.flagged.push(FlaggedCell { row,
                                                          value: raw.clone() });
                        Cell::Null
                    }
                },
            },
            other => other.clone(),
        };
        kept.push(cells);
    }
    report.rows_out = kept.len();
    Ok((input.with_rows(kept), report))
}

/// Interpreta fechas y fecha-hora habituales; `None` si no encaja ninguna.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DATETIME_FORMATS.iter()
                    .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
                    .or_else(|| {
                        DATE_FORMATS.iter()
                                    .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
                                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    })
}
