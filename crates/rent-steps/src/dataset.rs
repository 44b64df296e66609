//! Tabla en memoria leída de / escrita a CSV.
//!
//! Las celdas se conservan como texto salvo las columnas que un step
//! convierte explícitamente (timestamps). Vacío se lee como `Null`.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use chrono::NaiveDateTime;
use indexmap::IndexSet;
use thiserror::Error;

/// Formato canónico de timestamps al serializar.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("malformed csv")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("missing column `{0}`")]
    MissingColumn(String),
    #[error("duplicated column `{0}`")]
    DuplicateColumn(String),
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow { row: usize, found: usize, expected: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Text(String),
    Timestamp(NaiveDateTime),
}

impl Cell {
    pub fn from_field(raw: &str) -> Self {
        if raw.is_empty() {
            Cell::Null
        } else {
            Cell::Text(raw.to_string())
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Valor numérico finito, si la celda es texto parseable.
    pub fn as_f64(&self) -> Option<f64> {
        self.as_text().and_then(|s| s.trim().parse::<f64>().ok()).filter(|v| v.is_finite())
    }

    pub fn render(&self) -> String {
        match self {
            Cell::Null => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Timestamp(ts) => ts.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: IndexSet<String>,
    rows: Vec<Vec<Cell>>,
}

impl Dataset {
    pub fn new<I, S>(columns: I) -> Result<Self, DatasetError>
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        let mut set = IndexSet::new();
        for c in columns {
            let c = c.into();
            if !set.insert(c.clone()) {
                return Err(DatasetError::DuplicateColumn(c));
            }
        }
        Ok(Self { columns: set,
                  rows: Vec::new() })
    }

    /// Dataset vacío con las mismas columnas.
    pub fn empty_like(&self) -> Self {
        Self { columns: self.columns.clone(),
               rows: Vec::new() }
    }

    /// Mismas columnas con otras filas (de igual anchura).
    pub(crate) fn with_rows(&self, rows: Vec<Vec<Cell>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == self.columns.len()));
        Self { columns: self.columns.clone(),
               rows }
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains(name)
    }

    pub fn column_index(&self, name: &str) -> Result<usize, DatasetError> {
        self.columns.get_index_of(name).ok_or_else(|| DatasetError::MissingColumn(name.to_string()))
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<(), DatasetError> {
        if row.len() != self.columns.len() {
            return Err(DatasetError::RaggedRow { row: self.rows.len(),
                                                 found: row.len(),
                                                 expected: self.columns.len() });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Celdas de una columna, en orden de filas.
    pub fn column(&self, name: &str) -> Result<Vec<&Cell>, DatasetError> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Subconjunto de filas en el orden de `indices`.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self { columns: self.columns.clone(),
               rows: indices.iter().filter_map(|&i| self.rows.get(i).cloned()).collect() }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers = rdr.headers()?.clone();
        let mut ds = Self::new(headers.iter())?;
        for record in rdr.records() {
            let record = record?;
            ds.push_row(record.iter().map(Cell::from_field).collect())?;
        }
        Ok(ds)
    }

    pub fn read_csv(path: &Path) -> Result<Self, DatasetError> {
        Self::from_reader(File::open(path)?)
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), DatasetError> {
        let mut wtr = csv::WriterBuilder::new().has_headers(true).from_writer(writer);
        wtr.write_record(self.columns.iter())?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(Cell::render))?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn write_csv(&self, path: &Path) -> Result<(), DatasetError> {
        self.to_writer(File::create(path)?)
    }

    pub fn to_csv_bytes(&self) -> Result<Vec<u8>, DatasetError> {
        let mut buf = Vec::new();
        self.to_writer(&mut buf)?;
        Ok(buf)
    }
}
