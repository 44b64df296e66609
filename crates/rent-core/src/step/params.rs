//! Mapping de parámetros de un step.
//!
//! Se construye justo antes de cada invocación y no se persiste. Las claves
//! se guardan ordenadas para que el fingerprint y la línea de comandos de un
//! step en proceso hijo sean deterministas.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ParamError;
use crate::hashing::{hash_file, hash_value};
use crate::model::ArtifactRef;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepParams(BTreeMap<String, Value>);

impl StepParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn require(&self, key: &str) -> Result<&Value, ParamError> {
        self.0.get(key).ok_or_else(|| ParamError::Missing(key.to_string()))
    }

    /// Valor como texto; los escalares no-string se formatean.
    pub fn text(&self, key: &str) -> Result<String, ParamError> {
        match self.require(key)? {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            _ => Err(invalid(key, "expected a scalar")),
        }
    }

    pub fn f64(&self, key: &str) -> Result<f64, ParamError> {
        let v = match self.require(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        v.ok_or_else(|| invalid(key, "expected a number"))
    }

    pub fn u64(&self, key: &str) -> Result<u64, ParamError> {
        let v = match self.require(key)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        v.ok_or_else(|| invalid(key, "expected a non-negative integer"))
    }

    pub fn artifact(&self, key: &str) -> Result<ArtifactRef, ParamError> {
        let raw = self.text(key)?;
        raw.parse().map_err(|_| invalid(key, &format!("`{raw}` is not `[project/]name:version`")))
    }

    /// Columna opcional: `none` o vacío significan sin columna.
    pub fn optional_column(&self, key: &str) -> Result<Option<String>, ParamError> {
        let raw = self.text(key)?;
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("none") {
            Ok(None)
        } else {
            Ok(Some(raw.to_string()))
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(&self.0).unwrap_or(Value::Null)
    }

    /// Hash canónico de los parámetros.
    pub fn fingerprint(&self) -> String {
        hash_value(&self.to_json())
    }

    /// Fingerprint en el que los ficheros dentro de `work_dir` cuentan por su
    /// contenido. La ruta del scratch dir cambia en cada run; lo que el step
    /// lee de ella no.
    pub fn fingerprint_in(&self, work_dir: &Path) -> String {
        let mut resolved = self.0.clone();
        for value in resolved.values_mut() {
            let Value::String(raw) = value else { continue };
            let path = Path::new(raw.as_str());
            if !path.starts_with(work_dir) {
                continue;
            }
            if let Ok(digest) = hash_file(path) {
                *value = Value::String(format!("blake3:{digest}"));
            }
        }
        hash_value(&serde_json::to_value(&resolved).unwrap_or(Value::Null))
    }

    /// Forma `--clave valor` para la línea de comandos de un proceso hijo.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.0.len() * 2);
        for (k, v) in &self.0 {
            args.push(format!("--{k}"));
            args.push(match v {
                          Value::String(s) => s.clone(),
                          other => other.to_string(),
                      });
        }
        args
    }

    /// Inverso de `to_args`: acepta `--clave valor` y `--clave=valor`. Los
    /// valores numéricos y booleanos recuperan su tipo.
    pub fn from_args<I, S>(args: I) -> Result<Self, ParamError>
        where I: IntoIterator<Item = S>,
              S: AsRef<str>
    {
        let mut out = StepParams::new();
        let mut iter = args.into_iter();
        while let Some(arg) = iter.next() {
            let arg = arg.as_ref();
            let key = arg.strip_prefix("--")
                         .filter(|k| !k.is_empty())
                         .ok_or_else(|| invalid(arg, "expected `--name value`"))?;
            let (key, raw) = match key.split_once('=') {
                Some((k, v)) => (k.to_string(), v.to_string()),
                None => {
                    let v = iter.next().ok_or_else(|| ParamError::Missing(key.to_string()))?;
                    (key.to_string(), v.as_ref().to_string())
                }
            };
            out.insert(&key, scalar_from_str(&raw));
        }
        Ok(out)
    }
}

fn scalar_from_str(raw: &str) -> Value {
    if let Ok(n) = raw.parse::<u64>() {
        return Value::from(n);
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Value::from(n);
    }
    if let Some(n) = raw.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
        return Value::Number(n);
    }
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}

fn invalid(name: &str, reason: &str) -> ParamError {
    ParamError::Invalid { name: name.to_string(),
                          reason: reason.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_roundtrip_keeps_types() {
        let p = StepParams::new().with("input_artifact", "nyc_airbnb/sample.csv:latest")
                                 .with("min_price", 10.0)
                                 .with("random_seed", 42u64)
                                 .with("stratify", "none");
        let back = StepParams::from_args(p.to_args()).unwrap();
        assert_eq!(back.text("input_artifact").unwrap(), "nyc_airbnb/sample.csv:latest");
        assert_eq!(back.f64("min_price").unwrap(), 10.0);
        assert_eq!(back.u64("random_seed").unwrap(), 42);
        assert_eq!(back.optional_column("stratify").unwrap(), None);
        assert_eq!(back.fingerprint(), StepParams::from_args(p.to_args()).unwrap().fingerprint());
    }

    #[test]
    fn from_args_accepts_equals_form_and_rejects_positional() {
        let p = StepParams::from_args(["--max_price=350", "--output_type", "clean_data"]).unwrap();
        assert_eq!(p.f64("max_price").unwrap(), 350.0);
        assert_eq!(p.text("output_type").unwrap(), "clean_data");
        assert!(StepParams::from_args(["max_price"]).is_err());
        assert_eq!(StepParams::from_args(["--max_price"]).unwrap_err(), ParamError::Missing("max_price".into()));
    }

    #[test]
    fn typed_getters_report_missing_and_invalid() {
        let p = StepParams::new().with("csv", "not a ref").with("kl_threshold", "abc");
        assert_eq!(p.f64("min_price").unwrap_err(), ParamError::Missing("min_price".into()));
        assert!(matches!(p.f64("kl_threshold"), Err(ParamError::Invalid { .. })));
        assert!(matches!(p.artifact("csv"), Err(ParamError::Invalid { .. })));
    }

    #[test]
    fn fingerprint_ignores_insertion_order() {
        let a = StepParams::new().with("a", 1).with("b", "x");
        let b = StepParams::new().with("b", "x").with("a", 1);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn scratch_files_count_by_content() {
        let run_a = tempfile::tempdir().unwrap();
        let run_b = tempfile::tempdir().unwrap();
        for dir in [run_a.path(), run_b.path()] {
            std::fs::write(dir.join("rf_config.json"), r#"{"n_estimators":100}"#).unwrap();
        }
        let params = |dir: &Path| {
            StepParams::new().with("rf_config", dir.join("rf_config.json").display().to_string())
                             .with("val_size", 0.2)
        };
        let a = params(run_a.path());
        let b = params(run_b.path());
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint_in(run_a.path()), b.fingerprint_in(run_b.path()));

        std::fs::write(run_b.path().join("rf_config.json"), r#"{"n_estimators":200}"#).unwrap();
        assert_ne!(a.fingerprint_in(run_a.path()), b.fingerprint_in(run_b.path()));
    }
}
