//! Carga de la configuración del pipeline.
//!
//! `config.yaml` (o la ruta en `RENTFLOW_CONFIG`) se lee una vez, se le
//! aplican los overrides `clave.con.puntos=valor` de la línea de comandos y
//! se deserializa a `PipelineConfig`. Un override sólo puede tocar claves
//! existentes, salvo hojas nuevas de `modeling.random_forest`.

use std::fs;
use std::path::{Path, PathBuf};

use rent_core::{ConfigError, PipelineConfig};
use serde_yaml::{Mapping, Value};

pub const ENV_CONFIG: &str = "RENTFLOW_CONFIG";
pub const DEFAULT_CONFIG: &str = "config.yaml";

/// Secciones cuyo contenido es libre.
const OPEN_SECTIONS: &[&str] = &["modeling.random_forest"];

/// Un override `a.b.c=valor` ya interpretado.
#[derive(Debug, Clone, PartialEq)]
pub struct Override {
    pub path: Vec<String>,
    pub value: Value,
}

impl Override {
    pub fn parse(arg: &str) -> Result<Self, ConfigError> {
        let (key, raw) = arg.split_once('=')
                            .ok_or_else(|| ConfigError::Malformed(format!("override `{arg}` is not key=value")))?;
        let path: Vec<String> = key.trim().split('.').map(str::to_string).collect();
        if path.iter().any(|s| s.is_empty()) {
            return Err(ConfigError::Malformed(format!("override `{arg}` has an empty key segment")));
        }
        // Los valores se interpretan como escalares YAML; lo que no parsee
        // queda como texto.
        let value = match serde_yaml::from_str::<Value>(raw) {
            Ok(Value::Mapping(_)) | Ok(Value::Sequence(_)) | Err(_) => Value::String(raw.to_string()),
            Ok(v) => v,
        };
        Ok(Self { path, value })
    }

    fn key(&self) -> String {
        self.path.join(".")
    }

    pub fn apply(&self, doc: &mut Value) -> Result<(), ConfigError> {
        let (leaf, parents) = self.path
                                  .split_last()
                                  .ok_or_else(|| ConfigError::Malformed("empty override".into()))?;
        let mut node = doc;
        for segment in parents {
            node = node.as_mapping_mut()
                       .and_then(|m| m.get_mut(segment.as_str()))
                       .ok_or_else(|| ConfigError::UnknownKey(self.key()))?;
        }
        let open = OPEN_SECTIONS.contains(&parents.join(".").as_str());
        let map: &mut Mapping = node.as_mapping_mut().ok_or_else(|| ConfigError::UnknownKey(self.key()))?;
        if !open && !map.contains_key(leaf.as_str()) {
            return Err(ConfigError::UnknownKey(self.key()));
        }
        map.insert(Value::String(leaf.clone()), self.value.clone());
        Ok(())
    }
}

/// Ruta efectiva: la explícita, luego `RENTFLOW_CONFIG`, luego `config.yaml`.
pub fn config_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit.or_else(|| std::env::var_os(ENV_CONFIG).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG))
}

pub fn load(path: &Path, overrides: &[String]) -> Result<PipelineConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|e| ConfigError::Malformed(format!("{}: {e}", path.display())))?;
    from_yaml(&raw, overrides)
}

pub fn from_yaml(raw: &str, overrides: &[String]) -> Result<PipelineConfig, ConfigError> {
    let mut doc: Value = serde_yaml::from_str(raw).map_err(|e| ConfigError::Malformed(e.to_string()))?;
    for arg in overrides {
        Override::parse(arg)?.apply(&mut doc)?;
    }
    let cfg: PipelineConfig = serde_yaml::from_value(doc).map_err(|e| ConfigError::Malformed(e.to_string()))?;
    cfg.validate()?;
    Ok(cfg)
}
