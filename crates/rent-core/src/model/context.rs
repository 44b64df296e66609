use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ArtifactRef;
use crate::constants::{ENV_PROJECT, ENV_ROOT_DIR, ENV_RUN_GROUP, ENV_RUN_ID, ENV_WORK_DIR};
use crate::errors::ConfigError;

/// Contexto explícito de un run, entregado a cada invocación de step.
///
/// Sustituye a las variables de entorno globales: el proyecto y el grupo del
/// experimento viajan como datos. Sólo el executor de procesos los traduce a
/// variables de entorno, y únicamente en el entorno del proceso hijo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunContext {
    pub project: String,
    pub group: String,
    pub run_id: Uuid,
    /// Raíz del proyecto (rutas relativas de configuración se resuelven aquí).
    pub root_dir: PathBuf,
    /// Directorio de trabajo temporal del run.
    pub work_dir: PathBuf,
}

impl RunContext {
    pub fn new(project: impl Into<String>, group: impl Into<String>, root_dir: impl Into<PathBuf>) -> Self {
        let root_dir = root_dir.into();
        Self { project: project.into(),
               group: group.into(),
               run_id: Uuid::new_v4(),
               work_dir: root_dir.clone(),
               root_dir }
    }

    pub fn with_work_dir(&self, dir: &Path) -> Self {
        Self { work_dir: dir.to_path_buf(),
               ..self.clone() }
    }

    /// Califica una referencia sin proyecto con el proyecto del run.
    pub fn qualify(&self, reference: &ArtifactRef) -> ArtifactRef {
        reference.or_project(&self.project)
    }

    /// Variables de entorno para un proceso hijo.
    pub fn to_env(&self) -> Vec<(&'static str, String)> {
        vec![(ENV_PROJECT, self.project.clone()),
             (ENV_RUN_GROUP, self.group.clone()),
             (ENV_RUN_ID, self.run_id.to_string()),
             (ENV_ROOT_DIR, self.root_dir.display().to_string()),
             (ENV_WORK_DIR, self.work_dir.display().to_string())]
    }

    /// Reconstruye el contexto desde un mapping clave/valor (inverso de `to_env`).
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
        where F: Fn(&str) -> Option<String>
    {
        let get = |k: &str| lookup(k).filter(|v| !v.is_empty()).ok_or_else(|| ConfigError::Missing(k.to_string()));
        let run_id = get(ENV_RUN_ID)?;
        let run_id = Uuid::parse_str(&run_id).map_err(|e| ConfigError::Invalid { key: ENV_RUN_ID.to_string(),
                                                                                 reason: e.to_string() })?;
        Ok(Self { project: get(ENV_PROJECT)?,
                  group: get(ENV_RUN_GROUP)?,
                  run_id,
                  root_dir: PathBuf::from(get(ENV_ROOT_DIR)?),
                  work_dir: PathBuf::from(get(ENV_WORK_DIR)?) })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|k| std::env::var(k).ok())
    }
}
