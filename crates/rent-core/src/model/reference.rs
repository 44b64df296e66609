//! Referencias a artifacts: `[<project>/]<name>:<version>`.
//!
//! `<version>` puede ser `latest` (la versión más reciente), `vN` (versión
//! explícita) o cualquier otro alias movible (`reference`, `prod`, ...).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::REFERENCE_ALIAS;
use crate::errors::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VersionSpec {
    Latest,
    Number(u32),
    Alias(String),
}

impl VersionSpec {
    pub fn reference() -> Self {
        VersionSpec::Alias(REFERENCE_ALIAS.to_string())
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSpec::Latest => f.write_str("latest"),
            VersionSpec::Number(n) => write!(f, "v{n}"),
            VersionSpec::Alias(a) => f.write_str(a),
        }
    }
}

impl FromStr for VersionSpec {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "latest" {
            return Ok(VersionSpec::Latest);
        }
        if let Some(n) = s.strip_prefix('v').and_then(|d| d.parse::<u32>().ok()) {
            return Ok(VersionSpec::Number(n));
        }
        if is_valid_segment(s) {
            Ok(VersionSpec::Alias(s.to_string()))
        } else {
            Err(StoreError::InvalidReference(s.to_string()))
        }
    }
}

/// Referencia (no resuelta) a un artifact del store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub project: Option<String>,
    pub name: String,
    pub version: VersionSpec,
}

impl ArtifactRef {
    pub fn new(name: impl Into<String>, version: VersionSpec) -> Self {
        Self { project: None,
               name: name.into(),
               version }
    }

    pub fn latest(name: impl Into<String>) -> Self {
        Self::new(name, VersionSpec::Latest)
    }

    pub fn in_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Completa el proyecto sólo si la referencia no trae uno propio.
    pub fn or_project(&self, project: &str) -> Self {
        let mut out = self.clone();
        if out.project.is_none() {
            out.project = Some(project.to_string());
        }
        out
    }

    /// `project/name` sin versión; clave de identidad del artifact.
    pub fn qualified_name(&self) -> String {
        match &self.project {
            Some(p) => format!("{p}/{}", self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.qualified_name(), self.version)
    }
}

impl FromStr for ArtifactRef {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StoreError::InvalidReference(s.to_string());
        let (path, version) = s.rsplit_once(':').ok_or_else(invalid)?;
        let version: VersionSpec = version.parse().map_err(|_| invalid())?;
        let (project, name) = match path.split_once('/') {
            Some((p, n)) => (Some(p.to_string()), n),
            None => (None, path),
        };
        if !is_valid_segment(name) || project.as_deref().is_some_and(|p| !is_valid_segment(p)) {
            return Err(invalid());
        }
        Ok(Self { project,
                  name: name.to_string(),
                  version })
    }
}

/// Segmentos válidos: no vacíos, sin separadores de ruta ni `..`.
pub fn is_valid_segment(s: &str) -> bool {
    !s.is_empty()
    && s != "."
    && s != ".."
    && s.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
