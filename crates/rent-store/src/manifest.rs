//! Manifest por artifact: lista de versiones publicadas con digest,
//! lineage y alias. Se guarda como `manifest.json` junto a las versiones.

use chrono::{DateTime, Utc};
use rent_core::{StoreError, VersionSpec};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub name: String,
    pub artifact_type: String,
    pub versions: Vec<VersionEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionEntry {
    pub version: u32,
    /// sha256 hex del contenido.
    pub digest: String,
    pub description: String,
    pub file_name: String,
    pub created_at: DateTime<Utc>,
    /// Referencias fijadas (`project/name:vN`) a los inputs.
    pub lineage: Vec<String>,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl Manifest {
    pub fn new(name: impl Into<String>, artifact_type: impl Into<String>) -> Self {
        Self { name: name.into(),
               artifact_type: artifact_type.into(),
               versions: Vec::new() }
    }

    pub fn next_version(&self) -> u32 {
        self.versions.iter().map(|v| v.version).max().map_or(0, |m| m + 1)
    }

    /// Resuelve una versión. Exige exactamente un candidato.
    pub fn resolve(&self, spec: &VersionSpec) -> Result<&VersionEntry, StoreError> {
        let candidates: Vec<&VersionEntry> = match spec {
            VersionSpec::Latest => match self.versions.iter().map(|v| v.version).max() {
                Some(max) => self.versions.iter().filter(|v| v.version == max).collect(),
                None => vec![],
            },
            VersionSpec::Number(n) => self.versions.iter().filter(|v| v.version == *n).collect(),
            VersionSpec::Alias(a) => self.versions.iter().filter(|v| v.aliases.iter().any(|x| x == a)).collect(),
        };
        match candidates.as_slice() {
            [one] => Ok(one),
            [] => Err(StoreError::NotFound(format!("{}:{}", self.name, spec))),
            many => Err(StoreError::AmbiguousVersion { reference: format!("{}:{}", self.name, spec),
                                                       candidates: many.len() }),
        }
    }

    /// Mueve `alias` a `version`, quitándolo de cualquier otra.
    pub fn move_alias(&mut self, version: u32, alias: &str) -> Result<&VersionEntry, StoreError> {
        if !self.versions.iter().any(|v| v.version == version) {
            return Err(StoreError::NotFound(format!("{}:v{version}", self.name)));
        }
        for entry in &mut self.versions {
            entry.aliases.retain(|a| a != alias);
            if entry.version == version {
                entry.aliases.push(alias.to_string());
                entry.aliases.sort();
            }
        }
        self.resolve(&VersionSpec::Number(version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(version: u32, aliases: &[&str]) -> VersionEntry {
        VersionEntry { version,
                       digest: format!("d{version}"),
                       description: String::new(),
                       file_name: "clean_data.csv".into(),
                       created_at: Utc::now(),
                       lineage: vec![],
                       metadata: json!({}),
                       aliases: aliases.iter().map(|s| s.to_string()).collect() }
    }

    #[test]
    fn resolves_latest_number_and_alias() {
        let mut m = Manifest::new("clean_data.csv", "clean_data");
        assert_eq!(m.next_version(), 0);
        assert!(matches!(m.resolve(&VersionSpec::Latest), Err(StoreError::NotFound(_))));
        m.versions = vec![entry(0, &["reference"]), entry(1, &[])];
        assert_eq!(m.next_version(), 2);
        assert_eq!(m.resolve(&VersionSpec::Latest).unwrap().version, 1);
        assert_eq!(m.resolve(&VersionSpec::Number(0)).unwrap().version, 0);
        assert_eq!(m.resolve(&VersionSpec::reference()).unwrap().version, 0);
        assert!(matches!(m.resolve(&VersionSpec::Alias("prod".into())), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn duplicated_alias_is_ambiguous() {
        let mut m = Manifest::new("clean_data.csv", "clean_data");
        m.versions = vec![entry(0, &["reference"]), entry(1, &["reference"])];
        let err = m.resolve(&VersionSpec::reference()).unwrap_err();
        assert!(matches!(err, StoreError::AmbiguousVersion { candidates: 2, .. }));
        m.versions.push(entry(1, &[]));
        assert!(matches!(m.resolve(&VersionSpec::Latest), Err(StoreError::AmbiguousVersion { .. })));
    }

    #[test]
    fn move_alias_is_exclusive() {
        let mut m = Manifest::new("random_forest_export", "model_export");
        m.versions = vec![entry(0, &["prod"]), entry(1, &[])];
        m.move_alias(1, "prod").unwrap();
        assert!(m.versions[0].aliases.is_empty());
        assert_eq!(m.resolve(&VersionSpec::Alias("prod".into())).unwrap().version, 1);
        assert!(matches!(m.move_alias(7, "prod"), Err(StoreError::NotFound(_))));
    }
}
