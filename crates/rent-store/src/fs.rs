//! `ArtifactStore` sobre el sistema de ficheros.
//!
//! Layout: `<root>/<project>/<name>/manifest.json` y
//! `<root>/<project>/<name>/v<N>/<file>`. Las versiones nunca se reescriben;
//! el manifest se reemplaza de forma atómica (escritura a temporal + rename).
//! El payload se copia a `.v<N>.partial` y pasa a `v<N>` tras el digest.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{debug, info, warn};
use rent_core::model::reference::is_valid_segment;
use rent_core::{ArtifactHandle, ArtifactRef, ArtifactStore, FetchedArtifact, PublishRequest, StoreError, VersionSpec};
use sha2::{Digest, Sha256};

use crate::manifest::{Manifest, VersionEntry};

const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_config(cfg: &crate::StoreConfig) -> Self {
        Self::new(cfg.root.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Versiones publicadas de `project/name`, en orden ascendente.
    pub fn versions(&self, project: &str, name: &str) -> Result<Vec<ArtifactHandle>, StoreError> {
        let manifest = match self.load_manifest(project, name)? {
            Some(m) => m,
            None => return Ok(vec![]),
        };
        let mut out: Vec<ArtifactHandle> =
            manifest.versions.iter().map(|e| handle(project, &manifest, e)).collect();
        out.sort_by_key(|h| h.version);
        Ok(out)
    }

    /// Lineage registrado para una versión concreta.
    pub fn lineage(&self, reference: &ArtifactRef) -> Result<Vec<ArtifactRef>, StoreError> {
        let (project, manifest) = self.manifest_for(reference)?;
        let entry = manifest.resolve(&reference.version)?;
        entry.lineage
             .iter()
             .map(|s| s.parse::<ArtifactRef>())
             .collect::<Result<Vec<_>, _>>()
             .map_err(|e| StoreError::Corrupt(format!("{project}/{}: bad lineage entry: {e}", manifest.name)))
    }

    fn artifact_dir(&self, project: &str, name: &str) -> PathBuf {
        self.root.join(project).join(name)
    }

    fn load_manifest(&self, project: &str, name: &str) -> Result<Option<Manifest>, StoreError> {
        let path = self.artifact_dir(project, name).join(MANIFEST_FILE);
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&raw).map(Some)
                                    .map_err(|e| StoreError::Corrupt(format!("{}: {e}", path.display())))
    }

    fn save_manifest(&self, project: &str, manifest: &Manifest) -> Result<(), StoreError> {
        let dir = self.artifact_dir(project, &manifest.name);
        let body = serde_json::to_vec_pretty(manifest).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let tmp = dir.join(format!("{MANIFEST_FILE}.tmp"));
        fs::write(&tmp, body)?;
        fs::rename(&tmp, dir.join(MANIFEST_FILE))?;
        Ok(())
    }

    fn manifest_for(&self, reference: &ArtifactRef) -> Result<(String, Manifest), StoreError> {
        let project = reference.project
                               .clone()
                               .ok_or_else(|| StoreError::InvalidReference(format!("{reference} (missing project)")))?;
        let manifest = self.load_manifest(&project, &reference.name)?
                           .ok_or_else(|| StoreError::NotFound(reference.to_string()))?;
        Ok((project, manifest))
    }
}

fn handle(project: &str, manifest: &Manifest, entry: &VersionEntry) -> ArtifactHandle {
    ArtifactHandle { project: project.to_string(),
                     name: manifest.name.clone(),
                     version: entry.version,
                     artifact_type: manifest.artifact_type.clone(),
                     digest: entry.digest.clone(),
                     aliases: entry.aliases.clone() }
}

fn sha256_file(path: &Path) -> Result<String, StoreError> {
    let mut hasher = Sha256::new();
    hasher.update(fs::read(path)?);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Copia el payload a `staging` y devuelve su digest.
fn stage_payload(source: &Path, staging: &Path, file_name: &str) -> Result<String, StoreError> {
    if staging.exists() {
        fs::remove_dir_all(staging)?;
    }
    fs::create_dir_all(staging)?;
    let target = staging.join(file_name);
    fs::copy(source, &target)?;
    sha256_file(&target)
}

impl ArtifactStore for FsArtifactStore {
    fn fetch(&self, reference: &ArtifactRef) -> Result<FetchedArtifact, StoreError> {
        let (project, manifest) = self.manifest_for(reference)?;
        let entry = manifest.resolve(&reference.version)?;
        let path = self.artifact_dir(&project, &manifest.name)
                       .join(format!("v{}", entry.version))
                       .join(&entry.file_name);
        if !path.is_file() {
            return Err(StoreError::Corrupt(format!("missing payload {}", path.display())));
        }
        debug!("fetch {reference} -> v{} ({})", entry.version, path.display());
        Ok(FetchedArtifact { handle: handle(&project, &manifest, entry),
                             path })
    }

    fn publish(&mut self, request: PublishRequest) -> Result<ArtifactHandle, StoreError> {
        for segment in [&request.project, &request.name] {
            if !is_valid_segment(segment) {
                return Err(StoreError::InvalidReference(segment.clone()));
            }
        }
        let mut manifest = self.load_manifest(&request.project, &request.name)?
                               .unwrap_or_else(|| Manifest::new(request.name.clone(), request.artifact_type.clone()));
        if manifest.artifact_type != request.artifact_type {
            return Err(StoreError::Conflict(format!("{}/{} has type `{}`, refusing to publish as `{}`",
                                                    request.project,
                                                    request.name,
                                                    manifest.artifact_type,
                                                    request.artifact_type)));
        }

        let version = manifest.next_version();
        let artifact_dir = self.artifact_dir(&request.project, &request.name);
        let dir = artifact_dir.join(format!("v{version}"));
        let file_name = request.file
                               .file_name()
                               .map(|f| f.to_string_lossy().into_owned())
                               .unwrap_or_else(|| request.name.clone());
        let staging = artifact_dir.join(format!(".v{version}.partial"));
        let digest = match stage_payload(&request.file, &staging, &file_name) {
            Ok(digest) => digest,
            Err(e) => {
                let _ = fs::remove_dir_all(&staging);
                return Err(e);
            }
        };
        // El manifest manda: un v<N> sin entrada es resto de un publish a medias.
        if dir.exists() {
            warn!("discarding orphan {} (not in manifest)", dir.display());
            fs::remove_dir_all(&dir)?;
        }
        fs::rename(&staging, &dir)?;

        manifest.versions.push(VersionEntry { version,
                                              digest,
                                              description: request.description,
                                              file_name,
                                              created_at: Utc::now(),
                                              lineage: request.lineage.iter().map(|r| r.to_string()).collect(),
                                              metadata: request.metadata,
                                              aliases: vec![] });
        if let Err(e) = self.save_manifest(&request.project, &manifest) {
            let _ = fs::remove_dir_all(&dir);
            return Err(e);
        }
        let published = manifest.resolve(&VersionSpec::Number(version))?;
        info!("published {}/{}:v{version}", request.project, request.name);
        Ok(handle(&request.project, &manifest, published))
    }

    fn promote(&mut self, reference: &ArtifactRef, alias: &str) -> Result<ArtifactHandle, StoreError> {
        match alias.parse::<VersionSpec>()? {
            VersionSpec::Alias(_) => {}
            _ => return Err(StoreError::InvalidReference(format!("`{alias}` cannot be used as an alias"))),
        }
        let (project, mut manifest) = self.manifest_for(reference)?;
        let version = manifest.resolve(&reference.version)?.version;
        manifest.move_alias(version, alias)?;
        self.save_manifest(&project, &manifest)?;
        info!("promoted {project}/{}:v{version} as `{alias}`", manifest.name);
        let entry = manifest.resolve(&VersionSpec::Number(version))?;
        Ok(handle(&project, &manifest, entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(dir: &Path, name: &str, ty: &str, body: &str) -> PublishRequest {
        let file = dir.join(name);
        fs::write(&file, body).unwrap();
        PublishRequest { project: "nyc_airbnb".into(),
                         name: name.into(),
                         artifact_type: ty.into(),
                         description: "test".into(),
                         file,
                         lineage: vec![],
                         metadata: json!({}) }
    }

    #[test]
    fn promote_rejects_reserved_alias_names() {
        let root = tempfile::tempdir().unwrap();
        let mut store = FsArtifactStore::new(root.path());
        store.publish(request(root.path(), "sample.csv", "raw_data", "a\n1\n")).unwrap();
        let r: ArtifactRef = "nyc_airbnb/sample.csv:v0".parse().unwrap();
        assert!(matches!(store.promote(&r, "latest"), Err(StoreError::InvalidReference(_))));
        assert!(matches!(store.promote(&r, "v3"), Err(StoreError::InvalidReference(_))));
        assert!(store.promote(&r, "reference").is_ok());
    }

    #[test]
    fn invalid_names_are_rejected_before_touching_disk() {
        let root = tempfile::tempdir().unwrap();
        let mut store = FsArtifactStore::new(root.path().join("store"));
        let mut req = request(root.path(), "sample.csv", "raw_data", "a\n");
        req.project = "../escape".into();
        assert!(matches!(store.publish(req), Err(StoreError::InvalidReference(_))));
        assert!(!root.path().join("store").exists());
    }

    #[test]
    fn unqualified_fetch_is_invalid() {
        let root = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(root.path());
        let r = ArtifactRef::latest("sample.csv");
        assert!(matches!(store.fetch(&r), Err(StoreError::InvalidReference(_))));
    }
}
