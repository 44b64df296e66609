//! Sesión de un step contra el store.
//!
//! Cada input consumido queda fijado (versión concreta) y se registra como
//! lineage de todo lo que el step publique después. El directorio scratch
//! del step se libera al soltar la sesión.

use std::path::{Path, PathBuf};

use log::info;
use rent_core::{ArtifactHandle, ArtifactRef, ArtifactStore, FetchedArtifact, PublishRequest, RunContext, StepId};
use serde_json::Value;
use tempfile::TempDir;

use crate::error::StepError;

pub struct StepSession<'a, S: ArtifactStore + ?Sized> {
    step: StepId,
    ctx: &'a RunContext,
    store: &'a mut S,
    lineage: Vec<ArtifactRef>,
    published: Vec<ArtifactHandle>,
    scratch: TempDir,
}

impl<'a, S: ArtifactStore + ?Sized> StepSession<'a, S> {
    pub fn open(step: StepId, ctx: &'a RunContext, store: &'a mut S) -> Result<Self, StepError> {
        let scratch = tempfile::Builder::new().prefix(step.name()).tempdir_in(&ctx.work_dir)?;
        Ok(Self { step,
                  ctx,
                  store,
                  lineage: Vec::new(),
                  published: Vec::new(),
                  scratch })
    }

    pub fn ctx(&self) -> &RunContext {
        self.ctx
    }

    /// Ruta dentro del scratch del step.
    pub fn scratch_path(&self, file_name: &str) -> PathBuf {
        self.scratch.path().join(file_name)
    }

    /// Resuelve y registra un input.
    pub fn use_artifact(&mut self, reference: &ArtifactRef) -> Result<FetchedArtifact, StepError> {
        let reference = self.ctx.qualify(reference);
        let fetched = self.store.fetch(&reference)?;
        info!("[{}] using {reference} (v{})", self.step, fetched.handle.version);
        let pinned = fetched.handle.pinned();
        if !self.lineage.contains(&pinned) {
            self.lineage.push(pinned);
        }
        Ok(fetched)
    }

    pub fn log_artifact(&mut self,
                        name: &str,
                        artifact_type: &str,
                        description: &str,
                        file: &Path,
                        metadata: Value)
                        -> Result<ArtifactHandle, StepError> {
        let handle = self.store.publish(PublishRequest { project: self.ctx.project.clone(),
                                                         name: name.to_string(),
                                                         artifact_type: artifact_type.to_string(),
                                                         description: description.to_string(),
                                                         file: file.to_path_buf(),
                                                         lineage: self.lineage.clone(),
                                                         metadata })?;
        info!("[{}] logged {}", self.step, handle.pinned());
        self.published.push(handle.clone());
        Ok(handle)
    }

    pub fn lineage(&self) -> &[ArtifactRef] {
        &self.lineage
    }

    pub fn published(&self) -> &[ArtifactHandle] {
        &self.published
    }
}
