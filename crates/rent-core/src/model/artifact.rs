//! Artifact publicado y contrato del store.
//!
//! Un artifact es inmutable una vez publicado bajo `name` + versión. Cada
//! publish crea una versión nueva; los alias (`latest` implícito,
//! `reference`, `prod`) son etiquetas movibles sobre versiones existentes.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::reference::{ArtifactRef, VersionSpec};
use crate::errors::StoreError;

/// Solicitud de publicación de una versión nueva.
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub project: String,
    pub name: String,
    pub artifact_type: String,
    pub description: String,
    /// Fichero local cuyo contenido se copia al store.
    pub file: PathBuf,
    /// Inputs (ya fijados a versión concreta) de los que deriva el artifact.
    pub lineage: Vec<ArtifactRef>,
    pub metadata: Value, // información auxiliar (no entra al digest)
}

/// Identidad de una versión publicada.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactHandle {
    pub project: String,
    pub name: String,
    pub version: u32,
    pub artifact_type: String,
    pub digest: String,
    pub aliases: Vec<String>,
}

impl ArtifactHandle {
    /// Referencia fijada a esta versión exacta (la que se registra como lineage).
    pub fn pinned(&self) -> ArtifactRef {
        ArtifactRef::new(self.name.clone(), VersionSpec::Number(self.version)).in_project(self.project.clone())
    }
}

/// Resultado de un fetch: la versión resuelta y una ruta local legible.
#[derive(Debug, Clone)]
pub struct FetchedArtifact {
    pub handle: ArtifactHandle,
    pub path: PathBuf,
}

/// Cliente del artifact store.
///
/// Las implementaciones deben:
/// - fallar con `NotFound` si ninguna versión coincide;
/// - fallar con `AmbiguousVersion` si `latest` o un alias resuelve a más de
///   un candidato;
/// - no sobrescribir nunca una versión existente.
pub trait ArtifactStore {
    fn fetch(&self, reference: &ArtifactRef) -> Result<FetchedArtifact, StoreError>;

    fn publish(&mut self, request: PublishRequest) -> Result<ArtifactHandle, StoreError>;

    /// Mueve `alias` a la versión apuntada por `reference`.
    fn promote(&mut self, reference: &ArtifactRef, alias: &str) -> Result<ArtifactHandle, StoreError>;
}

impl<T: ArtifactStore + ?Sized> ArtifactStore for Box<T> {
    fn fetch(&self, reference: &ArtifactRef) -> Result<FetchedArtifact, StoreError> {
        (**self).fetch(reference)
    }

    fn publish(&mut self, request: PublishRequest) -> Result<ArtifactHandle, StoreError> {
        (**self).publish(request)
    }

    fn promote(&mut self, reference: &ArtifactRef, alias: &str) -> Result<ArtifactHandle, StoreError> {
        (**self).promote(reference, alias)
    }
}
