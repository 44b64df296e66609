//! Modelos neutrales (referencias, artifacts, contexto del run).

pub mod artifact;
pub mod context;
pub mod reference;

pub use artifact::{ArtifactHandle, ArtifactStore, FetchedArtifact, PublishRequest};
pub use context::RunContext;
pub use reference::{ArtifactRef, VersionSpec};
