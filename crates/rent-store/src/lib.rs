//! rent-store
//!
//! Implementación en disco del `ArtifactStore` de rent-core: versiones
//! inmutables por directorio, manifest JSON con digest sha256, lineage y
//! alias movibles.
//!
//! Módulos:
//! - `fs`: el store (`FsArtifactStore`).
//! - `manifest`: formato y resolución de versiones.
//! - `config`: raíz del store desde el entorno / .env.

pub mod config;
pub mod fs;
pub mod manifest;

pub use config::{init_dotenv, StoreConfig};
pub use fs::FsArtifactStore;
pub use manifest::{Manifest, VersionEntry};
