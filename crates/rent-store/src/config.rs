//! Carga de configuración del store desde variables de entorno.
//! Usa `RENTFLOW_STORE_DIR` (raíz del store, por defecto `artifacts`).

use std::env;
use std::path::PathBuf;

use dotenvy::dotenv;
use once_cell::sync::Lazy;

pub const ENV_STORE_DIR: &str = "RENTFLOW_STORE_DIR";
pub const DEFAULT_STORE_DIR: &str = "artifacts";

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub root: PathBuf,
}

impl StoreConfig {
    pub fn from_env() -> Self {
        Lazy::force(&DOTENV_LOADED);
        Self::from_lookup(|k| env::var(k).ok())
    }

    /// Igual que `from_env` pero con un lookup inyectado (tests).
    pub fn from_lookup<F>(lookup: F) -> Self
        where F: Fn(&str) -> Option<String>
    {
        let root = lookup(ENV_STORE_DIR).filter(|v| !v.trim().is_empty())
                                        .unwrap_or_else(|| DEFAULT_STORE_DIR.to_string());
        Self { root: PathBuf::from(root) }
    }
}

/// Forzar carga temprana de .env desde los binarios.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_artifacts_dir() {
        assert_eq!(StoreConfig::from_lookup(|_| None).root, PathBuf::from("artifacts"));
        assert_eq!(StoreConfig::from_lookup(|_| Some("  ".into())).root, PathBuf::from("artifacts"));
        let cfg = StoreConfig::from_lookup(|k| (k == ENV_STORE_DIR).then(|| "/tmp/store".to_string()));
        assert_eq!(cfg.root, PathBuf::from("/tmp/store"));
    }
}
