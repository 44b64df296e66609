//! Digests blake3 en hex.

use std::fs;
use std::io;
use std::path::Path;

use serde_json::Value;

use super::to_canonical_json;

pub fn hash_bytes(input: &[u8]) -> String {
    blake3::hash(input).to_hex().to_string()
}

pub fn hash_str(input: &str) -> String {
    hash_bytes(input.as_bytes())
}

/// Digest del contenido de un fichero; la ruta no participa.
pub fn hash_file(path: &Path) -> io::Result<String> {
    Ok(hash_bytes(&fs::read(path)?))
}

/// Hash de un valor JSON sobre su forma canónica, así el orden de claves y
/// la escritura `10` frente a `10.0` no alteran el resultado.
pub fn hash_value(value: &Value) -> String {
    hash_str(&to_canonical_json(value))
}
