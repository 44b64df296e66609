//! Copia el CSV de muestra configurado al store como dato crudo.

use std::fs;

use rent_core::{ArtifactStore, StepParams};
use serde_json::{json, Value};

use crate::error::StepError;
use crate::session::StepSession;

pub fn run<S: ArtifactStore + ?Sized>(params: &StepParams, session: &mut StepSession<'_, S>) -> Result<Value, StepError> {
    let sample = params.text("sample")?;
    let name = params.text("artifact_name")?;
    let artifact_type = params.text("artifact_type")?;
    let description = params.text("artifact_description")?;

    let local = session.scratch_path(&name);
    fs::copy(&sample, &local).map_err(|e| std::io::Error::new(e.kind(), format!("{sample}: {e}")))?;
    let handle = session.log_artifact(&name, &artifact_type, &description, &local, json!({"source": sample}))?;
    Ok(json!({"artifact": handle.pinned().to_string()}))
}
