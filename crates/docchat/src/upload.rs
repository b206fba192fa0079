//! Loading files from disk as artifacts.

use std::path::Path;

use docchat_core::artifact::{Artifact, media_type_for_path};

use crate::Error;

/// Reads `path` into an artifact named after the file.
///
/// The declared media type comes from the extension. Unsupported files are
/// rejected before anything is read.
pub async fn load(path: &Path) -> Result<Artifact, Error> {
    let Some(declared) = media_type_for_path(path) else {
        let ext = path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Err(docchat_core::Error::UnsupportedMediaType(ext).into());
    };
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let bytes = tokio::fs::read(path).await.map_err(|source| Error::Io {
        path: path.to_owned(),
        source,
    })?;
    debug!("read {} byte(s) from {}", bytes.len(), path.display());
    Ok(Artifact::new(name, declared, bytes)?)
}
