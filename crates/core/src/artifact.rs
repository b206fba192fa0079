//! The uploaded file a workflow is grounded on.

use std::fmt;
use std::path::Path;

use bytes::Bytes;
use docchat_model::{Blob, Part};
use mime::Mime;

use crate::Error;

/// What kind of document an artifact is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaType {
    /// A raster image (drawing scan, photo).
    Image,
    /// A PDF document.
    Pdf,
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaType::Image => write!(f, "image"),
            MediaType::Pdf => write!(f, "PDF"),
        }
    }
}

/// An uploaded file held in memory for the lifetime of a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    name: String,
    media_type: MediaType,
    mime: String,
    bytes: Bytes,
}

impl Artifact {
    /// Creates an artifact from its file name, the declared MIME type and
    /// the file content.
    ///
    /// Only JPEG, PNG and WebP images and PDF documents are accepted.
    pub fn new(
        name: impl Into<String>,
        declared_mime: &str,
        bytes: impl Into<Bytes>,
    ) -> Result<Self, Error> {
        let name = name.into();
        let bytes = bytes.into();
        let (media_type, mime) = classify(declared_mime)?;
        if bytes.is_empty() {
            return Err(Error::EmptyArtifact(name));
        }
        Ok(Self {
            name,
            media_type,
            mime,
            bytes,
        })
    }

    /// The file name given at upload.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this is an image or a PDF.
    #[inline]
    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    /// The normalized MIME type, e.g. `image/png`.
    #[inline]
    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// The file content.
    #[inline]
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Size of the content in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always `false` for a constructed artifact.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Makes the binary request part for this artifact. The bytes are
    /// shared, not copied.
    pub fn to_part(&self) -> Part {
        Part::Blob(Blob {
            mime_type: self.mime.clone(),
            data: self.bytes.clone(),
        })
    }
}

fn classify(declared_mime: &str) -> Result<(MediaType, String), Error> {
    let unsupported = || Error::UnsupportedMediaType(declared_mime.to_owned());
    let parsed: Mime = declared_mime.trim().parse().map_err(|_| unsupported())?;
    let subtype = parsed.subtype();
    let media_type = if parsed.type_() == mime::IMAGE
        && matches!(subtype.as_str(), "jpeg" | "png" | "webp")
    {
        MediaType::Image
    } else if parsed.type_() == mime::APPLICATION && subtype == mime::PDF {
        MediaType::Pdf
    } else {
        return Err(unsupported());
    };
    Ok((media_type, parsed.essence_str().to_owned()))
}

/// Guesses the declared MIME type of an upload from its file extension.
///
/// Returns `None` for extensions the upload boundary does not accept.
pub fn media_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "pdf" => Some("application/pdf"),
        _ => None,
    }
}

/// What happened to the held artifact on [`ArtifactStore::set`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Replacement {
    /// Nothing was held before.
    First,
    /// The new artifact has the same name as the old one.
    SameName,
    /// The new artifact has a different name. Anything derived from the
    /// previous artifact is stale.
    Renamed,
}

/// Holds the current artifact of one workflow.
#[derive(Clone, Debug, Default)]
pub struct ArtifactStore {
    current: Option<Artifact>,
}

impl ArtifactStore {
    /// Replaces the held artifact wholesale.
    pub fn set(&mut self, artifact: Artifact) -> Replacement {
        let replacement = match &self.current {
            None => Replacement::First,
            Some(old) if old.name == artifact.name => Replacement::SameName,
            Some(_) => Replacement::Renamed,
        };
        self.current = Some(artifact);
        replacement
    }

    /// The held artifact, if any.
    #[inline]
    pub fn get(&self) -> Option<&Artifact> {
        self.current.as_ref()
    }

    /// Removes and returns the held artifact.
    #[inline]
    pub fn take(&mut self) -> Option<Artifact> {
        self.current.take()
    }
}
