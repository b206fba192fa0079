use bytes::Bytes;

/// A request to be sent to the model provider.
///
/// Parts are delivered to the model in order. Providers must not reorder,
/// merge or drop them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ModelRequest {
    /// The ordered input parts.
    pub parts: Vec<Part>,
}

impl ModelRequest {
    /// Returns the text parts joined by blank lines, skipping binary
    /// parts. Mostly useful for logging and assertions.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(Part::as_text)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// One input part.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Part {
    /// Plain text.
    Text(String),
    /// Binary content tagged with its media type.
    Blob(Blob),
}

impl Part {
    /// Returns the text if this is a text part.
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text(text) => Some(text),
            Part::Blob(_) => None,
        }
    }
}

/// Binary content, such as an image or a PDF document.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Blob {
    /// MIME type of the data, e.g. `image/png`.
    pub mime_type: String,
    /// Raw bytes. Cloning is cheap.
    pub data: Bytes,
}
