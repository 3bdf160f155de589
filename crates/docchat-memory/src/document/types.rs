#[derive(Debug, Clone)]
pub struct DocumentMetadata {
    /// Display name of the originating file.
    pub source: String,
    pub content_type: String,
}

impl DocumentMetadata {
    #[must_use]
    pub fn new(source: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            content_type: content_type.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    pub content: String,
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone)]
pub struct Chunk {
    pub content: String,
    pub metadata: DocumentMetadata,
    pub chunk_index: usize,
    /// Character offset of the window start inside the document content.
    pub char_offset: usize,
}

impl Chunk {
    /// Retrieval source label: `Image-<file>` for image descriptions,
    /// `<file>-<index>` for everything else. Not unique across uploads.
    #[must_use]
    pub fn source_tag(&self) -> String {
        if self.metadata.content_type.starts_with("image/") {
            format!("Image-{}", self.metadata.source)
        } else {
            format!("{}-{}", self.metadata.source, self.chunk_index)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(content_type: &str, index: usize) -> Chunk {
        Chunk {
            content: "text".into(),
            metadata: DocumentMetadata::new("notes.txt", content_type),
            chunk_index: index,
            char_offset: 0,
        }
    }

    #[test]
    fn text_source_tag_uses_index() {
        assert_eq!(chunk("text/plain", 3).source_tag(), "notes.txt-3");
    }

    #[test]
    fn image_source_tag_has_prefix() {
        assert_eq!(chunk("image/png", 1).source_tag(), "Image-notes.txt");
    }
}
