pub mod error;
pub mod kind;
pub mod loader;
pub mod splitter;
pub mod types;

use std::path::Path;

pub use error::DocumentError;
pub use kind::{DOCX_MIME, FileKind, PDF_MIME};
pub use loader::{DocxLoader, PdfLoader, TextLoader};
pub use splitter::{SplitterConfig, TextSplitter};
pub use types::{Chunk, Document, DocumentMetadata};

/// Default maximum file size: 50 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

pub trait DocumentLoader: Send + Sync {
    fn load(
        &self,
        path: &std::path::Path,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Document, DocumentError>> + Send + '_>,
    >;
}

/// Extract plain text from `path` according to its classified kind.
///
/// Images and unsupported kinds yield an empty string: nothing to index,
/// which is not an error.
///
/// # Errors
///
/// Returns an error if the file cannot be read, exceeds `max_file_size`,
/// or cannot be parsed as the claimed format.
pub async fn extract_text(
    path: &Path,
    kind: &FileKind,
    max_file_size: u64,
) -> Result<String, DocumentError> {
    let document = match kind {
        FileKind::Pdf => PdfLoader { max_file_size }.load(path).await?,
        FileKind::Docx => DocxLoader { max_file_size }.load(path).await?,
        FileKind::PlainText => TextLoader { max_file_size }.load(path).await?,
        FileKind::Image { .. } | FileKind::Unsupported { .. } => return Ok(String::new()),
    };
    Ok(document.content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn images_and_unknown_kinds_extract_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("photo.png");
        std::fs::write(&file, [0x89, b'P', b'N', b'G']).unwrap();

        let image = FileKind::Image {
            mime_type: "image/png".into(),
        };
        assert_eq!(extract_text(&file, &image, DEFAULT_MAX_FILE_SIZE).await.unwrap(), "");

        let unknown = FileKind::Unsupported {
            mime_type: "application/zip".into(),
        };
        assert_eq!(
            extract_text(Path::new("/does/not/exist"), &unknown, DEFAULT_MAX_FILE_SIZE)
                .await
                .unwrap(),
            ""
        );
    }

    #[tokio::test]
    async fn plain_text_dispatches_to_text_loader() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "\n The sky is blue. \n").unwrap();

        let text = extract_text(&file, &FileKind::PlainText, DEFAULT_MAX_FILE_SIZE)
            .await
            .unwrap();
        assert_eq!(text, "The sky is blue.");
    }

    #[tokio::test]
    async fn size_limit_applies_to_every_loader() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "0123456789").unwrap();

        for kind in [FileKind::PlainText, FileKind::Pdf, FileKind::Docx] {
            let err = extract_text(&file, &kind, 4).await.unwrap_err();
            assert!(matches!(err, DocumentError::FileTooLarge(10)), "{kind}");
        }
    }
}
