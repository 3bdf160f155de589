mod docx;
mod pdf;
mod text;

pub use docx::DocxLoader;
pub use pdf::PdfLoader;
pub use text::TextLoader;

use std::path::Path;

use super::DocumentError;

/// Reject files above `max_size` before handing them to a parser.
pub(crate) async fn check_size(path: &Path, max_size: u64) -> Result<(), DocumentError> {
    let meta = tokio::fs::metadata(path).await?;
    if meta.len() > max_size {
        return Err(DocumentError::FileTooLarge(meta.len()));
    }
    Ok(())
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |n| n.to_string_lossy().into_owned(),
    )
}
