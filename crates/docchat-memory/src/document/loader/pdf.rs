use std::fmt::Write as _;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::pin::Pin;

use lopdf::{Object, ObjectId};

use super::super::{
    DEFAULT_MAX_FILE_SIZE, Document, DocumentError, DocumentLoader, DocumentMetadata, PDF_MIME,
};
use super::{check_size, file_name};

pub struct PdfLoader {
    pub max_file_size: u64,
}

impl Default for PdfLoader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl DocumentLoader for PdfLoader {
    fn load(
        &self,
        path: &Path,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<Document, DocumentError>> + Send + '_>>
    {
        let path = path.to_path_buf();
        let max_size = self.max_file_size;
        Box::pin(async move {
            check_size(&path, max_size).await?;

            let source = file_name(&path);
            let content = tokio::task::spawn_blocking(move || extract_pdf(&path))
                .await
                .map_err(|e| DocumentError::Task(e.to_string()))??;

            Ok(Document {
                content,
                metadata: DocumentMetadata::new(source, PDF_MIME),
            })
        })
    }
}

/// Page texts in order, each followed by its `Link: <uri>` lines.
fn extract_pdf(path: &Path) -> Result<String, DocumentError> {
    let structure = lopdf::Document::load(path);
    let pages = match catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_by_pages(path)
    })) {
        Ok(Ok(pages)) => pages,
        Ok(Err(e)) => {
            tracing::warn!(file = %path.display(), "pdf-extract failed, falling back to lopdf: {e}");
            lopdf_pages(structure.as_ref())?
        }
        Err(_) => {
            tracing::warn!(file = %path.display(), "pdf-extract panicked, falling back to lopdf");
            lopdf_pages(structure.as_ref())?
        }
    };

    let page_ids: Vec<ObjectId> = structure
        .as_ref()
        .map(|doc| doc.get_pages().into_values().collect())
        .unwrap_or_default();

    let mut out = String::new();
    for (i, page) in pages.iter().enumerate() {
        let text = page.trim();
        if !text.is_empty() {
            out.push_str(text);
            out.push('\n');
        }
        if let (Ok(doc), Some(page_id)) = (structure.as_ref(), page_ids.get(i)) {
            for uri in page_links(doc, *page_id) {
                let _ = writeln!(out, "Link: {uri}");
            }
        }
    }
    Ok(out.trim_end().to_owned())
}

fn lopdf_pages(
    structure: Result<&lopdf::Document, &lopdf::Error>,
) -> Result<Vec<String>, DocumentError> {
    let doc = structure.map_err(|e| DocumentError::Pdf(e.to_string()))?;
    Ok(doc
        .get_pages()
        .into_keys()
        .map(|number| {
            doc.extract_text(&[number]).unwrap_or_else(|e| {
                tracing::debug!(page = number, "skipping unreadable PDF page: {e}");
                String::new()
            })
        })
        .collect())
}

fn resolve<'a>(doc: &'a lopdf::Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// URIs of the link annotations on one page. Malformed annotations are ignored.
fn page_links(doc: &lopdf::Document, page_id: ObjectId) -> Vec<String> {
    let Some(annots) = doc
        .get_dictionary(page_id)
        .ok()
        .and_then(|page| page.get(b"Annots").ok())
        .and_then(|o| resolve(doc, o))
        .and_then(|o| o.as_array().ok())
    else {
        return Vec::new();
    };

    annots
        .iter()
        .filter_map(|annot| {
            let annot = resolve(doc, annot)?.as_dict().ok()?;
            let action = resolve(doc, annot.get(b"A").ok()?)?.as_dict().ok()?;
            match resolve(doc, action.get(b"URI").ok()?)? {
                Object::String(bytes, _) => Some(String::from_utf8_lossy(bytes).into_owned()),
                _ => None,
            }
        })
        .collect()
}
