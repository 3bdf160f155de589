use std::io::Read;
use std::path::Path;
use std::pin::Pin;

use quick_xml::Reader;
use quick_xml::events::Event;

use super::super::{
    DEFAULT_MAX_FILE_SIZE, DOCX_MIME, Document, DocumentError, DocumentLoader, DocumentMetadata,
};
use super::{check_size, file_name};

pub struct DocxLoader {
    pub max_file_size: u64,
}

impl Default for DocxLoader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl DocumentLoader for DocxLoader {
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
            let content = tokio::task::spawn_blocking(move || read_docx(&path))
                .await
                .map_err(|e| DocumentError::Task(e.to_string()))??;

            Ok(Document {
                content,
                metadata: DocumentMetadata::new(source, DOCX_MIME),
            })
        })
    }
}

fn read_docx(path: &Path) -> Result<String, DocumentError> {
    let file = std::fs::File::open(path)?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|e| DocumentError::Docx(e.to_string()))?;
    let mut entry = archive
        .by_name("word/document.xml")
        .map_err(|_| DocumentError::Docx("missing word/document.xml".into()))?;

    let mut xml = String::new();
    entry.read_to_string(&mut xml)?;
    paragraphs_from_xml(&xml)
}

/// Joins the text runs of every `w:p` with newlines, in document order.
///
/// Tabs and breaks count only inside `w:r`; the `w:tab` elements under
/// `w:pPr/w:tabs` are tab-stop definitions, not content.
fn paragraphs_from_xml(xml: &str) -> Result<String, DocumentError> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_run = false;
    let mut in_text = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| DocumentError::Docx(format!("malformed document.xml: {e}")))?;
        match event {
            Event::Start(e) => match e.name().as_ref() {
                b"w:r" => in_run = true,
                b"w:t" if in_run => in_text = true,
                b"w:tab" if in_run => current.push('\t'),
                b"w:br" | b"w:cr" if in_run => current.push('\n'),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:p" => paragraphs.push(String::new()),
                b"w:tab" if in_run => current.push('\t'),
                b"w:br" | b"w:cr" if in_run => current.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_text => {
                let text = t
                    .unescape()
                    .map_err(|e| DocumentError::Docx(e.to_string()))?;
                current.push_str(&text);
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:r" => in_run = false,
                b"w:p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs.join("\n"))
}
