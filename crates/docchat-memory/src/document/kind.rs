use std::fmt;

pub const PDF_MIME: &str = "application/pdf";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const OCTET_STREAM: &str = "application/octet-stream";

/// Closed set of upload categories the ingestion pipeline knows how to route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Docx,
    PlainText,
    Image { mime_type: String },
    Unsupported { mime_type: String },
}

impl FileKind {
    /// Classify an upload from its declared mime type, falling back to the
    /// file extension when the declared type is missing or generic.
    #[must_use]
    pub fn classify(declared_mime: Option<&str>, filename: &str) -> Self {
        Self::from_mime(&effective_mime(declared_mime, filename))
    }

    #[must_use]
    pub fn from_mime(mime: &str) -> Self {
        match mime {
            PDF_MIME | "pdf" => Self::Pdf,
            DOCX_MIME => Self::Docx,
            m if m.starts_with("image/") => Self::Image {
                mime_type: m.to_owned(),
            },
            m if m.starts_with("text/") => Self::PlainText,
            m => Self::Unsupported {
                mime_type: m.to_owned(),
            },
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::PlainText => "plain-text",
            Self::Image { .. } => "image",
            Self::Unsupported { .. } => "unsupported",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image { mime_type } | Self::Unsupported { mime_type } => {
                write!(f, "{} ({mime_type})", self.as_str())
            }
            _ => f.write_str(self.as_str()),
        }
    }
}

fn effective_mime(declared: Option<&str>, filename: &str) -> String {
    let declared = declared
        .map(|m| {
            m.split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
        })
        .filter(|m| !m.is_empty() && m != "file" && m != OCTET_STREAM);

    declared.unwrap_or_else(|| {
        mime_guess::from_path(filename)
            .first()
            .map_or_else(|| OCTET_STREAM.to_owned(), |m| m.essence_str().to_owned())
    })
}
