use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use docchat_core::orchestrator::{FILES_PROCESSED, NO_SESSION, NOTHING_EXTRACTED, Orchestrator};
use docchat_core::{Attachment, IncomingMessage, Session, SessionState};
use docchat_llm::Role;
use docchat_llm::mock::MockProvider;
use docchat_memory::InMemoryVectorStore;
use lopdf::content::{Content, Operation};
use lopdf::{Object, Stream, dictionary};

fn orchestrator(mock: &MockProvider) -> (Orchestrator, Arc<InMemoryVectorStore>) {
    let store = Arc::new(InMemoryVectorStore::new());
    (Orchestrator::new(mock.clone().into(), store.clone()), store)
}

fn attach(dir: &Path, name: &str, bytes: &[u8], mime_type: Option<&str>) -> Attachment {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    Attachment {
        name: name.into(),
        path,
        mime_type: mime_type.map(str::to_owned),
    }
}

async fn ask(orch: &Orchestrator, session: &mut Session, question: &str) -> docchat_core::Reply {
    orch.handle_message(session, IncomingMessage::text(question))
        .await
}

/// Two-page PDF: a blank first page carrying a link annotation, then a page of text.
fn write_pdf_with_blank_first_page(path: &Path) {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let blank_content = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
    let link = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Link",
        "Rect" => vec![0.into(), 0.into(), 10.into(), 10.into()],
        "A" => dictionary! {
            "S" => "URI",
            "URI" => Object::string_literal("https://example.com/report"),
        },
    });
    let blank_page = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => blank_content,
        "Annots" => vec![link.into()],
    });

    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal("Quarterly revenue grew")]),
            Operation::new("ET", vec![]),
        ],
    };
    let text_content = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let text_page = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => text_content,
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![blank_page.into(), text_page.into()],
            "Count" => 2,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

fn write_docx(path: &Path, paragraphs: &[&str]) {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>"))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );
    let file = std::fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    zip.start_file("word/document.xml", zip::write::FileOptions::default())
        .unwrap();
    zip.write_all(xml.as_bytes()).unwrap();
    zip.finish().unwrap();
}

#[tokio::test]
async fn text_upload_answers_question() {
    let mock = MockProvider::with_responses(vec!["Blue.".into()]);
    let (orch, _) = orchestrator(&mock);
    let dir = tempfile::tempdir().unwrap();
    let mut session = orch.new_session();

    let reply = orch
        .handle_message(
            &mut session,
            IncomingMessage::with_attachments(vec![attach(
                dir.path(),
                "sky.txt",
                b"The sky is blue.",
                Some("text/plain"),
            )]),
        )
        .await;
    assert_eq!(reply.text, FILES_PROCESSED);
    assert_eq!(session.state(), SessionState::Indexed);

    let reply = ask(&orch, &mut session, "What color is the sky?").await;
    assert_eq!(reply.text, "Blue.");

    let request = mock.last_request().unwrap();
    assert_eq!(request[0].role, Role::System);
    assert!(request[0].text_content().contains("The sky is blue."));
    assert_eq!(request.last().unwrap().text_content(), "What color is the sky?");
}

#[tokio::test]
async fn sequential_uploads_feed_one_index() {
    let mock = MockProvider::default();
    let (orch, store) = orchestrator(&mock);
    let dir = tempfile::tempdir().unwrap();
    let mut session = orch.new_session();

    orch.handle_message(
        &mut session,
        IncomingMessage::with_attachments(vec![attach(
            dir.path(),
            "sky.txt",
            b"The sky is blue.",
            None,
        )]),
    )
    .await;
    orch.handle_message(
        &mut session,
        IncomingMessage::with_attachments(vec![attach(
            dir.path(),
            "grass.txt",
            b"The grass is green.",
            None,
        )]),
    )
    .await;
    assert_eq!(store.collection_count(), 1);
    assert_eq!(session.index().unwrap().len(), 2);

    mock.push_response("Green.");
    let reply = ask(&orch, &mut session, "What color is the grass?").await;
    assert_eq!(reply.text, "Green.");
    assert!(reply.sources.contains(&"grass.txt-0".to_owned()));
    let request = mock.last_request().unwrap();
    assert!(request[0].text_content().contains("The grass is green."));
}

#[tokio::test]
async fn follow_up_question_is_condensed_with_history() {
    let mock = MockProvider::with_responses(vec![
        "Blue.".into(),
        "What color is the grass?".into(),
        "Green.".into(),
    ]);
    let (orch, _) = orchestrator(&mock);
    let dir = tempfile::tempdir().unwrap();
    let mut session = orch.new_session();

    orch.handle_message(
        &mut session,
        IncomingMessage::with_attachments(vec![attach(
            dir.path(),
            "colors.txt",
            b"The sky is blue.\n\nThe grass is green.",
            None,
        )]),
    )
    .await;

    ask(&orch, &mut session, "What color is the sky?").await;
    let reply = ask(&orch, &mut session, "And the grass?").await;
    assert_eq!(reply.text, "Green.");

    let requests = mock.requests();
    assert_eq!(requests.len(), 3);
    let condense = requests[1][0].text_content();
    assert!(condense.contains("Human: What color is the sky?"));
    assert!(condense.contains("Follow Up Input: And the grass?"));
    assert_eq!(
        requests[2].last().unwrap().text_content(),
        "What color is the grass?"
    );
    assert_eq!(session.chain().unwrap().memory().len(), 2);
}

#[tokio::test]
async fn image_question_uses_image_path() {
    let mock = MockProvider::with_responses(vec![
        "A red bicycle leaning on a wall.".into(),
        "A bicycle.".into(),
    ]);
    let (orch, _) = orchestrator(&mock);
    let dir = tempfile::tempdir().unwrap();
    let mut session = orch.new_session();

    let reply = orch
        .handle_message(
            &mut session,
            IncomingMessage::with_attachments(vec![attach(
                dir.path(),
                "bike.jpg",
                &[0xFF, 0xD8, 0xFF, 0xE0],
                Some("file"),
            )]),
        )
        .await;
    assert_eq!(reply.text, FILES_PROCESSED);
    assert_eq!(session.pending_image().unwrap().mime_type, "image/jpeg");

    let hits = session
        .index()
        .unwrap()
        .retriever()
        .retrieve("red bicycle")
        .await
        .unwrap();
    assert_eq!(hits[0].source, "Image-bike.jpg");

    let reply = ask(&orch, &mut session, "what is in this image?").await;
    assert_eq!(reply.text, "A bicycle.");
    let request = mock.last_request().unwrap();
    assert_eq!(request.len(), 1);
    assert!(request[0].has_image());
    assert_eq!(request[0].text_content(), "what is in this image?");
    assert!(session.chain().unwrap().memory().is_empty());
}

#[tokio::test]
async fn fresh_session_question_gets_notice() {
    let mock = MockProvider::default();
    let (orch, _) = orchestrator(&mock);
    let mut session = orch.new_session();

    let reply = ask(&orch, &mut session, "What is in the report?").await;
    assert_eq!(reply.text, NO_SESSION);
    assert!(reply.sources.is_empty());
    assert!(mock.requests().is_empty());
    assert_eq!(mock.embed_calls(), 0);
}

#[tokio::test]
async fn blank_pdf_page_does_not_abort_later_pages() {
    let mock = MockProvider::default();
    let (orch, _) = orchestrator(&mock);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.pdf");
    write_pdf_with_blank_first_page(&path);
    let mut session = orch.new_session();

    let reply = orch
        .handle_message(
            &mut session,
            IncomingMessage::with_attachments(vec![Attachment {
                name: "report.pdf".into(),
                path,
                mime_type: Some("application/pdf".into()),
            }]),
        )
        .await;
    assert_eq!(reply.text, FILES_PROCESSED);

    let hits = session
        .index()
        .unwrap()
        .retriever()
        .retrieve("quarterly revenue")
        .await
        .unwrap();
    let text: String = hits.iter().map(|h| h.content.as_str()).collect();
    assert!(text.contains("Quarterly revenue grew"));
    assert!(text.contains("Link: https://example.com/report"));
}

#[tokio::test]
async fn docx_upload_is_indexed() {
    let mock = MockProvider::default();
    let (orch, _) = orchestrator(&mock);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memo.docx");
    write_docx(&path, &["Meeting moved to Friday.", "Bring the slides."]);
    let mut session = orch.new_session();

    let reply = orch
        .handle_message(
            &mut session,
            IncomingMessage::with_attachments(vec![Attachment {
                name: "memo.docx".into(),
                path,
                mime_type: Some("application/octet-stream".into()),
            }]),
        )
        .await;
    assert_eq!(reply.text, FILES_PROCESSED);

    let hits = session
        .index()
        .unwrap()
        .retriever()
        .retrieve("meeting friday")
        .await
        .unwrap();
    assert_eq!(hits[0].content, "Meeting moved to Friday.\nBring the slides.");
    assert_eq!(hits[0].source, "memo.docx-0");
}

#[tokio::test]
async fn mixed_batch_indexes_what_it_can() {
    let mock = MockProvider::default();
    let (orch, _) = orchestrator(&mock);
    let dir = tempfile::tempdir().unwrap();
    let mut session = orch.new_session();

    let reply = orch
        .handle_message(
            &mut session,
            IncomingMessage::with_attachments(vec![
                attach(dir.path(), "broken.pdf", b"not really a pdf", None),
                attach(dir.path(), "notes.md", b"# Notes\n\nShip on Monday.", None),
                attach(dir.path(), "archive.zip", b"PK", None),
            ]),
        )
        .await;
    assert!(reply.text.starts_with(FILES_PROCESSED));
    assert!(reply.text.contains("broken.pdf"));
    assert!(reply.text.contains("archive.zip"));
    assert_eq!(session.index().unwrap().len(), 1);
}

#[tokio::test]
async fn upload_with_nothing_usable_keeps_session_empty() {
    let mock = MockProvider::default();
    let (orch, store) = orchestrator(&mock);
    let dir = tempfile::tempdir().unwrap();
    let mut session = orch.new_session();

    let reply = orch
        .handle_message(
            &mut session,
            IncomingMessage::with_attachments(vec![attach(dir.path(), "empty.txt", b"", None)]),
        )
        .await;
    assert!(reply.text.starts_with(NOTHING_EXTRACTED));
    assert_eq!(session.state(), SessionState::Empty);
    assert_eq!(store.collection_count(), 0);

    let reply = ask(&orch, &mut session, "Anything?").await;
    assert_eq!(reply.text, NO_SESSION);
}

#[tokio::test]
async fn sessions_are_isolated() {
    let mock = MockProvider::default();
    let (orch, store) = orchestrator(&mock);
    let dir = tempfile::tempdir().unwrap();
    let mut first = orch.new_session();
    let mut second = orch.new_session();

    orch.handle_message(
        &mut first,
        IncomingMessage::with_attachments(vec![attach(dir.path(), "a.txt", b"Alpha.", None)]),
    )
    .await;
    assert_eq!(second.state(), SessionState::Empty);
    assert_eq!(ask(&orch, &mut second, "Alpha?").await.text, NO_SESSION);

    orch.handle_message(
        &mut second,
        IncomingMessage::with_attachments(vec![attach(dir.path(), "b.txt", b"Beta.", None)]),
    )
    .await;
    assert_eq!(store.collection_count(), 2);
    assert_ne!(
        first.index().unwrap().collection(),
        second.index().unwrap().collection()
    );

    orch.end_session(&mut first).await;
    assert_eq!(store.collection_count(), 1);
    assert_eq!(second.index().unwrap().len(), 1);
}
