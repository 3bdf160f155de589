use std::path::Path;

use axum::Json;
use axum::extract::multipart::{Field, Multipart, MultipartError};
use axum::extract::{Path as UrlPath, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use docchat_core::{Attachment, IncomingMessage};
use uuid::Uuid;

use super::server::AppState;

#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    sessions: usize,
}

#[derive(serde::Serialize)]
struct SessionCreated {
    session_id: Uuid,
    message: &'static str,
}

#[derive(serde::Serialize)]
struct MessageResponse {
    reply: String,
    sources: Vec<String>,
}

pub(crate) async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.started_at.elapsed().as_secs(),
        sessions: state.sessions.len(),
    })
}

pub(crate) async fn create_session_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.orchestrator.new_session();
    let session_id = state.sessions.insert(session);
    (
        StatusCode::CREATED,
        Json(SessionCreated {
            session_id,
            message: state.orchestrator.welcome(),
        }),
    )
}

pub(crate) async fn message_handler(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<Uuid>,
    multipart: Multipart,
) -> Response {
    let Some(session) = state.sessions.get(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let upload_dir = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(e) => {
            tracing::error!(session = %id, "failed to create upload directory: {e}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let message = match read_message(multipart, upload_dir.path()).await {
        Ok(message) => message,
        Err(UploadError::Multipart(e)) => {
            tracing::warn!(session = %id, "rejected multipart body: {}", e.body_text());
            return e.into_response();
        }
        Err(UploadError::Io(e)) => {
            tracing::error!(session = %id, operation = "store_upload", "{e}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let reply = {
        let mut session = session.lock().await;
        // DELETE may have run while the body was being read.
        if session.is_ended() {
            return StatusCode::NOT_FOUND.into_response();
        }
        state.orchestrator.handle_message(&mut session, message).await
    };
    drop(upload_dir);

    Json(MessageResponse {
        reply: reply.text,
        sources: reply.sources,
    })
    .into_response()
}

pub(crate) async fn delete_session_handler(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<Uuid>,
) -> StatusCode {
    let Some(session) = state.sessions.remove(&id) else {
        return StatusCode::NOT_FOUND;
    };
    let mut session = session.lock().await;
    state.orchestrator.end_session(&mut session).await;
    StatusCode::NO_CONTENT
}

enum UploadError {
    Multipart(MultipartError),
    Io(std::io::Error),
}

/// Collect the `content` text field and write every file field into `dir`.
async fn read_message(mut multipart: Multipart, dir: &Path) -> Result<IncomingMessage, UploadError> {
    let mut message = IncomingMessage::default();

    while let Some(field) = multipart.next_field().await.map_err(UploadError::Multipart)? {
        match field.file_name().map(str::to_owned) {
            Some(name) if !name.is_empty() => {
                let attachment = store_file(field, name, dir, message.attachments.len()).await?;
                message.attachments.push(attachment);
            }
            Some(_) => {}
            None if field.name() == Some("content") => {
                message.content = field.text().await.map_err(UploadError::Multipart)?;
            }
            None => {
                tracing::debug!(field = ?field.name(), "ignoring unknown form field");
            }
        }
    }

    Ok(message)
}

async fn store_file(
    field: Field<'_>,
    name: String,
    dir: &Path,
    index: usize,
) -> Result<Attachment, UploadError> {
    let mime_type = field.content_type().map(str::to_owned);
    let bytes = field.bytes().await.map_err(UploadError::Multipart)?;

    let base = Path::new(&name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload");
    let path = dir.join(format!("{index}-{base}"));
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(UploadError::Io)?;

    Ok(Attachment {
        name: base.to_owned(),
        path,
        mime_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_response_serializes() {
        let resp = HealthResponse {
            status: "ok",
            uptime_secs: 42,
            sessions: 3,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("\"sessions\":3"));
    }

    #[test]
    fn session_created_serializes_id_as_string() {
        let id = Uuid::new_v4();
        let json = serde_json::to_value(SessionCreated {
            session_id: id,
            message: "hi",
        })
        .unwrap();
        assert_eq!(json["session_id"], id.to_string());
    }
}
