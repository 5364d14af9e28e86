//! API routes for solverd

use crate::files::StagedUpload;
use crate::server::AppState;
use axum::{
    extract::{Multipart, State},
    routing::{get, post},
    Json, Router,
};
use solver_common::{AnswerResponse, ServiceInfo};
use std::sync::Arc;
use tracing::{error, info};

type AppStateArc = Arc<AppState>;

pub fn answer_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/", get(service_info))
        .route("/api/", post(answer_question))
}

async fn service_info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: "solverd".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        description: "Answers graded assignment questions with deterministic handlers \
                      and a generative fallback"
            .to_string(),
        usage: "POST multipart form to /api/ with a 'question' field and optional 'file'"
            .to_string(),
    })
}

/// Answer one question. The inbound contract never raises: whatever
/// happens, the response is `200 {"answer": ...}` with any failure
/// described in the answer text. The staged upload is deleted when this
/// handler returns, on every path.
async fn answer_question(
    State(state): State<AppStateArc>,
    mut multipart: Multipart,
) -> Json<AnswerResponse> {
    let mut question = String::new();
    let mut upload: Option<StagedUpload> = None;

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => match field.name().map(str::to_string).as_deref() {
                Some("question") => match field.text().await {
                    Ok(text) => question = text,
                    Err(e) => {
                        error!("Failed to read question field: {}", e);
                        return Json(AnswerResponse::new(format!(
                            "Error reading question: {}",
                            e
                        )));
                    }
                },
                Some("file") => {
                    let name = field
                        .file_name()
                        .map(str::to_string)
                        .unwrap_or_else(|| "upload.bin".to_string());
                    match field.bytes().await {
                        Ok(bytes) => match StagedUpload::new(&name, &bytes) {
                            Ok(staged) => upload = Some(staged),
                            Err(e) => {
                                error!("Failed to stage upload: {}", e);
                                return Json(AnswerResponse::new(format!(
                                    "Error saving uploaded file: {}",
                                    e
                                )));
                            }
                        },
                        Err(e) => {
                            error!("Failed to read file field: {}", e);
                            return Json(AnswerResponse::new(format!(
                                "Error reading uploaded file: {}",
                                e
                            )));
                        }
                    }
                }
                _ => {}
            },
            Ok(None) => break,
            Err(e) => {
                error!("Malformed multipart body: {}", e);
                return Json(AnswerResponse::new(format!("Error reading request: {}", e)));
            }
        }
    }

    if question.trim().is_empty() {
        return Json(AnswerResponse::new("Error: No question provided."));
    }

    info!(
        "Answering question ({} chars, file: {})",
        question.len(),
        upload.as_ref().map(|u| u.name()).unwrap_or("none")
    );

    let answer = state.router.answer(&question, upload.as_ref()).await;
    Json(AnswerResponse::new(answer))
}
