//! HTTP front door tests - multipart handling and the never-raises
//! contract of the answer endpoint.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use std::sync::Arc;
use tower::util::ServiceExt;

use solver_common::{AnswerResponse, ServiceInfo};
use solverd::ai_client::FakeChatClient;
use solverd::config::SolverConfig;
use solverd::server::{self, AppState};

const BOUNDARY: &str = "X-SOLVERD-TEST-BOUNDARY";

fn app_with(client: FakeChatClient) -> axum::Router {
    let state = AppState::with_client(SolverConfig::default(), Arc::new(client));
    server::build_app(Arc::new(state))
}

fn multipart_request(question: &str, file: Option<(&str, &[u8])>) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"question\"\r\n\r\n{}\r\n",
            BOUNDARY, question
        )
        .as_bytes(),
    );
    if let Some((name, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, name
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn answer_of(response: axum::response::Response) -> String {
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let parsed: AnswerResponse = serde_json::from_slice(&bytes).unwrap();
    parsed.answer
}

#[tokio::test]
async fn service_info_describes_usage() {
    let app = app_with(FakeChatClient::unconfigured());
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let info: ServiceInfo = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(info.name, "solverd");
    assert!(info.usage.contains("/api/"));
}

#[tokio::test]
async fn direct_answer_round_trips_through_api() {
    let app = app_with(FakeChatClient::classifying(json!({
        "question_type": "arithmetic",
        "actions": [],
        "direct_answer": "42"
    })));

    let response = app
        .oneshot(multipart_request("What is six times seven?", None))
        .await
        .unwrap();
    assert_eq!(answer_of(response).await, "42");
}

#[tokio::test]
async fn uploaded_file_reaches_the_pipeline() {
    // Literal short-circuit: key=value conversion then jsonhash, fully
    // deterministic - no scripted responses needed.
    let app = app_with(FakeChatClient::unconfigured());

    let response = app
        .oneshot(multipart_request(
            "Use multi-cursor to convert the file to JSON and run it through jsonhash. \
             What is the hash value?",
            Some(("pairs.txt", b"foo=1\nbar=true\nbaz=x,y")),
        ))
        .await
        .unwrap();

    assert_eq!(
        answer_of(response).await,
        "b7de3f45ff266cfa278ca7b1c67247274ae48d2798cb3e1b9c8e88cacb5634f9"
    );
}

#[tokio::test]
async fn missing_question_is_answered_not_raised() {
    let app = app_with(FakeChatClient::unconfigured());

    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    let request = Request::builder()
        .method("POST")
        .uri("/api/")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let answer = answer_of(response).await;
    assert!(answer.contains("No question provided"));
}

#[tokio::test]
async fn unconfigured_service_still_answers() {
    let app = app_with(FakeChatClient::unconfigured());
    let response = app
        .oneshot(multipart_request("Tell me something open-ended.", None))
        .await
        .unwrap();
    let answer = answer_of(response).await;
    assert!(answer.contains("token not configured"));
}
