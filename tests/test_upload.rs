mod common;

use std::collections::HashMap;

use axum::extract::Form;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use common::{Calls, client, spawn_server};
use lingopost::error::LingoError;
use lingopost::media::GeneratedImage;
use lingopost::upload::UploadClient;
use serde_json::json;

fn imgbb_router(calls: Calls) -> Router {
    Router::new().route(
        "/1/upload",
        post(move |Form(form): Form<HashMap<String, String>>| {
            let calls = calls.clone();
            async move {
                let key = form.get("key").cloned().unwrap_or_default();
                calls.push(key.clone(), json!(form));
                match key.as_str() {
                    "good-key" => (
                        StatusCode::OK,
                        Json(json!({
                            "success": true,
                            "data": {"url": "https://i.ibb.co/abc/card.jpg"},
                        })),
                    ),
                    "soft-fail" => (
                        StatusCode::OK,
                        Json(json!({"success": false, "error": {"message": "Invalid API v1 key."}})),
                    ),
                    _ => (
                        StatusCode::BAD_REQUEST,
                        Json(json!({"status_code": 400})),
                    ),
                }
            }
        }),
    )
}

async fn upload_client(calls: &Calls) -> UploadClient {
    let base = spawn_server(imgbb_router(calls.clone())).await;
    UploadClient::new(client(), base.join("1/upload").expect("upload url"))
}

#[tokio::test]
async fn data_url_prefix_is_stripped() {
    let calls = Calls::default();
    let uploader = upload_client(&calls).await;

    let url = uploader
        .upload_base64("data:image/jpeg;base64,/9j/4AAQ", "good-key")
        .await
        .expect("upload");
    assert_eq!(url, "https://i.ibb.co/abc/card.jpg");
    assert_eq!(calls.bodies()[0]["image"], "/9j/4AAQ");
}

#[tokio::test]
async fn image_bytes_are_sent_as_base64() {
    let calls = Calls::default();
    let uploader = upload_client(&calls).await;
    let image = GeneratedImage::new(vec![0xFF, 0xD8, 0xFF], "image/jpeg");

    uploader.upload(&image, " good-key ").await.expect("upload");
    assert_eq!(calls.labels(), vec!["good-key"]);
    assert_eq!(calls.bodies()[0]["image"], "/9j/");
}

#[tokio::test]
async fn provider_message_is_surfaced() {
    let calls = Calls::default();
    let uploader = upload_client(&calls).await;

    match uploader.upload_base64("/9j/4AAQ", "soft-fail").await {
        Err(LingoError::UploadRejected(message)) => assert_eq!(message, "Invalid API v1 key."),
        other => panic!("unexpected result {other:?}"),
    }
}

#[tokio::test]
async fn http_error_without_message_is_rejected() {
    let calls = Calls::default();
    let uploader = upload_client(&calls).await;

    let err = uploader
        .upload_base64("/9j/4AAQ", "wrong-key")
        .await
        .expect_err("bad key");
    assert!(matches!(err, LingoError::UploadRejected(_)));
    assert!(err.to_string().contains("400"));
}

#[tokio::test]
async fn empty_key_sends_nothing() {
    let calls = Calls::default();
    let uploader = upload_client(&calls).await;

    let err = uploader
        .upload_base64("/9j/4AAQ", "")
        .await
        .expect_err("no key");
    assert!(matches!(err, LingoError::MissingCredential(_)));
    assert_eq!(calls.len(), 0);
}
