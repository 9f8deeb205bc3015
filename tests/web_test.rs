use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use base64::Engine;
use http_body_util::BodyExt;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use pest_advisor::{
    models::{BinaryModel, LinearSvm, ModelArtifact},
    web::{create_app, AppState},
    Config, DiagnosisPipeline, PestClassifier,
};
use serde_json::Value;
use std::io::Cursor;
use std::path::Path;
use tower::ServiceExt;

const BOUNDARY: &str = "pest-advisor-test-boundary";

/// 构造一个总是预测 "rice bug" 的模型
fn rice_bug_app(upload_dir: &Path) -> Router {
    let dim = 8 * 8 * 3;
    let artifact = ModelArtifact::new(
        (8, 8),
        vec!["planthopper".into(), "rice bug".into()],
        LinearSvm::new(vec![
            BinaryModel::constant(dim, false),
            BinaryModel::constant(dim, true),
        ]),
        None,
    );
    let pipeline = DiagnosisPipeline::new(PestClassifier::from_artifact(artifact).unwrap());
    let config = Config::new(
        "127.0.0.1:0".into(),
        "unused.json",
        upload_dir,
        Some(1),
        false,
    )
    .unwrap();

    create_app(AppState::new(config, pipeline))
}

fn png_bytes() -> Vec<u8> {
    let img = ImageBuffer::from_pixel(30, 17, Rgb([90u8, 60, 30]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

fn multipart_request(file_name: &str, data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/pestdetection")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn upload_returns_sorted_recommendation() {
    let dir = tempfile::tempdir().unwrap();
    let app = rice_bug_app(dir.path());

    let response = app
        .oneshot(multipart_request("../../etc/passwd.png", &png_bytes()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let data = &body["data"];
    assert_eq!(data["pest"], "Rice Bug");
    assert!(!data["soil_effect"].as_str().unwrap().is_empty());

    let prices: Vec<f64> = data["remedies"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["price"].as_f64().unwrap())
        .collect();
    assert!(!prices.is_empty());
    assert!(prices.windows(2).all(|w| w[0] <= w[1]));

    // 上传文件以服务端生成的名字保存在上传目录内
    let url = data["image_url"].as_str().unwrap();
    let stored = url.strip_prefix("/uploads/").unwrap();
    assert!(!stored.contains("passwd"));
    assert!(dir.path().join(stored).exists());
}

#[tokio::test]
async fn undecodable_upload_is_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let app = rice_bug_app(dir.path());

    let response = app
        .oneshot(multipart_request("bug.jpg", b"this is not an image"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "IMAGE_DECODE_ERROR");
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn missing_file_field_is_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let app = rice_bug_app(dir.path());

    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{b}--\r\n",
        b = BOUNDARY
    );
    let request = Request::builder()
        .method("POST")
        .uri("/pestdetection")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn json_prediction_accepts_base64() {
    let dir = tempfile::tempdir().unwrap();
    let app = rice_bug_app(dir.path());

    let encoded = base64::engine::general_purpose::STANDARD.encode(png_bytes());
    let request = Request::builder()
        .method("POST")
        .uri("/api/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .header("X-Request-ID", "req-123")
        .body(Body::from(
            serde_json::json!({ "image": format!("data:image/png;base64,{}", encoded) }).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["request_id"], "req-123");
    assert_eq!(body["data"]["pest"], "Rice Bug");
    assert!(body["data"].get("image_url").is_none());
}

#[tokio::test]
async fn empty_json_image_fails_validation() {
    let dir = tempfile::tempdir().unwrap();
    let app = rice_bug_app(dir.path());

    let request = Request::builder()
        .method("POST")
        .uri("/api/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"image": "   "}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn health_and_index_respond() {
    let dir = tempfile::tempdir().unwrap();
    let app = rice_bug_app(dir.path());

    let response = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
        "nosniff"
    );
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["classes"], 2);

    let response = app
        .clone()
        .oneshot(Request::get("/api/info").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["model"]["class_names"][1], "rice bug");

    let response = app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = response.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8_lossy(&html).contains("Rice Pest Detection"));
}
