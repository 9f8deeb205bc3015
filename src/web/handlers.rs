use crate::{
    diagnosis::Diagnosis,
    image::ImageLoader,
    utils::error::PestError,
    web::{
        extractors::{RequestId, ValidatedJson},
        SharedState,
    },
    Result,
};
use axum::{
    body::Bytes,
    extract::{Multipart, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;

/// JSON请求体（base64模式）
#[derive(Debug, Deserialize)]
pub struct PredictJsonRequest {
    /// Base64编码的图像数据，可带数据URL前缀
    pub image: String,
}

/// JSON响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub timestamp: String,
    pub request_id: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, request_id: String) -> Self {
        Self {
            success: true,
            data,
            timestamp: chrono::Utc::now().to_rfc3339(),
            request_id,
        }
    }
}

/// 在阻塞线程池中执行CPU密集的识别
async fn diagnose(state: &SharedState, bytes: Bytes) -> Result<Diagnosis> {
    let state = SharedState::clone(state);
    tokio::task::spawn_blocking(move || state.pipeline.diagnose_bytes(&bytes))
        .await
        .map_err(|e| PestError::Internal(format!("Inference task failed: {}", e)))?
}

/// 用服务端生成的文件名保存上传图像，返回访问地址
async fn persist_upload(upload_dir: &Path, bytes: &[u8]) -> Result<String> {
    let format = ImageLoader::detect_format(bytes)
        .ok_or_else(|| PestError::UnsupportedFormat("unrecognized image format".to_string()))?;
    let file_name = format!(
        "{}.{}",
        uuid::Uuid::new_v4(),
        ImageLoader::extension_for(format)
    );

    tokio::fs::create_dir_all(upload_dir).await?;
    tokio::fs::write(upload_dir.join(&file_name), bytes).await?;

    tracing::debug!("Stored upload as {}", file_name);
    Ok(format!("/uploads/{}", file_name))
}

/// Multipart文件上传处理器
pub async fn upload_handler(
    State(state): State<SharedState>,
    RequestId(request_id): RequestId,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<Diagnosis>>> {
    let start_time = Instant::now();
    tracing::info!("Processing upload: request_id={}", request_id);

    let mut image_data: Option<Bytes> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        PestError::InvalidInput(format!("Failed to read multipart field: {}", e))
    })? {
        let field_name = field.name().unwrap_or("unknown").to_string();

        if field_name != "file" {
            tracing::debug!("Ignoring unknown field: {}", field_name);
            continue;
        }

        if field.file_name().map(str::is_empty).unwrap_or(false) {
            return Err(PestError::InvalidInput("No file selected".to_string()));
        }

        let data = field.bytes().await.map_err(|e| {
            PestError::InvalidInput(format!("Failed to read file data: {}", e))
        })?;

        if data.is_empty() {
            return Err(PestError::InvalidInput("Empty file".to_string()));
        }

        tracing::debug!("Received file: {} bytes", data.len());
        image_data = Some(data);
    }

    let image_data =
        image_data.ok_or_else(|| PestError::InvalidInput("No file uploaded".to_string()))?;

    let mut diagnosis = diagnose(&state, image_data.clone()).await?;
    diagnosis.image_url = Some(persist_upload(&state.config.upload_dir, &image_data).await?);

    tracing::info!(
        "Upload diagnosis completed: request_id={}, pest={}, time={:.3}s",
        request_id,
        diagnosis.pest,
        start_time.elapsed().as_secs_f32()
    );

    Ok(Json(ApiResponse::success(diagnosis, request_id)))
}

/// JSON base64上传处理器
pub async fn predict_json_handler(
    State(state): State<SharedState>,
    RequestId(request_id): RequestId,
    ValidatedJson(request): ValidatedJson<PredictJsonRequest>,
) -> Result<Json<ApiResponse<Diagnosis>>> {
    let start_time = Instant::now();
    tracing::info!("Processing JSON prediction: request_id={}", request_id);

    let bytes = ImageLoader::decode_base64(&request.image)?;
    let diagnosis = diagnose(&state, Bytes::from(bytes)).await?;

    tracing::info!(
        "JSON diagnosis completed: request_id={}, pest={}, time={:.3}s",
        request_id,
        diagnosis.pest,
        start_time.elapsed().as_secs_f32()
    );

    Ok(Json(ApiResponse::success(diagnosis, request_id)))
}
