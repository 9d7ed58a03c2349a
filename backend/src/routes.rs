use crate::error::AppError;
use crate::intake::{InputError, decode_data_url, decode_image};
use crate::pipeline::{Decision, Pipeline};
use actix_files::Files;
use actix_multipart::Multipart;
use actix_web::http::header::{self, HeaderMap};
use actix_web::{HttpRequest, HttpResponse, web};
use futures::StreamExt;
use log::{error, info, warn};
use serde::Deserialize;
use serde_json::json;
use shared::{LabelsResponse, PredictionResponse};
use std::fmt;
use std::path::Path;
use std::time::Instant;
use uuid::Uuid;

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Multipart field names that may carry the image.
const IMAGE_FIELDS: [&str; 2] = ["file", "image"];

/// Largest accepted upload, in bytes.
#[derive(Debug, Clone, Copy)]
pub struct UploadLimit(pub usize);

#[derive(Deserialize)]
struct DataUrlRequest {
    image: Option<String>,
}

enum ImageUpload {
    Bytes(Vec<u8>),
    DataUrl(String),
}

impl fmt::Display for ImageUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageUpload::Bytes(bytes) => write!(f, "upload ({} bytes)", bytes.len()),
            ImageUpload::DataUrl(url) => write!(f, "data URL ({} chars)", url.len()),
        }
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig, dashboard_dir: &Path) {
    cfg.service(web::resource("/").route(web::get().to(index)))
        .service(web::resource("/predict").route(web::post().to(predict)))
        .service(web::resource("/api/health").route(web::get().to(health)))
        .service(web::resource("/api/labels").route(web::get().to(labels)));

    if dashboard_dir.is_dir() {
        cfg.service(Files::new("/dashboard", dashboard_dir).index_file("index.html"));
    } else {
        warn!(
            "Dashboard build not found at {}, /dashboard is disabled",
            dashboard_dir.display()
        );
    }
}

async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(INDEX_HTML)
}

async fn health(pipeline: web::Data<Pipeline>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "model": pipeline.model().describe(),
    }))
}

async fn labels(pipeline: web::Data<Pipeline>) -> HttpResponse {
    let config = pipeline.config();
    HttpResponse::Ok().json(LabelsResponse {
        class_names: config.class_names.clone(),
        target_size: config.target_size,
        confidence_threshold: config.confidence_threshold,
        margin_threshold: config.margin_threshold,
    })
}

/// Accepts either a multipart upload (`file` field) or a JSON body
/// `{"image": "data:image/...;base64,..."}`.
async fn predict(
    req: HttpRequest,
    payload: web::Payload,
    pipeline: web::Data<Pipeline>,
    limit: web::Data<UploadLimit>,
) -> Result<HttpResponse, AppError> {
    let request_id = Uuid::new_v4();
    let start = Instant::now();

    let outcome = match read_upload(req.headers(), payload, limit.0).await {
        Ok(upload) => {
            info!("[{}] Received {}", request_id, upload);
            run_pipeline(pipeline, upload).await
        }
        Err(e) => Err(e.into()),
    };

    match outcome {
        Ok(decision) => {
            info!(
                "[{}] {} in {:.1}ms",
                request_id,
                decision,
                start.elapsed().as_secs_f64() * 1000.0
            );
            Ok(HttpResponse::Ok().json(PredictionResponse::from(decision)))
        }
        Err(AppError::Input(e)) => {
            warn!("[{}] Rejected input: {}", request_id, e);
            Err(AppError::Input(e))
        }
        Err(e) => {
            error!("[{}] Prediction failed: {}", request_id, e);
            Err(e)
        }
    }
}

async fn run_pipeline(pipeline: web::Data<Pipeline>, upload: ImageUpload) -> Result<Decision, AppError> {
    web::block(move || -> Result<Decision, AppError> {
        let image = match upload {
            ImageUpload::Bytes(bytes) => decode_image(&bytes)?,
            ImageUpload::DataUrl(url) => decode_data_url(&url)?,
        };
        Ok(pipeline.classify(&image)?)
    })
    .await
    .map_err(|_| AppError::Blocking)?
}

async fn read_upload(
    headers: &HeaderMap,
    payload: web::Payload,
    limit: usize,
) -> Result<ImageUpload, InputError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with("multipart/form-data") {
        read_multipart(Multipart::new(headers, payload), limit)
            .await
            .map(ImageUpload::Bytes)
    } else if content_type.starts_with("application/json") {
        let body = read_body(payload, limit).await?;
        let request: DataUrlRequest =
            serde_json::from_slice(&body).map_err(|e| InputError::Json(e.to_string()))?;
        match request.image {
            Some(url) if !url.trim().is_empty() => Ok(ImageUpload::DataUrl(url)),
            _ => Err(InputError::MissingImage),
        }
    } else {
        Err(InputError::MissingImage)
    }
}

async fn read_multipart(mut multipart: Multipart, limit: usize) -> Result<Vec<u8>, InputError> {
    while let Some(item) = multipart.next().await {
        let mut field = item.map_err(|e| InputError::Multipart(e.to_string()))?;
        let is_image = field.name().is_some_and(|name| IMAGE_FIELDS.contains(&name));

        let mut image_data = Vec::new();
        while let Some(chunk) = field.next().await {
            let data = chunk.map_err(|e| InputError::Multipart(e.to_string()))?;
            if !is_image {
                continue;
            }
            if image_data.len() + data.len() > limit {
                return Err(InputError::PayloadTooLarge { limit });
            }
            image_data.extend_from_slice(&data);
        }

        if is_image && !image_data.is_empty() {
            return Ok(image_data);
        }
    }
    Err(InputError::MissingImage)
}

async fn read_body(mut payload: web::Payload, limit: usize) -> Result<Vec<u8>, InputError> {
    // Base64 inflates the image by a third.
    let limit = limit.saturating_mul(4) / 3 + 1024;
    let mut body = Vec::new();
    while let Some(chunk) = payload.next().await {
        let data = chunk.map_err(|e| InputError::Payload(e.to_string()))?;
        if body.len() + data.len() > limit {
            return Err(InputError::PayloadTooLarge { limit });
        }
        body.extend_from_slice(&data);
    }
    Ok(body)
}
