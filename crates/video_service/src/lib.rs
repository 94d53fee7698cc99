use axum::{
    Json, Router,
    body::Body,
    extract::{Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{any, get},
};
use chrono::{SecondsFormat, Utc};
use delegate::{DelegateError, VideoDelegate};
use domain::{Format, FormatSelection, HealthResponse, VideoInfo};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

const FETCH_FAILED: &str = "Failed to fetch video information";
const DOWNLOAD_FAILED: &str = "Failed to download video";

#[derive(Debug, Deserialize)]
pub struct VideoInfoParams {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadParams {
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub quality: Option<String>,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Every failure a request can end in. Causes are logged, never sent.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("URL is required")]
    MissingInput,

    #[error("{0}")]
    InvalidUrl(&'static str),

    #[error("{0}")]
    FetchFailure(&'static str),

    #[error("Format not available")]
    FormatUnavailable,

    #[error("Endpoint not found")]
    UnknownEndpoint,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingInput | ApiError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            ApiError::FormatUnavailable | ApiError::UnknownEndpoint => StatusCode::NOT_FOUND,
            ApiError::FetchFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

fn fetch_failure(
    delegate: &dyn VideoDelegate,
    url: &str,
    message: &'static str,
) -> impl FnOnce(DelegateError) -> ApiError {
    let name = delegate.name();
    let url = url.to_string();
    move |e| {
        error!(delegate = name, %url, error = ?e, "{message}");
        ApiError::FetchFailure(message)
    }
}

/// Handler for `/api/video-info`
async fn video_info(
    State(delegate): State<Arc<dyn VideoDelegate>>,
    Query(params): Query<VideoInfoParams>,
) -> Result<Json<VideoInfo>, ApiError> {
    let url = params
        .url
        .filter(|url| !url.is_empty())
        .ok_or(ApiError::MissingInput)?;

    if !validation::validate_url(&url) {
        return Err(ApiError::InvalidUrl("Invalid YouTube URL"));
    }

    let details = delegate
        .get_info(&url)
        .await
        .map_err(fetch_failure(delegate.as_ref(), &url, FETCH_FAILED))?;

    let info = VideoInfo::from_details(&details).ok_or_else(|| {
        error!(%url, "delegate returned no thumbnails");
        ApiError::FetchFailure(FETCH_FAILED)
    })?;

    Ok(Json(info))
}

/// Handler for `/api/download`
async fn download(
    State(delegate): State<Arc<dyn VideoDelegate>>,
    Query(params): Query<DownloadParams>,
) -> Result<Response, ApiError> {
    let video_id = params.video_id.as_deref().unwrap_or_default();
    let url = validation::watch_url(video_id);
    if !validation::validate_video_id(video_id) || !validation::validate_url(&url) {
        return Err(ApiError::InvalidUrl("Invalid video ID"));
    }

    // Fetched again on purpose: nothing is kept between requests
    let details = delegate
        .get_info(&url)
        .await
        .map_err(fetch_failure(delegate.as_ref(), &url, DOWNLOAD_FAILED))?;

    let selection = params
        .quality
        .as_deref()
        .filter(|quality| !quality.is_empty())
        .map(FormatSelection::from_token)
        .unwrap_or_default();

    let format = delegate
        .choose_format(&details.formats, &selection)
        .ok_or(ApiError::FormatUnavailable)?;

    // Title goes in unsanitized; only values HTTP cannot carry are refused
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}.{}\"",
        details.title, format.container
    ))
    .map_err(|e| {
        error!(%url, title = %details.title, error = %e, "title is not a valid header value");
        ApiError::FetchFailure(DOWNLOAD_FAILED)
    })?;

    let stream = delegate
        .open_stream(&url, &format)
        .await
        .map_err(fetch_failure(delegate.as_ref(), &url, DOWNLOAD_FAILED))?;

    info!(
        video_id = %details.video_id,
        itag = %format.itag,
        container = %format.container,
        "streaming download"
    );

    let headers = [
        (header::CONTENT_TYPE, content_type(&format)),
        (header::CONTENT_DISPOSITION, disposition),
    ];
    Ok((headers, Body::from_stream(stream)).into_response())
}

fn content_type(format: &Format) -> HeaderValue {
    let audio = format.is_audio_only();
    let mime = match format.container.as_str() {
        "mp4" if audio => "audio/mp4",
        "mp4" => "video/mp4",
        "m4a" => "audio/mp4",
        "webm" if audio => "audio/webm",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        _ => "application/octet-stream",
    };
    HeaderValue::from_static(mime)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

async fn unknown_endpoint() -> ApiError {
    ApiError::UnknownEndpoint
}

/// Create the router for the video API
pub fn create_router(delegate: Arc<dyn VideoDelegate>) -> Router {
    Router::new()
        .route("/api/video-info", get(video_info))
        .route("/api/download", get(download))
        .route("/api/{*rest}", any(unknown_endpoint))
        .route("/health", get(health))
        .with_state(delegate)
}
