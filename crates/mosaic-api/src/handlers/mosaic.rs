//! Mosaic endpoint handler.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Query, State};
use axum::http::{header, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::info;

use mosaic_media::{apply_mosaic, decode_rgb, encode_response, MediaError, UploadFormat};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Response header carrying the number of detected faces.
pub const FACES_DETECTED_HEADER: &str = "x-faces-detected";

/// Mosaic block size bounds, enforced before any handler logic runs.
const MIN_PIXEL_SIZE: u32 = 1;
const MAX_PIXEL_SIZE: u32 = 100;
const DEFAULT_PIXEL_SIZE: u32 = 20;

/// Query parameters for the mosaic endpoint.
#[derive(Debug, Deserialize)]
pub struct MosaicQuery {
    pub pixel_size: Option<u32>,
}

/// Apply a face mosaic to an uploaded image.
///
/// Accepts a multipart `file` field, pixelates every detected face region,
/// and returns the re-encoded image with an `X-Faces-Detected` header. The
/// output format mirrors the input: PNG stays PNG, JPEG and WebP come back
/// as JPEG.
pub async fn create_mosaic(
    State(state): State<AppState>,
    Query(query): Query<MosaicQuery>,
    mut multipart: Multipart,
) -> ApiResult<Response> {
    let pixel_size = query.pixel_size.unwrap_or(DEFAULT_PIXEL_SIZE);
    if !(MIN_PIXEL_SIZE..=MAX_PIXEL_SIZE).contains(&pixel_size) {
        return Err(ApiError::validation(format!(
            "pixel_size must be between {MIN_PIXEL_SIZE} and {MAX_PIXEL_SIZE}"
        )));
    }

    let (format, data) = read_upload(&mut multipart).await?;

    if data.len() > state.config.max_upload_bytes {
        return Err(ApiError::payload_too_large(
            "File too large. Maximum size is 10MB.",
        ));
    }

    let image = decode_rgb(&data).map_err(|_| ApiError::bad_request("Invalid image data."))?;

    // Detection and pixelation are CPU-bound; keep them off the async
    // executor.
    let detector = Arc::clone(&state.detector);
    let (body, face_count) = tokio::task::spawn_blocking(move || {
        let faces = detector.detect(&image, None)?;
        let result = apply_mosaic(&image, &faces, pixel_size);
        let encoded = encode_response(&result, format)?;
        Ok::<_, MediaError>((encoded, faces.len()))
    })
    .await
    .map_err(|e| ApiError::internal(format!("mosaic task failed: {e}")))??;

    info!(faces = face_count, pixel_size, "Applied mosaic");

    Ok((
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                format.response_content_type().to_string(),
            ),
            (
                HeaderName::from_static(FACES_DETECTED_HEADER),
                face_count.to_string(),
            ),
        ],
        body,
    )
        .into_response())
}

/// Pull the `file` field out of the multipart body, validating its content
/// type against the upload allow-set.
async fn read_upload(multipart: &mut Multipart) -> ApiResult<(UploadFormat, Bytes)> {
    while let Some(field) = multipart.next_field().await.map_err(map_multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field
            .content_type()
            .ok_or_else(|| ApiError::bad_request("Missing content type on file upload"))?;
        let format = UploadFormat::from_content_type(content_type).ok_or_else(|| {
            ApiError::bad_request("Unsupported image format. Use JPEG, PNG, or WebP.")
        })?;

        let data = field.bytes().await.map_err(map_multipart_error)?;
        return Ok((format, data));
    }

    Err(ApiError::bad_request("Missing 'file' upload field"))
}

fn map_multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large("File too large. Maximum size is 10MB.")
    } else {
        ApiError::bad_request(format!("Invalid multipart body: {}", err.body_text()))
    }
}
