//! Model acquisition.
//!
//! Keeps the download-on-first-use behavior out of the inference path: the
//! server calls [`ensure_model`] once at startup and hands the resulting path
//! to the detector. Tests pre-seed the cache directory and never touch the
//! network.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{MediaError, MediaResult};

/// Fixed upstream location of the YuNet 2023mar model.
pub const MODEL_URL: &str = "https://github.com/opencv/opencv_zoo/raw/main/models/face_detection_yunet/face_detection_yunet_2023mar.onnx";

/// Model file name under the local cache directory.
pub const MODEL_FILE_NAME: &str = "face_detection_yunet_2023mar.onnx";

/// Reject obviously truncated downloads.
const MIN_MODEL_BYTES: usize = 50_000;

/// Make sure the detection model exists under `model_dir`, downloading it
/// from [`MODEL_URL`] if absent. Returns the model path.
pub async fn ensure_model(model_dir: impl AsRef<Path>) -> MediaResult<PathBuf> {
    let model_dir = model_dir.as_ref();
    let model_path = model_dir.join(MODEL_FILE_NAME);

    if model_path.exists() {
        return Ok(model_path);
    }

    tokio::fs::create_dir_all(model_dir).await?;

    info!(url = MODEL_URL, "Downloading YuNet model");
    let response = reqwest::get(MODEL_URL)
        .await
        .map_err(|e| MediaError::download_failed(format!("request failed: {e}")))?;
    if !response.status().is_success() {
        return Err(MediaError::download_failed(format!(
            "HTTP {} from model host",
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| MediaError::download_failed(format!("read body: {e}")))?;
    if bytes.len() < MIN_MODEL_BYTES {
        return Err(MediaError::download_failed(format!(
            "model file appears truncated ({} bytes)",
            bytes.len()
        )));
    }

    // Stage under a temp name and rename so a partial write is never picked
    // up as a cached model.
    let staging_path = model_path.with_extension("onnx.partial");
    tokio::fs::write(&staging_path, &bytes).await?;
    tokio::fs::rename(&staging_path, &model_path).await?;

    info!(path = %model_path.display(), bytes = bytes.len(), "YuNet model cached");
    Ok(model_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn preseeded_model_is_returned_without_download() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MODEL_FILE_NAME);
        std::fs::write(&path, b"seed").unwrap();

        let resolved = ensure_model(dir.path()).await.unwrap();
        assert_eq!(resolved, path);
        // File untouched
        assert_eq!(std::fs::read(&path).unwrap(), b"seed");
    }
}
