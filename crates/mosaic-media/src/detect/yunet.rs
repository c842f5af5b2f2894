//! YuNet face detector on ONNX Runtime.
//!
//! Decodes the raw network output the way OpenCV's FaceDetectorYN does:
//! per-stride classification/objectness/box maps, exp-decoded sizes, score
//! filtering, then greedy IoU suppression. Input is zero-padded to the
//! 32-pixel feature-map alignment and fed at its exact (padded) dimensions,
//! so inference adapts to every upload size.

use std::path::Path;
use std::sync::Mutex;

use image::RgbImage;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{Tensor, Value};
use tracing::{debug, info};

use super::{DetectorConfig, FaceDetector};
use crate::error::{MediaError, MediaResult};
use crate::models::{FaceBox, RawDetection};

/// Feature map strides of the YuNet backbone.
const STRIDES: [u32; 3] = [8, 16, 32];

/// Input padding alignment required by the feature maps.
const PAD_ALIGNMENT: u32 = 32;

/// Reject model files that are too small to be real.
const MIN_MODEL_BYTES: u64 = 50_000;

/// Face detector wrapping the YuNet ONNX model.
///
/// The session is loaded once and shared across requests. ONNX Runtime
/// sessions are not reentrant, so inference serializes on a mutex.
pub struct YuNetDetector {
    session: Mutex<Session>,
    config: DetectorConfig,
}

impl YuNetDetector {
    /// Load the model from `model_path` with the given thresholds.
    pub fn load(model_path: impl AsRef<Path>, config: DetectorConfig) -> MediaResult<Self> {
        config.validate()?;
        let model_path = model_path.as_ref();

        let metadata = std::fs::metadata(model_path)
            .map_err(|_| MediaError::ModelNotFound(model_path.to_path_buf()))?;
        if metadata.len() < MIN_MODEL_BYTES {
            return Err(MediaError::detection_failed(format!(
                "model file appears corrupted (size: {} bytes)",
                metadata.len()
            )));
        }

        let model_bytes = std::fs::read(model_path)?;
        let session = Session::builder()
            .map_err(|e| MediaError::detection_failed(format!("ORT session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| MediaError::detection_failed(format!("ORT opt level: {e}")))?
            .commit_from_memory(&model_bytes)
            .map_err(|e| MediaError::detection_failed(format!("ORT load model: {e}")))?;

        info!(model = %model_path.display(), "YuNet detector initialized");

        Ok(Self {
            session: Mutex::new(session),
            config,
        })
    }

    /// Thresholds this detector was constructed with.
    pub fn config(&self) -> DetectorConfig {
        self.config
    }
}

impl FaceDetector for YuNetDetector {
    fn detect(&self, image: &RgbImage, score_threshold: Option<f32>) -> MediaResult<Vec<FaceBox>> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Ok(Vec::new());
        }

        let threshold = score_threshold.unwrap_or(self.config.score_threshold);
        let (pad_w, pad_h) = padded_size(width, height);
        let input = preprocess(image, pad_w, pad_h)?;

        let mut candidates = Vec::new();
        {
            let mut session = self
                .session
                .lock()
                .map_err(|_| MediaError::detection_failed("ORT session poisoned"))?;
            let outputs = session
                .run(ort::inputs![input])
                .map_err(|e| MediaError::detection_failed(format!("ORT run failed: {e}")))?;

            for &stride in &STRIDES {
                let cols = pad_w / stride;
                let rows = pad_h / stride;
                let count = (cols * rows) as usize;

                let cls_name = format!("cls_{stride}");
                let obj_name = format!("obj_{stride}");
                let bbox_name = format!("bbox_{stride}");
                let cls = tensor_data(outputs.get(cls_name.as_str()), &cls_name, count)?;
                let obj = tensor_data(outputs.get(obj_name.as_str()), &obj_name, count)?;
                let bbox = tensor_data(outputs.get(bbox_name.as_str()), &bbox_name, count * 4)?;

                decode_stride(&cls, &obj, &bbox, stride, cols, threshold, &mut candidates);
            }
        }

        let kept = non_max_suppression(candidates, self.config.nms_threshold);
        let faces = clip_to_image(&kept, width, height);

        debug!(
            candidates = kept.len(),
            faces = faces.len(),
            "YuNet detection completed"
        );
        Ok(faces)
    }
}

/// Round dimensions up to the feature-map alignment.
fn padded_size(width: u32, height: u32) -> (u32, u32) {
    let pad = |v: u32| v.div_ceil(PAD_ALIGNMENT) * PAD_ALIGNMENT;
    (pad(width), pad(height))
}

/// Convert the raster into the BGR float CHW tensor YuNet expects,
/// zero-padded right and bottom to the aligned input size.
fn preprocess(image: &RgbImage, pad_w: u32, pad_h: u32) -> MediaResult<Value> {
    let area = (pad_w * pad_h) as usize;
    let mut data = vec![0f32; 3 * area];

    for (x, y, pixel) in image.enumerate_pixels() {
        let idx = (y * pad_w + x) as usize;
        // BGR channel order, raw 0-255 values
        data[idx] = f32::from(pixel[2]);
        data[area + idx] = f32::from(pixel[1]);
        data[2 * area + idx] = f32::from(pixel[0]);
    }

    let shape = vec![1usize, 3, pad_h as usize, pad_w as usize];
    Tensor::from_array((shape, data.into_boxed_slice()))
        .map(Value::from)
        .map_err(|e| MediaError::detection_failed(format!("failed to create input tensor: {e}")))
}

/// Extract a named float output, checking its element count.
fn tensor_data(value: Option<&Value>, name: &str, expected: usize) -> MediaResult<Vec<f32>> {
    let value = value
        .ok_or_else(|| MediaError::detection_failed(format!("missing output tensor {name}")))?;
    let tensor = value
        .try_extract_tensor::<f32>()
        .map_err(|e| MediaError::detection_failed(format!("extract {name}: {e}")))?;
    let data = tensor.1;
    if data.len() != expected {
        return Err(MediaError::detection_failed(format!(
            "output {name} has {} elements, expected {expected}",
            data.len()
        )));
    }
    Ok(data.to_vec())
}

/// Decode one stride's score and box maps into detection candidates.
///
/// Per cell: score = sqrt(cls * obj) with both clamped to [0, 1]; the box
/// center is offset from the cell in stride units and the size is
/// exp-decoded, also in stride units.
fn decode_stride(
    cls: &[f32],
    obj: &[f32],
    bbox: &[f32],
    stride: u32,
    cols: u32,
    threshold: f32,
    out: &mut Vec<RawDetection>,
) {
    let s = stride as f32;
    for idx in 0..cls.len() {
        let cls_score = cls[idx].clamp(0.0, 1.0);
        let obj_score = obj[idx].clamp(0.0, 1.0);
        let score = (cls_score * obj_score).sqrt();
        if score < threshold {
            continue;
        }

        let row = (idx as u32 / cols) as f32;
        let col = (idx as u32 % cols) as f32;

        let cx = (col + bbox[idx * 4]) * s;
        let cy = (row + bbox[idx * 4 + 1]) * s;
        let w = bbox[idx * 4 + 2].exp() * s;
        let h = bbox[idx * 4 + 3].exp() * s;

        out.push(RawDetection {
            x: cx - w / 2.0,
            y: cy - h / 2.0,
            width: w,
            height: h,
            score,
        });
    }
}

/// Greedy IoU suppression, visiting candidates in descending score order.
fn non_max_suppression(mut detections: Vec<RawDetection>, nms_threshold: f32) -> Vec<RawDetection> {
    if detections.is_empty() {
        return detections;
    }

    detections.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    let mut suppressed = vec![false; detections.len()];

    for i in 0..detections.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(detections[i]);

        for j in (i + 1)..detections.len() {
            if suppressed[j] {
                continue;
            }
            if detections[i].iou(&detections[j]) > nms_threshold {
                suppressed[j] = true;
            }
        }
    }

    keep
}

/// Truncate, clamp, and filter raw detections against the image bounds.
///
/// Origins past the image edge are discarded outright instead of relying on
/// the width/height clamp to go non-positive.
fn clip_to_image(detections: &[RawDetection], image_width: u32, image_height: u32) -> Vec<FaceBox> {
    let img_w = i64::from(image_width);
    let img_h = i64::from(image_height);

    let mut faces = Vec::with_capacity(detections.len());
    for det in detections {
        let x = (det.x as i64).max(0);
        let y = (det.y as i64).max(0);
        if x >= img_w || y >= img_h {
            continue;
        }

        let w = (det.width as i64).min(img_w - x);
        let h = (det.height as i64).min(img_h - y);
        if w <= 0 || h <= 0 {
            continue;
        }

        faces.push(FaceBox::new(x as u32, y as u32, w as u32, h as u32));
    }
    faces
}
