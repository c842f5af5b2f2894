//! Image decoding, face detection, and the mosaic transform for the
//! FaceMosaic service.
//!
//! This crate provides:
//! - RGB decode/encode with response-format mirroring
//! - YuNet face detection through ONNX Runtime
//! - The pixelation transform applied to detected face regions
//! - One-time model acquisition for the detector

pub mod codec;
pub mod detect;
pub mod error;
pub mod models;
pub mod mosaic;

pub use codec::{decode_rgb, encode_response, UploadFormat};
pub use detect::{ensure_model, DetectorConfig, FaceDetector, YuNetDetector};
pub use error::{MediaError, MediaResult};
pub use models::FaceBox;
pub use mosaic::apply_mosaic;
