//! Image decode/encode and upload format negotiation.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage};

use crate::error::{MediaError, MediaResult};

/// Quality used for lossy re-encoding.
const JPEG_QUALITY: u8 = 90;

/// Upload formats accepted by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    Jpeg,
    Png,
    Webp,
}

impl UploadFormat {
    /// Parse from an upload `Content-Type` value.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        match content_type {
            "image/jpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::Webp),
            _ => None,
        }
    }

    /// Content type of the re-encoded response.
    ///
    /// PNG uploads stay PNG, everything else becomes JPEG.
    pub fn response_content_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg | Self::Webp => "image/jpeg",
        }
    }
}

/// Decode raw upload bytes into an RGB raster.
pub fn decode_rgb(bytes: &[u8]) -> MediaResult<RgbImage> {
    let decoded =
        image::load_from_memory(bytes).map_err(|e| MediaError::DecodeFailed(e.to_string()))?;
    Ok(decoded.to_rgb8())
}

/// Encode a raster in the response format for the given upload.
pub fn encode_response(image: &RgbImage, format: UploadFormat) -> MediaResult<Vec<u8>> {
    match format {
        UploadFormat::Png => encode_png(image),
        UploadFormat::Jpeg | UploadFormat::Webp => encode_jpeg(image, JPEG_QUALITY),
    }
}

fn encode_png(image: &RgbImage) -> MediaResult<Vec<u8>> {
    let mut buffer = Vec::new();
    PngEncoder::new(&mut buffer)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| MediaError::EncodeFailed(e.to_string()))?;
    Ok(buffer)
}

fn encode_jpeg(image: &RgbImage, quality: u8) -> MediaResult<Vec<u8>> {
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| MediaError::EncodeFailed(e.to_string()))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_image(width: u32, height: u32) -> RgbImage {
        let mut img = RgbImage::new(width, height);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = image::Rgb([(x % 256) as u8, (y % 256) as u8, 128]);
        }
        img
    }

    #[test]
    fn parses_allowed_content_types() {
        assert_eq!(
            UploadFormat::from_content_type("image/jpeg"),
            Some(UploadFormat::Jpeg)
        );
        assert_eq!(
            UploadFormat::from_content_type("image/png"),
            Some(UploadFormat::Png)
        );
        assert_eq!(
            UploadFormat::from_content_type("image/webp"),
            Some(UploadFormat::Webp)
        );
    }

    #[test]
    fn rejects_other_content_types() {
        assert_eq!(UploadFormat::from_content_type("image/gif"), None);
        assert_eq!(UploadFormat::from_content_type("text/plain"), None);
        assert_eq!(UploadFormat::from_content_type(""), None);
    }

    #[test]
    fn response_format_mirrors_input_family() {
        assert_eq!(UploadFormat::Png.response_content_type(), "image/png");
        assert_eq!(UploadFormat::Jpeg.response_content_type(), "image/jpeg");
        assert_eq!(UploadFormat::Webp.response_content_type(), "image/jpeg");
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode_rgb(b"not an image").is_err());
    }

    #[test]
    fn png_roundtrip_preserves_pixels() {
        let img = gradient_image(64, 48);
        let encoded = encode_response(&img, UploadFormat::Png).unwrap();
        let decoded = decode_rgb(&encoded).unwrap();
        assert_eq!(decoded.dimensions(), (64, 48));
        assert_eq!(decoded.as_raw(), img.as_raw());
    }

    #[test]
    fn jpeg_output_has_jpeg_magic() {
        let img = gradient_image(32, 32);
        let encoded = encode_response(&img, UploadFormat::Jpeg).unwrap();
        assert_eq!(encoded[0], 0xFF);
        assert_eq!(encoded[1], 0xD8);
    }

    #[test]
    fn webp_upload_reencodes_as_jpeg() {
        let img = gradient_image(32, 32);
        let encoded = encode_response(&img, UploadFormat::Webp).unwrap();
        assert_eq!(encoded[0], 0xFF);
        assert_eq!(encoded[1], 0xD8);
    }
}
