//! Face mosaic (pixelation) transform.

use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::models::FaceBox;

/// Apply a pixelated mosaic to each face region.
///
/// The input raster is never modified; a transformed copy is returned.
/// Boxes must lie within the image bounds (the detector's clipping contract)
/// and are processed in input order, so overlapping regions resolve to the
/// last box that covers them.
///
/// The shrink averages the colors of each future block, and the
/// nearest-neighbor enlarge replicates them into visible squares.
pub fn apply_mosaic(image: &RgbImage, faces: &[FaceBox], pixel_size: u32) -> RgbImage {
    let pixel_size = pixel_size.max(1);
    let mut result = image.clone();

    for face in faces {
        let region =
            imageops::crop_imm(&result, face.x, face.y, face.width, face.height).to_image();

        // A box smaller than pixel_size still shrinks to at least 1x1.
        let small_w = (face.width / pixel_size).max(1);
        let small_h = (face.height / pixel_size).max(1);

        let shrunk = imageops::resize(&region, small_w, small_h, FilterType::Triangle);
        let blocky = imageops::resize(&shrunk, face.width, face.height, FilterType::Nearest);

        imageops::replace(&mut result, &blocky, i64::from(face.x), i64::from(face.y));
    }

    result
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
    fn empty_box_list_returns_identical_copy() {
        let img = gradient_image(50, 40);
        let result = apply_mosaic(&img, &[], 20);
        assert_eq!(result.as_raw(), img.as_raw());
    }

    #[test]
    fn input_raster_is_never_mutated() {
        let img = gradient_image(50, 40);
        let original = img.clone();
        let result = apply_mosaic(&img, &[FaceBox::new(5, 5, 30, 30)], 10);
        assert_eq!(img.as_raw(), original.as_raw());
        assert_ne!(result.as_raw(), img.as_raw());
    }

    #[test]
    fn output_dimensions_match_input() {
        let img = gradient_image(123, 77);
        let result = apply_mosaic(&img, &[FaceBox::new(10, 10, 50, 50)], 15);
        assert_eq!(result.dimensions(), img.dimensions());
    }

    #[test]
    fn pixels_outside_boxes_are_untouched() {
        let img = gradient_image(60, 60);
        let result = apply_mosaic(&img, &[FaceBox::new(20, 20, 20, 20)], 10);
        for (x, y, pixel) in img.enumerate_pixels() {
            let inside = (20..40).contains(&x) && (20..40).contains(&y);
            if !inside {
                assert_eq!(result.get_pixel(x, y), pixel, "pixel ({x},{y}) changed");
            }
        }
    }

    #[test]
    fn mosaic_produces_uniform_blocks() {
        let img = gradient_image(40, 40);
        let result = apply_mosaic(&img, &[FaceBox::new(0, 0, 40, 40)], 20);

        // 40x40 box at pixel_size 20 shrinks to 2x2, so the output is four
        // uniform 20x20 squares.
        for (block_x, block_y) in [(0u32, 0u32), (20, 0), (0, 20), (20, 20)] {
            let expected = *result.get_pixel(block_x, block_y);
            for dx in 0..20 {
                for dy in 0..20 {
                    assert_eq!(*result.get_pixel(block_x + dx, block_y + dy), expected);
                }
            }
        }
    }

    #[test]
    fn degenerate_box_smaller_than_pixel_size() {
        let img = gradient_image(50, 50);
        // 1x1 box with pixel_size 20 shrinks to the 1x1 minimum.
        let result = apply_mosaic(&img, &[FaceBox::new(10, 10, 1, 1)], 20);
        assert_eq!(result.dimensions(), (50, 50));
    }

    #[test]
    fn box_covering_whole_image() {
        let img = gradient_image(30, 30);
        let result = apply_mosaic(&img, &[FaceBox::new(0, 0, 30, 30)], 5);
        assert_eq!(result.dimensions(), (30, 30));
    }

    #[test]
    fn repeated_application_is_deterministic() {
        let img = gradient_image(80, 60);
        let boxes = [FaceBox::new(5, 5, 30, 30), FaceBox::new(40, 20, 25, 25)];
        let a = apply_mosaic(&img, &boxes, 12);
        let b = apply_mosaic(&img, &boxes, 12);
        assert_eq!(a.as_raw(), b.as_raw());
    }
}
