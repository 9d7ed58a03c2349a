use image::DynamicImage;
use image::imageops::{self, FilterType};
use ndarray::Array4;

/// Converts a decoded image into the model's input batch.
///
/// The image is coerced to RGB (alpha dropped, grayscale expanded), resized to
/// exactly `width` x `height` and scaled from `[0, 255]` to `[0, 1]`. The result
/// has shape `[1, height, width, 3]`.
pub fn preprocess(image: &DynamicImage, width: u32, height: u32) -> Array4<f32> {
    let rgb = image.to_rgb8();
    let resized = if rgb.dimensions() == (width, height) {
        rgb
    } else {
        imageops::resize(&rgb, width, height, FilterType::CatmullRom)
    };

    Array4::from_shape_fn(
        (1, height as usize, width as usize, 3),
        |(_, y, x, c)| resized.get_pixel(x as u32, y as u32)[c] as f32 / 255.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

    fn in_unit_range(batch: &Array4<f32>) -> bool {
        batch.iter().all(|v| (0.0..=1.0).contains(v))
    }

    #[test]
    fn output_shape_is_fixed_regardless_of_input_size() {
        for (w, h) in [(150, 150), (640, 480), (31, 200), (1, 1)] {
            let image = DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
                Rgb([(x % 256) as u8, (y % 256) as u8, 128])
            }));
            let batch = preprocess(&image, 150, 150);
            assert_eq!(batch.shape(), &[1, 150, 150, 3]);
            assert!(in_unit_range(&batch));
        }
    }

    #[test]
    fn already_sized_image_keeps_exact_pixels() {
        let image = RgbImage::from_fn(150, 150, |x, y| Rgb([x as u8, y as u8, 255]));
        let batch = preprocess(&DynamicImage::ImageRgb8(image), 150, 150);

        assert_eq!(batch[[0, 10, 20, 0]], 20.0 / 255.0);
        assert_eq!(batch[[0, 10, 20, 1]], 10.0 / 255.0);
        assert_eq!(batch[[0, 10, 20, 2]], 1.0);
    }

    #[test]
    fn non_square_target_is_height_by_width() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(10, 10));
        let batch = preprocess(&image, 64, 32);
        assert_eq!(batch.shape(), &[1, 32, 64, 3]);
    }

    #[test]
    fn alpha_channel_is_discarded() {
        let image = RgbaImage::from_pixel(20, 20, Rgba([255, 0, 0, 0]));
        let batch = preprocess(&DynamicImage::ImageRgba8(image), 150, 150);

        assert_eq!(batch.shape(), &[1, 150, 150, 3]);
        assert_eq!(batch[[0, 75, 75, 0]], 1.0);
        assert_eq!(batch[[0, 75, 75, 1]], 0.0);
    }

    #[test]
    fn grayscale_is_expanded_to_three_channels() {
        let image = GrayImage::from_pixel(50, 80, Luma([51]));
        let batch = preprocess(&DynamicImage::ImageLuma8(image), 150, 150);

        let expected = 51.0 / 255.0;
        for c in 0..3 {
            assert!((batch[[0, 0, 0, c]] - expected).abs() < 1e-6);
        }
    }
}
