//! Pure Rust image processing backend built on the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, WebP) | `image::ImageReader` with format sniffing |
//! | Identify | `image::image_dimensions` |
//! | Scale | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode JPEG | `JpegEncoder::new_with_quality` |
//! | Encode other formats | `DynamicImage::save` (format from extension) |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::ThumbnailParams;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::BufWriter;
use std::path::Path;

/// Pure Rust backend using the `image` crate ecosystem.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Save an image, choosing the encoder from the path's extension.
fn save_image(img: &DynamicImage, path: &Path, quality: u8) -> Result<(), BackendError> {
    let format = ImageFormat::from_path(path).map_err(|_| {
        BackendError::ProcessingFailed(format!("Unsupported output format: {}", path.display()))
    })?;

    match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let writer = BufWriter::new(std::fs::File::create(path)?);
            rgb.write_with_encoder(JpegEncoder::new_with_quality(writer, quality))
                .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))
        }
        _ => img.save_with_format(path, format).map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to save {}: {}", path.display(), e))
        }),
    }
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
        })?;
        Ok(Dimensions { width, height })
    }

    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let scaled = img.resize_exact(params.width, params.height, FilterType::Lanczos3);
        save_image(&scaled, &params.output, params.quality.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::Quality;
    use image::{ImageEncoder, RgbImage, RgbaImage};

    fn create_test_jpeg(path: &Path, width: u32, height: u32) {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let file = std::fs::File::create(path).unwrap();
        let writer = std::io::BufWriter::new(file);
        image::codecs::jpeg::JpegEncoder::new(writer)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
    }

    fn params(source: &Path, output: &Path, width: u32, height: u32) -> ThumbnailParams {
        ThumbnailParams {
            source: source.to_path_buf(),
            output: output.to_path_buf(),
            width,
            height,
            quality: Quality::default(),
        }
    }

    #[test]
    fn identify_synthetic_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 200, 150);

        let dims = RustBackend::new().identify(&path).unwrap();
        assert_eq!(dims.width, 200);
        assert_eq!(dims.height, 150);
    }

    #[test]
    fn identify_nonexistent_file_errors() {
        let result = RustBackend::new().identify(Path::new("/nonexistent/image.jpg"));
        assert!(result.is_err());
    }

    #[test]
    fn thumbnail_jpeg_exact_dimensions() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 400, 300);
        let output = tmp.path().join("source[200x].jpg");

        let backend = RustBackend::new();
        backend
            .thumbnail(&params(&source, &output, 200, 150))
            .unwrap();

        assert_eq!(image::image_dimensions(&output).unwrap(), (200, 150));
    }

    #[test]
    fn thumbnail_png_with_alpha_to_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("logo.png");
        RgbaImage::from_pixel(64, 32, image::Rgba([10, 20, 30, 128]))
            .save(&source)
            .unwrap();
        let output = tmp.path().join("logo[32x].jpg");

        RustBackend::new()
            .thumbnail(&params(&source, &output, 32, 16))
            .unwrap();

        assert_eq!(image::image_dimensions(&output).unwrap(), (32, 16));
    }

    #[test]
    fn thumbnail_keeps_png_format() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("icon.png");
        RgbImage::from_pixel(50, 50, image::Rgb([200, 0, 0]))
            .save(&source)
            .unwrap();
        let output = tmp.path().join("icon[x10].png");

        RustBackend::new()
            .thumbnail(&params(&source, &output, 10, 10))
            .unwrap();

        assert_eq!(
            ImageFormat::from_path(&output).unwrap(),
            ImageFormat::Png
        );
        assert_eq!(image::image_dimensions(&output).unwrap(), (10, 10));
    }

    #[test]
    fn thumbnail_unsupported_output_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 40, 40);

        let result = RustBackend::new().thumbnail(&params(
            &source,
            &tmp.path().join("out.unknown"),
            20,
            20,
        ));
        assert!(result.is_err());
    }
}
