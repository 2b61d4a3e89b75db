//! Production backend built on the `image` crate.
//!
//! Decoding and resizing are pure Rust. Output format is picked from the
//! output extension: AVIF (rav1e, speed 6), WebP (lossless), or JPEG.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};

use crate::backend::{Dimensions, ImageBackend, ImageError, ResizeJob};

/// Pure Rust backend using the `image` crate.
pub struct RasterBackend;

impl RasterBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RasterBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn load_image(path: &Path) -> Result<DynamicImage, ImageError> {
    ImageReader::open(path)
        .map_err(ImageError::Io)?
        .decode()
        .map_err(|e| ImageError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Encode to the output path, format inferred from the extension.
fn save_image(img: &DynamicImage, path: &Path, quality: u8) -> Result<(), ImageError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let file = File::create(path).map_err(ImageError::Io)?;
    let writer = BufWriter::new(file);

    let encoded = match ext.as_str() {
        "avif" => img.write_with_encoder(AvifEncoder::new_with_speed_quality(writer, 6, quality)),
        // The image crate's WebP encoder is lossless only; the quality knob
        // applies to AVIF and JPEG.
        "webp" => img.write_with_encoder(WebPEncoder::new_lossless(writer)),
        "jpg" | "jpeg" => img.write_with_encoder(JpegEncoder::new_with_quality(writer, quality)),
        other => return Err(ImageError::UnsupportedFormat(other.to_string())),
    };

    encoded.map_err(|e| ImageError::Encode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

impl ImageBackend for RasterBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, ImageError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| ImageError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Dimensions { width, height })
    }

    fn resize(&self, job: &ResizeJob) -> Result<(), ImageError> {
        let img = load_image(&job.source)?;
        let resized = img.resize_exact(job.width, job.height, FilterType::Lanczos3);
        save_image(&resized, &job.output, job.quality)
    }
}
