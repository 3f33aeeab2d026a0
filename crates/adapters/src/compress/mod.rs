use std::io::Cursor;
use std::path::Path;

use depth_view_application::{ApplicationError, ImageCompressor};
use depth_view_domain::{CompressionTarget, ImagePayload, MIME_JPEG, MIME_PNG};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use tracing::{debug, warn};

const JPEG_QUALITY_STEPS: [u8; 5] = [90, 80, 70, 55, 40];
const SHRINK_FACTOR: f64 = 0.75;
const MIN_DIMENSION: u32 = 16;

/// Bounds an image to the target dimension first, then to the byte ceiling.
#[derive(Debug, Default)]
pub struct ImageCrateCompressor;

impl ImageCompressor for ImageCrateCompressor {
    fn compress(
        &self,
        payload: ImagePayload,
        target: &CompressionTarget,
    ) -> Result<ImagePayload, ApplicationError> {
        let format = image::guess_format(payload.bytes())
            .map_err(|error| ApplicationError::Decode(error.to_string()))?;
        let image = image::load_from_memory_with_format(payload.bytes(), format)
            .map_err(|error| ApplicationError::Decode(error.to_string()))?;

        let fits_dimension = image.width().max(image.height()) <= target.max_dimension;
        if fits_dimension && payload.len() as u64 <= target.max_bytes {
            return Ok(payload);
        }

        let mut current = if fits_dimension {
            image
        } else {
            image.resize(target.max_dimension, target.max_dimension, FilterType::Lanczos3)
        };

        let (native_bytes, native_mime) = match format {
            ImageFormat::Png => (encode_png(&current)?, MIME_PNG),
            _ => (encode_jpeg(&current, JPEG_QUALITY_STEPS[0])?, MIME_JPEG),
        };
        if native_bytes.len() as u64 <= target.max_bytes {
            return Ok(finish(&payload, native_bytes, native_mime, &current));
        }

        let mut smallest = native_bytes;
        loop {
            for quality in JPEG_QUALITY_STEPS {
                let encoded = encode_jpeg(&current, quality)?;
                if encoded.len() as u64 <= target.max_bytes {
                    return Ok(finish(&payload, encoded, MIME_JPEG, &current));
                }
                if encoded.len() < smallest.len() {
                    smallest = encoded;
                }
            }

            let width = (f64::from(current.width()) * SHRINK_FACTOR) as u32;
            let height = (f64::from(current.height()) * SHRINK_FACTOR) as u32;
            if width.min(height) < MIN_DIMENSION {
                warn!(
                    file = payload.file_name(),
                    bytes = smallest.len(),
                    max_bytes = target.max_bytes,
                    "could not reach byte ceiling, sending smallest attempt"
                );
                return Ok(finish(&payload, smallest, MIME_JPEG, &current));
            }
            current = current.resize_exact(width, height, FilterType::Triangle);
        }
    }
}

fn finish(
    original: &ImagePayload,
    bytes: Vec<u8>,
    mime_type: &str,
    image: &DynamicImage,
) -> ImagePayload {
    debug!(
        file = original.file_name(),
        from = original.len(),
        to = bytes.len(),
        width = image.width(),
        height = image.height(),
        "compressed upload"
    );
    let extension = if mime_type == MIME_PNG { "png" } else { "jpg" };
    ImagePayload::new(
        with_extension(original.file_name(), extension),
        mime_type,
        bytes,
    )
}

fn with_extension(file_name: &str, extension: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .unwrap_or("image");
    format!("{stem}.{extension}")
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, ApplicationError> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|error| ApplicationError::Compression(error.to_string()))?;
    Ok(bytes)
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, ApplicationError> {
    let rgb = image.to_rgb8();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality)
        .encode_image(&rgb)
        .map_err(|error| ApplicationError::Compression(error.to_string()))?;
    Ok(bytes)
}
