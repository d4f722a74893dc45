use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use tracing::debug;

use crate::core::error::{AgentError, Result};

/// Images at or under this size are uploaded as-is.
const TARGET_SIZE_KB: usize = 100;
const MAX_WIDTH: u32 = 1200;
const START_QUALITY: u8 = 85;
const QUALITY_STEP: u8 = 5;
const MIN_QUALITY: u8 = 10;

#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Reads a local image and, when it exceeds the size target, re-encodes it
/// as a width-capped JPEG with a descending quality ladder.
pub fn prepare_image(path: &Path) -> Result<ImagePayload> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| AgentError::upload(format!("cannot read image {}: {}", path.display(), e)))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("featured-image")
        .to_string();

    if metadata.len() <= (TARGET_SIZE_KB * 1024) as u64 {
        let bytes = std::fs::read(path).map_err(|e| {
            AgentError::upload(format!("cannot read image {}: {}", path.display(), e))
        })?;
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        return Ok(ImagePayload {
            file_name,
            bytes,
            content_type,
        });
    }

    let img = image::open(path)
        .map_err(|e| AgentError::upload(format!("cannot decode image {}: {}", path.display(), e)))?;
    let bytes = shrink_to_jpeg(img, MAX_WIDTH, TARGET_SIZE_KB * 1024)?;
    debug!(
        "optimized {} from {} to {} bytes",
        path.display(),
        metadata.len(),
        bytes.len()
    );

    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("featured-image");
    Ok(ImagePayload {
        file_name: format!("{}.jpg", stem),
        bytes,
        content_type: "image/jpeg".to_string(),
    })
}

pub(crate) fn shrink_to_jpeg(
    img: DynamicImage,
    max_width: u32,
    target_bytes: usize,
) -> Result<Vec<u8>> {
    let img = if img.width() > max_width {
        let height =
            ((img.height() as u64 * max_width as u64) / img.width() as u64).max(1) as u32;
        img.resize_exact(max_width, height, FilterType::Triangle)
    } else {
        img
    };
    // JPEG has no alpha channel.
    let rgb = img.to_rgb8();

    let mut quality = START_QUALITY;
    let mut out = encode_jpeg(&rgb, quality)?;
    while out.len() > target_bytes && quality > MIN_QUALITY {
        quality -= QUALITY_STEP;
        out = encode_jpeg(&rgb, quality)?;
    }
    Ok(out)
}

fn encode_jpeg(rgb: &image::RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
    encoder
        .encode_image(rgb)
        .map_err(|e| AgentError::upload(format!("jpeg encoding failed: {}", e)))?;
    Ok(out)
}
