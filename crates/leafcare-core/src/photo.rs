//! Upload validation and image normalization.
//!
//! Uploaded photos are bounded to [`DEFAULT_MAX_DIMENSION`] pixels on each
//! side (aspect ratio kept, never enlarged) and re-encoded as JPEG at
//! [`DEFAULT_JPEG_QUALITY`] before they are sent for identification or stored.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use tracing::debug;

use crate::error::{Error, Result};

/// MIME types accepted for upload.
pub const ALLOWED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

/// Default upload size limit (5 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Default bound on width and height after normalization.
pub const DEFAULT_MAX_DIMENSION: u32 = 1024;

/// Default JPEG quality after normalization.
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// MIME type of every normalized image.
pub const NORMALIZED_MIME_TYPE: &str = "image/jpeg";

/// Check an upload's declared type and size before decoding it.
///
/// # Errors
///
/// - [`Error::UnsupportedMediaType`] if `mime_type` is not in [`ALLOWED_MIME_TYPES`]
/// - [`Error::ImageTooLarge`] if `size` exceeds `max_bytes`
pub fn validate_upload(mime_type: &str, size: usize, max_bytes: usize) -> Result<()> {
    if !ALLOWED_MIME_TYPES.contains(&mime_type) {
        return Err(Error::UnsupportedMediaType(mime_type.to_string()));
    }
    if size > max_bytes {
        return Err(Error::ImageTooLarge {
            size,
            max: max_bytes,
        });
    }
    Ok(())
}

/// A resized, re-encoded image ready for identification and storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    /// MIME type of `bytes`.
    pub mime_type: &'static str,
    /// Encoded image data.
    pub bytes: Vec<u8>,
}

impl NormalizedImage {
    /// Encode as a `data:` URL.
    ///
    /// # Examples
    ///
    /// ```
    /// use leafcare_core::photo::NormalizedImage;
    ///
    /// let image = NormalizedImage { mime_type: "image/jpeg", bytes: vec![0xFF, 0xD8] };
    /// assert_eq!(image.data_url(), "data:image/jpeg;base64,/9g=");
    /// ```
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}

/// Resizes and re-encodes uploaded images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageNormalizer {
    max_dimension: u32,
    quality: u8,
}

impl Default for ImageNormalizer {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl ImageNormalizer {
    /// Create a normalizer with a custom bound and JPEG quality (1-100).
    pub fn new(max_dimension: u32, quality: u8) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
            quality: quality.clamp(1, 100),
        }
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Decode `data`, fit it inside the bound and re-encode it as JPEG.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Image`] if the bytes are not a decodable image.
    pub fn normalize(&self, data: &[u8]) -> Result<NormalizedImage> {
        let img = image::load_from_memory(data)?;
        let (width, height) = (img.width(), img.height());

        let img = if width > self.max_dimension || height > self.max_dimension {
            img.resize(self.max_dimension, self.max_dimension, FilterType::Lanczos3)
        } else {
            img
        };

        // JPEG has no alpha channel
        let rgb = img.to_rgb8();
        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, self.quality).encode_image(&rgb)?;

        debug!(
            "Normalized {}x{} image to {}x{} ({} bytes)",
            width,
            height,
            rgb.width(),
            rgb.height(),
            bytes.len()
        );

        Ok(NormalizedImage {
            mime_type: NORMALIZED_MIME_TYPE,
            bytes,
        })
    }
}

#[cfg(test)]
pub(crate) fn test_png(width: u32, height: u32) -> Vec<u8> {
    use std::io::Cursor;

    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([40, 160, 60, 255]));
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}
