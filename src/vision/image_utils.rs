// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image validation and re-encoding for the food scanner
//!
//! Uploaded photos are decoded to prove they are real images, re-encoded in
//! the declared format and base64-encoded for the vision API.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use thiserror::Error;

/// Default maximum image size (20MB)
pub const MAX_IMAGE_SIZE: usize = 20 * 1024 * 1024;

/// Custom error types for image processing
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ImageError {
    #[error("Unsupported image format '{0}'. Please upload JPG or PNG.")]
    UnsupportedFormat(String),

    #[error("The uploaded file is not a valid image: {0}")]
    InvalidImage(String),

    #[error("Image data is too large: {0} bytes (max: {1} bytes)")]
    TooLarge(usize, usize),

    #[error("Failed to encode image: {0}")]
    EncodeFailed(String),
}

/// The two formats the scanner accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormatTag {
    Jpeg,
    Png,
}

impl ImageFormatTag {
    /// Parse a declared MIME type
    pub fn from_mime(mime: &str) -> Result<Self, ImageError> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" => Ok(ImageFormatTag::Jpeg),
            "image/png" => Ok(ImageFormatTag::Png),
            _ => Err(ImageError::UnsupportedFormat(mime.to_string())),
        }
    }

    /// Guess the MIME type from an upload's file name
    pub fn mime_from_filename(filename: &str) -> Option<&'static str> {
        let ext = filename.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some("image/jpeg"),
            "png" => Some("image/png"),
            _ => None,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ImageFormatTag::Jpeg => "image/jpeg",
            ImageFormatTag::Png => "image/png",
        }
    }

    pub fn image_format(&self) -> ImageFormat {
        match self {
            ImageFormatTag::Jpeg => ImageFormat::Jpeg,
            ImageFormatTag::Png => ImageFormat::Png,
        }
    }
}

/// Image information extracted during loading
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Size of the re-encoded image in bytes
    pub size_bytes: usize,
}

/// A validated upload, ready to be sent to the vision model
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub format: ImageFormatTag,
    pub base64: String,
    pub info: ImageInfo,
}

impl EncodedImage {
    pub fn data_url(&self) -> String {
        data_url(self.format.mime(), &self.base64)
    }
}

/// Decode raw image bytes (for multipart uploads)
pub fn decode_image_bytes(bytes: &[u8], max_bytes: usize) -> Result<DynamicImage, ImageError> {
    if bytes.len() > max_bytes {
        return Err(ImageError::TooLarge(bytes.len(), max_bytes));
    }
    if bytes.is_empty() {
        return Err(ImageError::InvalidImage("image data is empty".to_string()));
    }
    image::load_from_memory(bytes).map_err(|e| ImageError::InvalidImage(e.to_string()))
}

/// Re-encode a decoded image in the given format
pub fn encode_as(img: &DynamicImage, format: ImageFormatTag) -> Result<Vec<u8>, ImageError> {
    let mut buffer = Cursor::new(Vec::new());
    match format {
        // JPEG has no alpha channel
        ImageFormatTag::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8())
            .write_to(&mut buffer, ImageFormat::Jpeg),
        ImageFormatTag::Png => img.write_to(&mut buffer, ImageFormat::Png),
    }
    .map_err(|e| ImageError::EncodeFailed(e.to_string()))?;
    Ok(buffer.into_inner())
}

/// Validate, re-encode and base64-encode an upload under the default size limit
pub fn prepare_image(bytes: &[u8], mime: &str) -> Result<EncodedImage, ImageError> {
    prepare_image_within(bytes, mime, MAX_IMAGE_SIZE)
}

/// Validate, re-encode and base64-encode an upload of at most `max_bytes`.
///
/// The MIME type is checked before any decoding happens.
pub fn prepare_image_within(
    bytes: &[u8],
    mime: &str,
    max_bytes: usize,
) -> Result<EncodedImage, ImageError> {
    let format = ImageFormatTag::from_mime(mime)?;
    let img = decode_image_bytes(bytes, max_bytes)?;
    let encoded = encode_as(&img, format)?;

    Ok(EncodedImage {
        format,
        info: ImageInfo {
            width: img.width(),
            height: img.height(),
            size_bytes: encoded.len(),
        },
        base64: STANDARD.encode(&encoded),
    })
}

/// Encode image bytes to a base64 string suitable for the vision API
pub fn encode_image_to_base64(bytes: &[u8], mime: &str) -> Result<String, ImageError> {
    prepare_image(bytes, mime).map(|encoded| encoded.base64)
}

/// Build a `data:` URL for an encoded image
pub fn data_url(mime: &str, base64_image: &str) -> String {
    format!("data:{};base64,{}", mime, base64_image)
}
