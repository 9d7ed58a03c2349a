//! Turns request payloads into decoded bitmaps.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::DynamicImage;

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("No image data")]
    MissingImage,
    #[error("Malformed data URL: expected 'data:image/<type>;base64,<payload>'")]
    MalformedDataUrl,
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Could not decode image: {0}")]
    Undecodable(#[from] image::ImageError),
    #[error("Image exceeds the upload limit of {limit} bytes")]
    PayloadTooLarge { limit: usize },
    #[error("Invalid multipart upload: {0}")]
    Multipart(String),
    #[error("Invalid JSON body: {0}")]
    Json(String),
    #[error("Failed to read request body: {0}")]
    Payload(String),
}

/// Decodes an uploaded image, guessing the format from its content.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, InputError> {
    if bytes.is_empty() {
        return Err(InputError::MissingImage);
    }
    Ok(image::load_from_memory(bytes)?)
}

/// Returns the bytes carried by a `data:image/<type>;base64,<payload>` URL.
///
/// Only the part after the first comma is decoded; the media type prefix is
/// not checked.
pub fn extract_data_url(data_url: &str) -> Result<Vec<u8>, InputError> {
    let (_, payload) = data_url
        .split_once(',')
        .ok_or(InputError::MalformedDataUrl)?;
    let payload = payload.trim();
    if payload.is_empty() {
        return Err(InputError::MissingImage);
    }
    Ok(STANDARD.decode(payload)?)
}

pub fn decode_data_url(data_url: &str) -> Result<DynamicImage, InputError> {
    let bytes = extract_data_url(data_url)?;
    decode_image(&bytes)
}
