use image::ImageFormat;

/// Best-effort detection of the encoded format of a payload.
///
/// The hosted API is trusted to return an image; an unrecognised payload is
/// logged and still accepted.
pub fn sniff_format(bytes: &[u8]) -> Option<ImageFormat> {
    match image::guess_format(bytes) {
        Ok(format) => Some(format),
        Err(_) => {
            tracing::warn!(
                "Unrecognized image format (first 4 bytes: {:02X?}), keeping payload as-is",
                &bytes[..bytes.len().min(4)]
            );
            None
        }
    }
}
