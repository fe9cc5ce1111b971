use super::{sniff_format, ImageHandle, IMAGE_MIME};
use base64::Engine as _;
use image::ImageFormat;
use std::collections::HashMap;
use std::sync::Arc;

/// Bytes and metadata behind a handle. Cheap to clone.
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub bytes: Arc<Vec<u8>>,
    pub mime: &'static str,
    pub format: Option<ImageFormat>,
}

/// Registry of live image handles for one session.
#[derive(Debug, Default)]
pub struct ImageStore {
    images: HashMap<ImageHandle, StoredImage>,
}

impl ImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a payload and hand out a fresh handle for it.
    pub fn acquire(&mut self, bytes: Vec<u8>) -> ImageHandle {
        let format = sniff_format(&bytes);
        let handle = ImageHandle::new();

        tracing::debug!(
            "Acquired {} ({} bytes, detected format: {:?})",
            handle,
            bytes.len(),
            format
        );

        self.images.insert(
            handle,
            StoredImage {
                bytes: Arc::new(bytes),
                mime: IMAGE_MIME,
                format,
            },
        );
        handle
    }

    pub fn get(&self, handle: &ImageHandle) -> Option<StoredImage> {
        self.images.get(handle).cloned()
    }

    pub fn contains(&self, handle: &ImageHandle) -> bool {
        self.images.contains_key(handle)
    }

    /// `data:` URL for inline display, `None` once the handle is released.
    pub fn data_url(&self, handle: &ImageHandle) -> Option<String> {
        self.images.get(handle).map(|image| {
            format!(
                "data:{};base64,{}",
                image.mime,
                base64::engine::general_purpose::STANDARD.encode(image.bytes.as_slice())
            )
        })
    }

    /// Invalidate a handle. Returns false if it was not live.
    pub fn release(&mut self, handle: &ImageHandle) -> bool {
        let released = self.images.remove(handle).is_some();
        if released {
            tracing::debug!("Released {}", handle);
        } else {
            tracing::warn!("Release of unknown image handle {}", handle);
        }
        released
    }

    pub fn release_all(&mut self) -> usize {
        let count = self.images.len();
        self.images.clear();
        if count > 0 {
            tracing::debug!("Released {} image handle(s)", count);
        }
        count
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
