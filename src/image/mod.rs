//! Session-scoped image resources
//!
//! Received image payloads are registered in an [`ImageStore`] and referred
//! to through lightweight [`ImageHandle`]s, the same way a browser hands out
//! object URLs for blobs. Handles stay valid until they are released.

pub mod format;
pub mod store;

pub use format::sniff_format;
pub use store::{ImageStore, StoredImage};

use std::fmt;
use uuid::Uuid;

/// Mime type recorded for every payload, whatever the server claimed.
pub const IMAGE_MIME: &str = "image/jpeg";

const HANDLE_SCHEME: &str = "blob:image-generator";

/// Opaque reference to image bytes held by an [`ImageStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageHandle {
    id: Uuid,
}

impl ImageHandle {
    pub(crate) fn new() -> Self {
        Self { id: Uuid::new_v4() }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Displayable locator, e.g. `blob:image-generator/<uuid>`.
    pub fn url(&self) -> String {
        format!("{}/{}", HANDLE_SCHEME, self.id)
    }
}

impl fmt::Display for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url())
    }
}
