//! Saving generated images and the session history to disk.

use crate::image::{ImageHandle, ImageStore};
use crate::models::GenerationResult;
use crate::Result;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DOWNLOAD_FILENAME: &str = "generated_image.jpg";

/// Write the image behind `handle` to `<dir>/generated_image.jpg`.
///
/// A missing or already released handle is a no-op and yields `Ok(None)`.
pub fn download(
    store: &ImageStore,
    handle: Option<&ImageHandle>,
    dir: &Path,
) -> Result<Option<PathBuf>> {
    let Some(handle) = handle else {
        return Ok(None);
    };
    let Some(image) = store.get(handle) else {
        warn!("Download skipped, {} is no longer available", handle);
        return Ok(None);
    };

    fs::create_dir_all(dir)?;
    let path = dir.join(DOWNLOAD_FILENAME);
    fs::write(&path, image.bytes.as_slice())?;
    info!("Saved image locally at: {}", path.display());
    Ok(Some(path))
}

/// Render the history panel as a standalone HTML page, oldest entry first.
pub fn render_history_html(history: &[GenerationResult], store: &ImageStore) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Image Generator History</title>\n</head>\n<body>\n<h2>History</h2>\n",
    );

    if history.is_empty() {
        html.push_str("<p>No history yet.</p>\n");
    }

    for entry in history {
        let prompt = escape_html(&entry.prompt);
        let _ = writeln!(html, "<div>\n<p>{}</p>", prompt);
        match store.data_url(&entry.image) {
            Some(src) => {
                let _ = writeln!(
                    html,
                    "<img src=\"{}\" alt=\"Generated for: {}\">",
                    src, prompt
                );
            }
            None => html.push_str("<p><em>image released</em></p>\n"),
        }
        let _ = writeln!(
            html,
            "<small>{}</small>\n</div>",
            entry.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }

    html.push_str("</body>\n</html>\n");
    html
}

pub fn export_history_html(
    history: &[GenerationResult],
    store: &ImageStore,
    path: &Path,
) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, render_history_html(history, store))?;
    info!(
        "Exported {} history entr{} to {}",
        history.len(),
        if history.len() == 1 { "y" } else { "ies" },
        path.display()
    );
    Ok(())
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
