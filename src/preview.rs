//! Selected image and the on-screen preview derived from it.

use std::path::Path;
use std::sync::Arc;

use eframe::egui;

/// Longest edge of the decoded preview; the uploaded file is never resized.
const PREVIEW_MAX_EDGE: u32 = 1024;

/// The file the user picked. Bytes are sent as-is; nothing checks that they
/// are actually an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedImage {
    pub(crate) selection_id: u64,
    pub file_name: String,
    pub bytes: Arc<[u8]>,
}

impl SelectedImage {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            selection_id: 0,
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Ok(Self::new(file_name, bytes))
    }

    /// Changes every time a new file is selected, even if it is the same file.
    pub fn selection_id(&self) -> u64 {
        self.selection_id
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Decode the image bytes into preview pixels, `None` if they are not a
/// format the `image` crate understands.
pub fn decode_preview(bytes: &[u8]) -> Option<egui::ColorImage> {
    let img = match image::load_from_memory(bytes) {
        Ok(img) => img,
        Err(e) => {
            tracing::warn!("preview decode failed: {}", e);
            return None;
        }
    };
    let img = if img.width() > PREVIEW_MAX_EDGE || img.height() > PREVIEW_MAX_EDGE {
        img.thumbnail(PREVIEW_MAX_EDGE, PREVIEW_MAX_EDGE)
    } else {
        img
    };
    let rgba = img.to_rgba8();
    let (w, h) = rgba.dimensions();
    Some(egui::ColorImage::from_rgba_unmultiplied(
        [w as usize, h as usize],
        &rgba,
    ))
}

/// Owns the preview handle for the current selection.
///
/// A handle is created at most once per selection and dropped exactly once:
/// when a different selection replaces it, when the selection is cleared,
/// or when the slot itself is dropped.
pub struct PreviewSlot<H> {
    // Inner `None` records a selection whose preview could not be built.
    current: Option<(u64, Option<H>)>,
}

impl<H> Default for PreviewSlot<H> {
    fn default() -> Self {
        Self { current: None }
    }
}

impl<H> PreviewSlot<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring the slot in line with `selection`, building a handle with `make`
    /// only when the selection changed.
    pub fn sync<F>(&mut self, selection: Option<u64>, make: F) -> Option<&H>
    where
        F: FnOnce() -> Option<H>,
    {
        let stale = match (&self.current, selection) {
            (Some((held, _)), Some(id)) => *held != id,
            (Some(_), None) => true,
            (None, _) => false,
        };
        if stale {
            self.release();
        }
        if self.current.is_none() {
            if let Some(id) = selection {
                self.current = Some((id, make()));
            }
        }
        self.get()
    }

    pub fn get(&self) -> Option<&H> {
        self.current.as_ref().and_then(|(_, h)| h.as_ref())
    }

    pub fn release(&mut self) {
        if let Some((id, handle)) = self.current.take() {
            if handle.is_some() {
                tracing::debug!("released preview for selection {}", id);
            }
        }
    }
}
