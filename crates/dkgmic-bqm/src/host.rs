//! Host collaborators: the batch queue item being processed and the queue
//! preview source used by the filter picker.
//!
//! Both are passed in by the caller; nothing here reaches for a global host
//! interface.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::action::FilterAction;
use crate::buffer::{host_to_engine, EngineImage, HostImage};
use crate::engine::InputMode;
use crate::error::BqmResult;

/// Longest side of queue previews.
pub const PREVIEW_SIZE: u32 = 1024;

/// Name given to preview images inside the engine.
const PREVIEW_IMAGE_NAME: &str = "Batch Queue Manager Item Preview";

/// The queued image a batch tool works on.
pub trait BatchHost {
    /// Loads the current image.
    fn load_image(&mut self) -> BqmResult<HostImage>;

    /// Replaces the current image data.
    fn put_image(&mut self, image: HostImage);

    /// Appends an entry to the image edit history.
    fn add_filter_action(&mut self, action: FilterAction);

    /// Writes the current image to the tool output.
    fn save_image(&mut self) -> BqmResult<()>;

    /// Progress of the running job, in percent.
    fn progress(&mut self, _percent: f32) {}
}

/// Queue content, for previews.
pub trait QueueSource {
    /// Items selected in the current queue.
    fn selected_items(&self) -> Vec<PathBuf>;

    /// All items of the current queue.
    fn all_items(&self) -> Vec<PathBuf>;

    /// Loads a reduced preview whose longest side is at most `size`.
    fn load_preview(&self, path: &Path, size: u32) -> Option<HostImage>;
}

/// Images handed to the engine for previews.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreviewImages {
    /// Engine images.
    pub images: Vec<EngineImage>,
    /// One name per image.
    pub names: Vec<String>,
}

/// Preview provider over a queue.
#[derive(Debug)]
pub struct QueuePreview<S> {
    source: S,
}

impl<S: QueueSource> QueuePreview<S> {
    /// Wraps `source`.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// The wrapped source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Size of the first selected item's preview, `(0, 0)` without one.
    pub fn image_size(&self) -> (u32, u32) {
        self.source
            .selected_items()
            .first()
            .and_then(|path| self.source.load_preview(path, PREVIEW_SIZE))
            .map_or((0, 0), |image| (image.width(), image.height()))
    }

    /// Region of the first selected item (or first queued item) preview,
    /// in fractions of its size. Negative values select the whole image.
    pub fn cropped_images(&self, x: f64, y: f64, width: f64, height: f64, mode: InputMode) -> PreviewImages {
        let mut items = self.source.selected_items();
        if items.is_empty() {
            items = self.source.all_items();
        }

        let Some(path) = items.first() else {
            return PreviewImages::default();
        };
        if mode == InputMode::NoInput {
            return PreviewImages::default();
        }
        let Some(preview) = self.source.load_preview(path, PREVIEW_SIZE) else {
            return PreviewImages::default();
        };

        debug!(path = %path.display(), x, y, width, height, "cropping preview");
        let region = preview.copy_normalized(x, y, width, height);

        PreviewImages {
            images: vec![host_to_engine(&region)],
            names: vec![format!("pos(0,0),name({PREVIEW_IMAGE_NAME})")],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Queue {
        selected: Vec<PathBuf>,
        all: Vec<PathBuf>,
    }

    impl QueueSource for Queue {
        fn selected_items(&self) -> Vec<PathBuf> {
            self.selected.clone()
        }

        fn all_items(&self) -> Vec<PathBuf> {
            self.all.clone()
        }

        fn load_preview(&self, path: &Path, _size: u32) -> Option<HostImage> {
            (path == Path::new("a.jpg")).then(|| HostImage::new(8, 4, false, false))
        }
    }

    #[test]
    fn size_of_selection() {
        let preview = QueuePreview::new(Queue {
            selected: vec!["a.jpg".into()],
            all: Vec::new(),
        });
        assert_eq!(preview.image_size(), (8, 4));

        let empty = QueuePreview::new(Queue {
            selected: Vec::new(),
            all: vec!["a.jpg".into()],
        });
        assert_eq!(empty.image_size(), (0, 0));
    }

    #[test]
    fn crop_falls_back_to_queue() {
        let preview = QueuePreview::new(Queue {
            selected: Vec::new(),
            all: vec!["a.jpg".into(), "b.jpg".into()],
        });

        let whole = preview.cropped_images(-1.0, -1.0, -1.0, -1.0, InputMode::Active);
        assert_eq!(whole.images.len(), 1);
        assert_eq!((whole.images[0].width, whole.images[0].height), (8, 4));
        assert_eq!(whole.names, ["pos(0,0),name(Batch Queue Manager Item Preview)"]);

        let half = preview.cropped_images(0.0, 0.0, 0.5, 0.5, InputMode::Active);
        assert_eq!((half.images[0].width, half.images[0].height), (5, 3));

        assert!(preview.cropped_images(0.0, 0.0, 1.0, 1.0, InputMode::NoInput).images.is_empty());
    }
}
