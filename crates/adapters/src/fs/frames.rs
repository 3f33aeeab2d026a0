use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use depth_view_application::{ApplicationError, FrameSource};
use depth_view_domain::{guess_mime_type, MIME_JPEG, MIME_PNG};
use image::{DynamicImage, ImageFormat};
use tracing::debug;
use walkdir::WalkDir;

/// Replays the images of a folder as camera screenshots, round-robin.
///
/// Frames are decoded and encoded as PNG `data:` URLs once, in `open`, so a
/// capture tick only clones a string.
#[derive(Debug)]
pub struct FolderFrameSource {
    frames: Vec<String>,
    next: usize,
}

impl FolderFrameSource {
    /// Decodes every frame up front; call it from a blocking context.
    pub fn open(folder: &Path) -> Result<Self, ApplicationError> {
        if !folder.is_dir() {
            return Err(ApplicationError::InvalidInput(format!(
                "folder does not exist or is not a directory: {}",
                folder.display()
            )));
        }

        let paths: Vec<PathBuf> = WalkDir::new(folder)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| matches!(guess_mime_type(path), MIME_JPEG | MIME_PNG))
            .collect();

        if paths.is_empty() {
            return Err(ApplicationError::InvalidInput(format!(
                "no JPEG or PNG frames found in {}",
                folder.display()
            )));
        }

        let frames = paths
            .iter()
            .map(|path| {
                let image = image::open(path).map_err(|error| {
                    ApplicationError::Capture(format!("{}: {error}", path.display()))
                })?;
                png_data_url(&image)
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!(frames = frames.len(), folder = %folder.display(), "frames encoded");

        Ok(Self { frames, next: 0 })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSource for FolderFrameSource {
    fn capture(&mut self) -> Result<Option<String>, ApplicationError> {
        if self.frames.is_empty() {
            return Ok(None);
        }
        let frame = self.frames[self.next % self.frames.len()].clone();
        self.next = self.next.wrapping_add(1);
        Ok(Some(frame))
    }
}

/// Encodes an image the way a browser screenshot arrives: a PNG `data:` URL.
pub fn png_data_url(image: &DynamicImage) -> Result<String, ApplicationError> {
    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|error| ApplicationError::Capture(error.to_string()))?;
    Ok(format!("data:{MIME_PNG};base64,{}", STANDARD.encode(png)))
}
