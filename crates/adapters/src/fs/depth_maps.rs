use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use depth_view_application::ApplicationError;
use image::ImageFormat;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedDepthMap {
    pub file_path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Writes base64 images returned by the backend (depth maps, echoed RGB
/// frames) as PNG files. Non-PNG bodies are re-encoded.
#[derive(Debug, Clone)]
pub struct DepthMapWriter {
    output_dir: PathBuf,
}

impl DepthMapWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn write(&self, name: &str, depth_map: &str) -> Result<SavedDepthMap, ApplicationError> {
        let encoded = depth_map
            .split_once(',')
            .map_or(depth_map, |(_, body)| body)
            .trim();
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|error| ApplicationError::Decode(error.to_string()))?;
        let format = image::guess_format(&bytes)
            .map_err(|error| ApplicationError::Decode(error.to_string()))?;
        let image = image::load_from_memory_with_format(&bytes, format)
            .map_err(|error| ApplicationError::Decode(error.to_string()))?;

        let png = if format == ImageFormat::Png {
            bytes
        } else {
            let mut png = Vec::new();
            image
                .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
                .map_err(|error| ApplicationError::Decode(error.to_string()))?;
            png
        };

        fs::create_dir_all(&self.output_dir)
            .map_err(|error| ApplicationError::Io(error.to_string()))?;
        let file_path = self.output_dir.join(format!("{name}.png"));
        fs::write(&file_path, png).map_err(|error| ApplicationError::Io(error.to_string()))?;

        Ok(SavedDepthMap {
            file_path,
            width: image.width(),
            height: image.height(),
        })
    }
}
