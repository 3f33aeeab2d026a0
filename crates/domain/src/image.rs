use std::path::Path;

pub const MIME_JPEG: &str = "image/jpeg";
pub const MIME_JPG: &str = "image/jpg";
pub const MIME_PNG: &str = "image/png";

/// Normalized image bytes ready for transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    file_name: String,
    mime_type: String,
    bytes: Vec<u8>,
}

impl ImagePayload {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// A file picked by the user, as reported by the picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    File(FileUpload),
    /// A camera screenshot encoded as a `data:` URL.
    CameraFrame(String),
}

/// Guesses the MIME type a file picker would report for `path`.
pub fn guess_mime_type(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return "application/octet-stream";
    };

    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => MIME_JPEG,
        "png" => MIME_PNG,
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        _ => "application/octet-stream",
    }
}

pub fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type.to_ascii_lowercase().as_str() {
        MIME_JPEG | MIME_JPG => "jpg",
        MIME_PNG => "png",
        "image/gif" => "gif",
        "image/bmp" => "bmp",
        "image/webp" => "webp",
        "image/tiff" => "tiff",
        _ => "bin",
    }
}
