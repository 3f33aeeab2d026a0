pub mod compress;
pub mod fs;
pub mod http;
pub mod presenters;

pub use compress::ImageCrateCompressor;
pub use fs::{png_data_url, DepthMapWriter, FolderFrameSource, SavedDepthMap};
pub use http::{HttpDepthBackend, DEFAULT_REQUEST_TIMEOUT};
pub use presenters::{present_metrics, present_saved, present_state, present_turn};
