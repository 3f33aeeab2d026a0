mod depth_maps;
mod frames;

pub use depth_maps::{DepthMapWriter, SavedDepthMap};
pub use frames::{png_data_url, FolderFrameSource};
