pub mod merge;
pub mod path;
pub mod template;

pub use merge::deep_merge;
pub use path::{get_path, get_path_mut, set_path, unset_path};
pub use template::render;
