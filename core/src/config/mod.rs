mod load;
mod types;

pub use load::{get_krawler_data_dir, load_default, load_from};
pub use types::{AppConfig, EngineConfig, LoggingConfig};
