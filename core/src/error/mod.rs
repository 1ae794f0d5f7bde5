#[allow(clippy::module_inception)]
pub mod error;
pub mod code;
pub mod engine;
pub mod storage;

pub use code::ErrorCode;
pub use engine::EngineError;
pub use error::CliError;
pub use storage::StorageError;
