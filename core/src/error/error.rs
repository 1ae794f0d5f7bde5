use thiserror::Error;

use super::code::ErrorCode;
use super::engine::EngineError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("job failed: {0}")]
    Engine(#[from] EngineError),
    #[error("command failed: {0}")]
    Command(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl CliError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Engine(e) => e.error_code(),
            Self::Command(_) => ErrorCode::GeneralError,
            Self::Config(_) => ErrorCode::ConfigurationError,
            Self::Io(_) => ErrorCode::StorageError,
            Self::Anyhow(_) => ErrorCode::GeneralError,
        }
    }
}
