use palette_hotkeys::ParseError;
use thiserror::Error;

/// Errors that can occur in the commands system
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("A Command must have a name and an action function")]
    InvalidCommand,

    #[error("Invalid hotkey: {0}")]
    Hotkey(#[from] ParseError),

    #[error("Provider already registered: {0}")]
    DuplicateProvider(String),

    #[error("Provider failed: {0}")]
    Provider(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, CommandError>;
