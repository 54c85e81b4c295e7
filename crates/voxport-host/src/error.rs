use thiserror::Error;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("failed to read scene: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse scene: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unknown block `{0}`")]
    UnknownBlock(String),
    #[error("invalid entity id `{0}`")]
    BadEntityId(String),
    #[error("invalid scene: {0}")]
    Invalid(String),
}
