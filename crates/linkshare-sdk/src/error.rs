use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("invalid post: {0}")]
    Validation(#[from] linkshare_gate::ValidationError),

    #[error("like refused: {0}")]
    Gate(#[from] linkshare_gate::GateError),

    #[error("remote error: {0}")]
    Remote(#[from] linkshare_remote::RemoteError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("config encode error: {0}")]
    ConfigEncode(#[from] toml::ser::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SdkResult<T> = Result<T, SdkError>;
