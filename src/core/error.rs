use thiserror::Error;

#[derive(Error, Debug)]
pub enum OddsError {
    #[error("Invalid attack profile: {0}")]
    InvalidAttack(String),

    #[error("Invalid defense profile: {0}")]
    InvalidDefense(String),

    #[error("Unknown modifier: {0}")]
    UnknownModifier(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, OddsError>;
