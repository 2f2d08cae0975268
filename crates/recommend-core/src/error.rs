use thiserror::Error;

#[derive(Error, Debug)]
pub enum RadarError {
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Config error: {0}")]
    Config(String),
}
