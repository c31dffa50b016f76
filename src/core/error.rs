use std::io;

#[derive(thiserror::Error, Debug)]
pub enum RadarError {
    #[error("image decode error: {0}")]
    Decode(String),
    #[error("image too large: {size} bytes (max {limit})")]
    TooLarge { size: usize, limit: usize },
    #[error("config error: {0}")]
    Config(String),
    #[error("store error: {0}")]
    Store(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<image::ImageError> for RadarError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(e) => RadarError::Io(e),
            other => RadarError::Decode(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for RadarError {
    fn from(err: serde_json::Error) -> Self {
        RadarError::Store(err.to_string())
    }
}

impl From<toml::de::Error> for RadarError {
    fn from(err: toml::de::Error) -> Self {
        RadarError::Config(err.to_string())
    }
}

impl From<regex::Error> for RadarError {
    fn from(err: regex::Error) -> Self {
        RadarError::Config(format!("invalid keyword pattern: {err}"))
    }
}
