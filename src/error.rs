use err_derive::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(display = "Input missing: {}", _0)]
    InputMissing(String),

    #[error(display = "Malformed geometry: {}", _0)]
    MalformedGeometry(String),

    #[error(display = "Invalid configuration: {}", _0)]
    Config(String),

    #[error(display = "Assignment Error: {}", _0)]
    Assignment(String),

    #[error(display = "IO Error: {}", _0)]
    Io(std::io::Error),

    #[error(display = "JSON Error: {}", _0)]
    Json(serde_json::Error),

    #[error(display = "TOML Error: {}", _0)]
    Toml(toml::de::Error),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Toml(err)
    }
}
