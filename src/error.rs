use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use color_eyre::{Report, Section};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// Missing or invalid process configuration. Fatal before any work starts.
    Config(String),
    /// Reading or writing a file on disk
    Io { path: PathBuf, source: std::io::Error },
    Request(reqwest::Error),
    Json(serde_json::Error),
    Yaml(serde_yaml::Error),
    /// The spotify accounts service rejected an authorization step
    Auth { code: u16, message: String },
    Custom(String),
}

impl Error {
    pub fn custom<S: Display>(message: S) -> Self {
        Self::Custom(message.to_string())
    }

    pub fn config<S: Display>(message: S) -> Self {
        Self::Config(message.to_string())
    }

    pub fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(message) => write!(f, "configuration error: {message}"),
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Request(err) => write!(f, "request failed: {err}"),
            Self::Json(err) => write!(f, "invalid json: {err}"),
            Self::Yaml(err) => write!(f, "invalid yaml: {err}"),
            Self::Auth { code, message } => write!(f, "[{code}] {message}"),
            Self::Custom(message) => write!(f, "{message}"),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Self::Request(value)
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(value: serde_yaml::Error) -> Self {
        Self::Yaml(value)
    }
}

impl From<serde_urlencoded::ser::Error> for Error {
    fn from(value: serde_urlencoded::ser::Error) -> Self {
        Self::Custom(value.to_string())
    }
}

impl From<envy::Error> for Error {
    fn from(value: envy::Error) -> Self {
        Self::Config(value.to_string())
    }
}

impl From<Error> for Report {
    fn from(error: Error) -> Self {
        let suggestion = match &error {
            Error::Config(_) => "Set SUPABASE_URL and SUPABASE_KEY in the environment or a .env file",
            Error::Io { .. } => "Check that the README exists and the directory is writable",
            Error::Request(_) => "Check the network connection and try again later",
            Error::Json(_) | Error::Yaml(_) => "Check the format of the input",
            Error::Auth { .. } => "Verify the client id, client secret and redirect URI in the spotify dashboard",
            Error::Custom(_) => "Try again later",
        };
        Report::msg(error.to_string()).suggestion(suggestion)
    }
}
