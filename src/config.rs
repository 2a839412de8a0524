use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cover::DEFAULT_OEMBED_ENDPOINT;
use crate::error::{Error, Result};
use crate::readme::DEFAULT_ANCHOR;
use crate::render::RenderMode;
use crate::store::{DEFAULT_TABLE, DEFAULT_WINDOW_DAYS};

pub static DEFAULT_README: &str = "README.md";
pub static DEFAULT_SVG_PATH: &str = "assets/spotify-activity.svg";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Row store credentials
///
/// # Variables
/// - `SUPABASE_URL`: Project URL
/// - `SUPABASE_KEY`: API key
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub supabase_url: String,
    pub supabase_key: String,
}

impl Credentials {
    pub fn new(url: &str, key: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            supabase_key: key.to_string(),
        }
    }

    /// Read the credentials from the environment, loading a `.env` file first when present
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Same as [`Credentials::from_env`] over an explicit set of variables
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let credentials: Credentials = envy::from_iter(vars)?;
        if credentials.supabase_url.trim().is_empty() || credentials.supabase_key.trim().is_empty() {
            return Err(Error::config("SUPABASE_URL and SUPABASE_KEY must not be empty"));
        }
        Ok(credentials)
    }
}

/// Resolved settings for one run
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub mode: RenderMode,
    /// Trailing window in days
    pub days: u32,
    /// Row limit for the store query
    pub limit: Option<usize>,
    /// Number of ranked tracks shown by the table and svg renderers
    pub top: usize,
    pub readme: PathBuf,
    /// Heading the section is inserted before when the markers are missing
    pub anchor: String,
    /// Output of the svg renderer, relative to the README's directory
    pub svg_path: PathBuf,
    pub table: String,
    pub oembed_endpoint: String,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        ConfigBuilder::default().compile()
    }
}

/// Settings as read from a config file, every field optional
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfigBuilder {
    mode: Option<RenderMode>,
    days: Option<u32>,
    limit: Option<usize>,
    top: Option<usize>,
    readme: Option<PathBuf>,
    anchor: Option<String>,
    svg_path: Option<PathBuf>,
    table: Option<String>,
    oembed_endpoint: Option<String>,
    timeout_secs: Option<u64>,
}

impl Config {
    /// Load the first config file that exists from `paths`, or the defaults when none do
    pub fn load_with_fallback<const N: usize>(paths: [&str; N]) -> Result<ConfigBuilder> {
        match paths.iter().map(PathBuf::from).find(|path| path.exists()) {
            None => Ok(ConfigBuilder::default()),
            Some(path) => {
                let config_file =
                    std::fs::read_to_string(&path).map_err(|err| Error::io(&path, err))?;
                ConfigBuilder::parse(&config_file)
            }
        }
    }
}

impl ConfigBuilder {
    pub fn parse(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn mode(mut self, mode: Option<RenderMode>) -> Self {
        self.mode = mode.or(self.mode);
        self
    }

    pub fn days(mut self, days: Option<u32>) -> Self {
        self.days = days.or(self.days);
        self
    }

    pub fn limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit.or(self.limit);
        self
    }

    pub fn top(mut self, top: Option<usize>) -> Self {
        self.top = top.or(self.top);
        self
    }

    pub fn readme(mut self, readme: Option<PathBuf>) -> Self {
        self.readme = readme.or(self.readme);
        self
    }

    pub fn svg_path(mut self, svg_path: Option<PathBuf>) -> Self {
        self.svg_path = svg_path.or(self.svg_path);
        self
    }

    pub fn compile(self) -> Config {
        let mode = self.mode.unwrap_or_default();
        Config {
            days: self.days.unwrap_or(DEFAULT_WINDOW_DAYS),
            limit: self.limit,
            top: self.top.unwrap_or(mode.default_top()),
            readme: self.readme.unwrap_or_else(|| PathBuf::from(DEFAULT_README)),
            anchor: self.anchor.unwrap_or_else(|| DEFAULT_ANCHOR.to_string()),
            svg_path: self.svg_path.unwrap_or_else(|| PathBuf::from(DEFAULT_SVG_PATH)),
            table: self.table.unwrap_or_else(|| DEFAULT_TABLE.to_string()),
            oembed_endpoint: self
                .oembed_endpoint
                .unwrap_or_else(|| DEFAULT_OEMBED_ENDPOINT.to_string()),
            timeout: Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            mode,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn credentials_from_variables() {
        let credentials = Credentials::from_vars(vars(&[
            ("SUPABASE_URL", "https://abc.supabase.co"),
            ("SUPABASE_KEY", "secret"),
            ("HOME", "/root"),
        ]))
        .unwrap();

        assert_eq!(credentials.supabase_url, "https://abc.supabase.co");
        assert_eq!(credentials.supabase_key, "secret");
    }

    #[test]
    fn missing_credentials_are_a_config_error() {
        let err = Credentials::from_vars(vars(&[("SUPABASE_URL", "https://abc.supabase.co")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = Credentials::from_vars(vars(&[("SUPABASE_URL", ""), ("SUPABASE_KEY", "k")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.mode, RenderMode::Markdown);
        assert_eq!(config.days, 7);
        assert_eq!(config.top, 10);
        assert_eq!(config.readme, PathBuf::from("README.md"));
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn file_values_and_overrides() {
        let config = ConfigBuilder::parse("mode: svg\ndays: 30\nanchor: \"## Elsewhere\"\ntimeout_secs: 3\n")
            .unwrap()
            .days(Some(14))
            .readme(None)
            .compile();

        assert_eq!(config.mode, RenderMode::Svg);
        assert_eq!(config.days, 14);
        assert_eq!(config.top, 3);
        assert_eq!(config.anchor, "## Elsewhere");
        assert_eq!(config.timeout, Duration::from_secs(3));
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(ConfigBuilder::parse("  \n").unwrap().compile(), Config::default());
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(matches!(ConfigBuilder::parse("mode: pdf"), Err(Error::Yaml(_))));
    }
}
