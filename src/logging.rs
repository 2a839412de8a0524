use std::fmt::{Display, Formatter};

/// Severity of a single diagnostic entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl From<Level> for log::Level {
    fn from(value: Level) -> Self {
        match value {
            Level::Debug => log::Level::Debug,
            Level::Info => log::Level::Info,
            Level::Warn => log::Level::Warn,
            Level::Error => log::Level::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub level: Level,
    /// Pipeline stage that produced the entry, e.g. `store` or `cover`
    pub stage: &'static str,
    pub message: String,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.stage, self.message)
    }
}

/// Diagnostics collected over one run.
///
/// Every stage receives this explicitly instead of reaching for process wide state. Each
/// entry is also forwarded to the `log` facade so a binary that installs a logger still sees
/// it as it happens.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<S: Display>(&mut self, level: Level, stage: &'static str, message: S) {
        let entry = Diagnostic {
            level,
            stage,
            message: message.to_string(),
        };
        log::log!(target: stage, log::Level::from(level), "{}", entry.message);
        self.entries.push(entry);
    }

    pub fn debug<S: Display>(&mut self, stage: &'static str, message: S) {
        self.push(Level::Debug, stage, message)
    }

    pub fn info<S: Display>(&mut self, stage: &'static str, message: S) {
        self.push(Level::Info, stage, message)
    }

    pub fn warn<S: Display>(&mut self, stage: &'static str, message: S) {
        self.push(Level::Warn, stage, message)
    }

    pub fn error<S: Display>(&mut self, stage: &'static str, message: S) {
        self.push(Level::Error, stage, message)
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Entries at or above `level`
    pub fn at_least(&self, level: Level) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.level >= level)
    }

    pub fn has_errors(&self) -> bool {
        self.at_least(Level::Error).next().is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Install `env_logger`, honouring `RUST_LOG` and defaulting to `info`
pub fn init() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .try_init();
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn collects_in_order() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.info("store", "fetched 3 records");
        diagnostics.warn("cover", "no thumbnail");
        diagnostics.error("store", "timeout");

        assert_eq!(diagnostics.len(), 3);
        assert_eq!(diagnostics.entries()[1].stage, "cover");
        assert_eq!(diagnostics.entries()[2].to_string(), "[store] timeout");
    }

    #[test]
    fn filters_by_level() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.debug("render", "svg card");
        diagnostics.warn("cover", "no thumbnail");

        assert_eq!(diagnostics.at_least(Level::Warn).count(), 1);
        assert!(!diagnostics.has_errors());
    }
}
