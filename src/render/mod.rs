use std::fmt::{Display, Formatter};
use std::future::Future;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::aggregate::DEFAULT_RANK_LIMIT;
use crate::logging::Diagnostics;
use crate::model::PlayRecord;

pub mod markdown;
pub mod svg;
pub mod table;

pub use markdown::MarkdownList;
pub use svg::SvgCard;
pub use table::HtmlTable;

/// Present in every fragment rendered from an empty play history
pub static NO_DATA_MESSAGE: &str = "No recent music activity";

pub static UNKNOWN_TRACK: &str = "Unknown Track";
pub static UNKNOWN_ARTIST: &str = "Unknown Artist";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Daily list of plays with a stats block
    #[default]
    Markdown,
    /// HTML table of the most played tracks
    Table,
    /// SVG card of the most played tracks with embedded cover art
    Svg,
}

impl RenderMode {
    /// Number of ranked tracks shown when nothing else is configured
    pub fn default_top(self) -> usize {
        match self {
            RenderMode::Svg => 3,
            RenderMode::Markdown | RenderMode::Table => DEFAULT_RANK_LIMIT,
        }
    }
}

impl Display for RenderMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderMode::Markdown => write!(f, "markdown"),
            RenderMode::Table => write!(f, "table"),
            RenderMode::Svg => write!(f, "svg"),
        }
    }
}

/// A file the renderer wants written next to the README
#[derive(Debug, Clone, PartialEq)]
pub struct SideFile {
    /// Relative to the README's directory
    pub path: PathBuf,
    pub contents: String,
}

/// Text spliced into the README, plus an optional side file it refers to
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub text: String,
    pub side_file: Option<SideFile>,
}

impl Fragment {
    pub fn inline<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            side_file: None,
        }
    }
}

pub trait Renderer {
    /// Render the plays of one window. Never fails: missing pieces degrade to placeholders
    /// and an empty history renders [`NO_DATA_MESSAGE`].
    fn render(
        &self,
        records: &[PlayRecord],
        diagnostics: &mut Diagnostics,
    ) -> impl Future<Output = Fragment>;
}

/// Escape text for HTML and SVG, both in element content and quoted attributes
pub fn escape_markup(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Medal for the podium, a note for everyone else. `rank` starts at 1.
pub fn rank_badge(rank: usize) -> &'static str {
    match rank {
        1 => "🥇",
        2 => "🥈",
        3 => "🥉",
        _ => "🎵",
    }
}

pub fn plays_label(plays: usize) -> String {
    match plays {
        1 => "1 play".to_string(),
        n => format!("{n} plays"),
    }
}

/// `m:ss`
pub fn format_duration(duration_ms: u64) -> String {
    let minutes = duration_ms / 60_000;
    let seconds = (duration_ms % 60_000) / 1000;
    format!("{minutes}:{seconds:02}")
}

pub(crate) fn or_unknown<'a>(value: &'a str, unknown: &'a str) -> &'a str {
    match value.is_empty() {
        true => unknown,
        false => value,
    }
}

/// Cut `text` to at most `max` characters, marking the cut with an ellipsis
pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn escapes_special_characters() {
        assert_eq!(
            escape_markup(r#"Tom & Jerry <live> "remix" 'edit'"#),
            "Tom &amp; Jerry &lt;live&gt; &quot;remix&quot; &#39;edit&#39;"
        );
        assert_eq!(escape_markup("plain"), "plain");
    }

    #[test]
    fn badges() {
        assert_eq!(rank_badge(1), "🥇");
        assert_eq!(rank_badge(3), "🥉");
        assert_eq!(rank_badge(4), "🎵");
    }

    #[test]
    fn labels_and_durations() {
        assert_eq!(plays_label(1), "1 play");
        assert_eq!(plays_label(12), "12 plays");
        assert_eq!(format_duration(185_999), "3:05");
        assert_eq!(format_duration(0), "0:00");
    }

    #[test]
    fn truncates_on_characters() {
        assert_eq!(truncate("夜に駆ける", 10), "夜に駆ける");
        assert_eq!(truncate("abcdefgh", 5), "abcd…");
    }

    #[test]
    fn mode_names() {
        assert_eq!(RenderMode::Svg.to_string(), "svg");
        assert_eq!(RenderMode::Svg.default_top(), 3);
        assert_eq!(RenderMode::Table.default_top(), 10);
    }
}
