use crate::aggregate::{daily_buckets, Stats};
use crate::logging::Diagnostics;
use crate::model::PlayRecord;

use super::{format_duration, or_unknown, Fragment, Renderer, NO_DATA_MESSAGE, UNKNOWN_ARTIST, UNKNOWN_TRACK};

/// Plays grouped by day, newest first, followed by the window's stats.
///
/// Names are written as they are stored, without escaping.
#[derive(Debug, Default, Clone)]
pub struct MarkdownList;

impl MarkdownList {
    pub fn line(record: &PlayRecord) -> String {
        let mut line = format!(
            "- 🎶 **{}** - {}",
            or_unknown(&record.track_name, UNKNOWN_TRACK),
            or_unknown(&record.artist_name, UNKNOWN_ARTIST),
        );

        if !record.album_name.is_empty() {
            line.push_str(&format!(" - *{}*", record.album_name));
        }
        if let Some(played_at) = record.played_at {
            line.push_str(&format!(" ({})", played_at.format("%H:%M")));
        }
        if record.duration_ms > 0 {
            line.push_str(&format!(" [{}]", format_duration(record.duration_ms)));
        }
        if record.popularity > 0 {
            line.push_str(&format!(" ⭐{}", record.popularity));
        }
        if let Some(url) = record.external_urls.spotify() {
            line.push_str(&format!(" [🎵]({url})"));
        }
        line
    }

    pub fn stats(stats: &Stats) -> Vec<String> {
        let mut lines = vec![
            "### 📊 Stats".to_string(),
            String::new(),
            format!("- **Total plays**: {}", stats.total_plays),
            format!("- **Unique tracks**: {}", stats.unique_tracks),
            format!("- **Unique artists**: {}", stats.unique_artists),
            format!("- **Total listening time**: {} hours", stats.total_hours_display()),
        ];
        if let Some(popularity) = stats.avg_popularity {
            lines.push(format!("- **Average popularity**: {popularity:.1}"));
        }
        lines.push(String::new());
        lines
    }
}

impl Renderer for MarkdownList {
    async fn render(&self, records: &[PlayRecord], diagnostics: &mut Diagnostics) -> Fragment {
        if records.is_empty() {
            diagnostics.info("render", "no plays in window");
            return Fragment::inline(format!("🎵 {NO_DATA_MESSAGE}"));
        }

        let mut lines = vec!["## 🎵 Recent Music Activity".to_string(), String::new()];

        for bucket in daily_buckets(records) {
            let heading = match bucket.date {
                Some(date) => date.format("%Y-%m-%d").to_string(),
                None => "Unknown date".to_string(),
            };
            lines.push(format!("### {heading}"));
            lines.push(String::new());
            lines.extend(bucket.records.iter().map(|record| Self::line(record)));
            lines.push(String::new());
        }

        lines.extend(Self::stats(&Stats::from_records(records)));

        diagnostics.debug("render", format!("markdown list with {} plays", records.len()));
        Fragment::inline(lines.join("\n"))
    }
}
