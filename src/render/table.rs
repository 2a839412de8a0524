use crate::aggregate::{rank, Stats, TrackAggregate};
use crate::cover::CoverArt;
use crate::logging::Diagnostics;
use crate::model::PlayRecord;

use super::{
    escape_markup, or_unknown, plays_label, rank_badge, Fragment, Renderer, NO_DATA_MESSAGE,
    UNKNOWN_ARTIST, UNKNOWN_TRACK,
};

const COVER_SIZE: u32 = 64;

/// HTML table of the most played tracks. Cover art is linked, not embedded.
#[derive(Debug, Clone)]
pub struct HtmlTable<'a, C> {
    cover: &'a C,
    top: usize,
}

impl<'a, C: CoverArt> HtmlTable<'a, C> {
    pub fn new(cover: &'a C, top: usize) -> Self {
        Self { cover, top }
    }

    async fn row(&self, position: usize, track: &TrackAggregate, diagnostics: &mut Diagnostics) -> String {
        let thumbnail = match track.spotify_url() {
            Some(url) => self.cover.thumbnail_url(url, diagnostics).await,
            None => None,
        };

        let cover = match thumbnail {
            Some(src) => format!(
                r#"<img src="{}" width="{COVER_SIZE}" height="{COVER_SIZE}" alt="cover">"#,
                escape_markup(&src)
            ),
            None => "🎵".to_string(),
        };

        let name = format!(
            "<b>{}</b>",
            escape_markup(or_unknown(&track.track_name, UNKNOWN_TRACK))
        );
        let name = match track.spotify_url() {
            Some(url) => format!(r#"<a href="{}">{name}</a>"#, escape_markup(url)),
            None => name,
        };

        [
            "    <tr>".to_string(),
            format!(r#"      <td align="center">{}</td>"#, rank_badge(position)),
            format!(r#"      <td align="center">{cover}</td>"#),
            format!("      <td>{name}</td>"),
            format!(
                "      <td>{}</td>",
                escape_markup(or_unknown(&track.artist_name, UNKNOWN_ARTIST))
            ),
            format!(r#"      <td align="right">{}</td>"#, plays_label(track.plays)),
            "    </tr>".to_string(),
        ]
        .join("\n")
    }
}

impl<C: CoverArt> Renderer for HtmlTable<'_, C> {
    async fn render(&self, records: &[PlayRecord], diagnostics: &mut Diagnostics) -> Fragment {
        if records.is_empty() {
            diagnostics.info("render", "no plays in window");
            return Fragment::inline(format!("<p>🎵 {NO_DATA_MESSAGE}</p>"));
        }

        let ranked = rank(records, self.top);
        let mut lines = vec![
            "<table>".to_string(),
            "  <thead>".to_string(),
            "    <tr><th>#</th><th></th><th>Track</th><th>Artist</th><th>Plays</th></tr>".to_string(),
            "  </thead>".to_string(),
            "  <tbody>".to_string(),
        ];
        for (i, track) in ranked.iter().enumerate() {
            lines.push(self.row(i + 1, track, diagnostics).await);
        }
        lines.push("  </tbody>".to_string());
        lines.push("</table>".to_string());

        let stats = Stats::from_records(records);
        lines.push(String::new());
        lines.push(format!(
            "<sub>{} · {} tracks · {} artists · {} hours</sub>",
            plays_label(stats.total_plays),
            stats.unique_tracks,
            stats.unique_artists,
            stats.total_hours_display(),
        ));

        diagnostics.debug("render", format!("table with {} tracks", ranked.len()));
        Fragment::inline(lines.join("\n"))
    }
}
