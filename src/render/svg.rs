use std::path::{Path, PathBuf};

use crate::aggregate::{rank, Stats, TrackAggregate};
use crate::cover::{CoverArt, PLACEHOLDER_DATA_URI};
use crate::logging::Diagnostics;
use crate::model::PlayRecord;

use super::{
    escape_markup, or_unknown, plays_label, rank_badge, truncate, Fragment, Renderer, SideFile,
    NO_DATA_MESSAGE, UNKNOWN_ARTIST, UNKNOWN_TRACK,
};

const WIDTH: u32 = 480;
const HEADER: u32 = 56;
const ROW: u32 = 80;
const FOOTER: u32 = 40;
const COVER: u32 = 64;
const MAX_NAME: usize = 32;

/// Self contained SVG card of the most played tracks.
///
/// Covers are embedded as `data:` URIs so the card never references anything that can go
/// missing. The card is returned as a side file and the fragment links it by relative path.
#[derive(Debug, Clone)]
pub struct SvgCard<'a, C> {
    cover: &'a C,
    top: usize,
    path: PathBuf,
}

impl<'a, C: CoverArt> SvgCard<'a, C> {
    pub fn new<P: AsRef<Path>>(cover: &'a C, top: usize, path: P) -> Self {
        Self {
            cover,
            top,
            path: path.as_ref().to_path_buf(),
        }
    }

    async fn cover_uri(&self, track: &TrackAggregate, diagnostics: &mut Diagnostics) -> String {
        let Some(url) = track.spotify_url() else {
            return PLACEHOLDER_DATA_URI.to_string();
        };
        match self.cover.thumbnail_url(url, diagnostics).await {
            Some(thumbnail) => self.cover.data_uri(&thumbnail, diagnostics).await,
            None => PLACEHOLDER_DATA_URI.to_string(),
        }
    }

    async fn row(&self, position: usize, track: &TrackAggregate, diagnostics: &mut Diagnostics) -> String {
        let y = HEADER + (position as u32 - 1) * ROW;
        let image = escape_markup(&self.cover_uri(track, diagnostics).await);

        let name = escape_markup(&truncate(or_unknown(&track.track_name, UNKNOWN_TRACK), MAX_NAME));
        let name = match track.spotify_url() {
            Some(url) => format!(r#"<a href="{}">{name}</a>"#, escape_markup(url)),
            None => name,
        };
        let artist = escape_markup(&truncate(or_unknown(&track.artist_name, UNKNOWN_ARTIST), MAX_NAME));

        format!(
            r#"  <g transform="translate(0,{y})">
    <text x="24" y="44" class="badge">{badge}</text>
    <image x="64" y="8" width="{COVER}" height="{COVER}" href="{image}" preserveAspectRatio="xMidYMid slice"/>
    <text x="144" y="34" class="track">{name}</text>
    <text x="144" y="56" class="artist">{artist}</text>
    <text x="{right}" y="44" class="plays" text-anchor="end">{plays}</text>
  </g>"#,
            badge = rank_badge(position),
            right = WIDTH - 24,
            plays = plays_label(track.plays),
        )
    }

    fn reference(&self) -> String {
        format!(
            "![Spotify activity]({})",
            self.path.to_string_lossy().replace('\\', "/")
        )
    }
}

fn document(height: u32, body: &str) -> String {
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{height}" viewBox="0 0 {WIDTH} {height}">
  <style>
    text {{ font-family: -apple-system, 'Segoe UI', Helvetica, Arial, sans-serif; fill: #e6edf3; }}
    .title {{ font-size: 18px; font-weight: 600; }}
    .badge {{ font-size: 22px; }}
    .track {{ font-size: 15px; font-weight: 600; }}
    .artist {{ font-size: 13px; fill: #8b949e; }}
    .plays {{ font-size: 13px; fill: #1db954; }}
    .footer {{ font-size: 12px; fill: #8b949e; }}
  </style>
  <rect width="100%" height="100%" rx="12" fill="#0d1117"/>
  <text x="24" y="36" class="title">🎵 Top Tracks</text>
{body}
</svg>
"##
    )
}

impl<C: CoverArt> Renderer for SvgCard<'_, C> {
    async fn render(&self, records: &[PlayRecord], diagnostics: &mut Diagnostics) -> Fragment {
        let contents = if records.is_empty() {
            diagnostics.info("render", "no plays in window");
            document(
                HEADER + ROW,
                &format!(r#"  <text x="24" y="{}" class="artist">{NO_DATA_MESSAGE}</text>"#, HEADER + 32),
            )
        } else {
            let ranked = rank(records, self.top);
            let mut rows = Vec::with_capacity(ranked.len() + 1);
            for (i, track) in ranked.iter().enumerate() {
                rows.push(self.row(i + 1, track, diagnostics).await);
            }

            let stats = Stats::from_records(records);
            let footer_y = HEADER + ranked.len() as u32 * ROW + 24;
            rows.push(format!(
                r#"  <text x="24" y="{footer_y}" class="footer">{} · {} tracks · {} artists · {} hours</text>"#,
                plays_label(stats.total_plays),
                stats.unique_tracks,
                stats.unique_artists,
                stats.total_hours_display(),
            ));

            diagnostics.debug("render", format!("svg card with {} tracks", ranked.len()));
            document(HEADER + ranked.len() as u32 * ROW + FOOTER, &rows.join("\n"))
        };

        Fragment {
            text: self.reference(),
            side_file: Some(SideFile {
                path: self.path.clone(),
                contents,
            }),
        }
    }
}

#[cfg(test)]
mod test {
    use std::cell::Cell;

    use crate::model::ExternalUrls;

    use super::*;

    struct StubCover {
        downloads: Cell<usize>,
        thumbnail: bool,
    }

    impl StubCover {
        fn new(thumbnail: bool) -> Self {
            Self {
                downloads: Cell::new(0),
                thumbnail,
            }
        }
    }

    impl CoverArt for StubCover {
        async fn thumbnail_url(&self, track_url: &str, _: &mut Diagnostics) -> Option<String> {
            self.thumbnail.then(|| format!("{track_url}.jpg"))
        }

        async fn data_uri(&self, _: &str, _: &mut Diagnostics) -> String {
            self.downloads.set(self.downloads.get() + 1);
            "data:image/jpeg;base64,AAAA".to_string()
        }
    }

    fn play(track: &str) -> PlayRecord {
        PlayRecord {
            track_name: track.into(),
            artist_name: "Artist".into(),
            external_urls: ExternalUrls::from_iter([("spotify", format!("https://t/{track}"))]),
            ..Default::default()
        }
    }

    fn contents(fragment: &Fragment) -> &str {
        &fragment.side_file.as_ref().unwrap().contents
    }

    #[tokio::test]
    async fn empty_history_still_writes_a_card() {
        let cover = StubCover::new(true);
        let fragment = SvgCard::new(&cover, 3, "assets/card.svg")
            .render(&[], &mut Diagnostics::new())
            .await;

        assert_eq!(fragment.text, "![Spotify activity](assets/card.svg)");
        assert!(contents(&fragment).contains(NO_DATA_MESSAGE));
        assert!(contents(&fragment).starts_with("<svg"));
    }

    #[tokio::test]
    async fn embeds_covers_for_the_top_tracks() {
        let cover = StubCover::new(true);
        let records = vec![play("a"), play("b"), play("b"), play("c"), play("d")];
        let fragment = SvgCard::new(&cover, 3, "assets/card.svg")
            .render(&records, &mut Diagnostics::new())
            .await;
        let svg = contents(&fragment);

        assert_eq!(cover.downloads.get(), 3);
        assert_eq!(svg.matches(r#"href="data:image/jpeg;base64,AAAA""#).count(), 3);
        assert!(svg.find(">b</a>").unwrap() < svg.find(">a</a>").unwrap());
        assert!(!svg.contains(">d</a>"));
        assert!(svg.contains("🥉"));
        assert!(svg.contains(r#"height="336""#));
    }

    #[tokio::test]
    async fn placeholder_without_cover() {
        let cover = StubCover::new(false);
        let records = vec![play("a"), PlayRecord::default()];
        let fragment = SvgCard::new(&cover, 3, "card.svg")
            .render(&records, &mut Diagnostics::new())
            .await;

        assert_eq!(cover.downloads.get(), 0);
        assert_eq!(contents(&fragment).matches(PLACEHOLDER_DATA_URI).count(), 2);
    }

    struct HostileCover;

    impl CoverArt for HostileCover {
        async fn thumbnail_url(&self, track_url: &str, _: &mut Diagnostics) -> Option<String> {
            Some(format!("{track_url}.jpg"))
        }

        async fn data_uri(&self, _: &str, _: &mut Diagnostics) -> String {
            r#"data:image/png"/><script>alert(1)</script><x y=";base64,AAAA"#.to_string()
        }
    }

    #[tokio::test]
    async fn cover_uri_is_escaped() {
        let fragment = SvgCard::new(&HostileCover, 3, "card.svg")
            .render(&[play("a")], &mut Diagnostics::new())
            .await;
        let svg = contents(&fragment);

        assert!(!svg.contains("<script>"));
        assert!(svg.contains(r#"href="data:image/png&quot;/&gt;&lt;script&gt;"#));
    }

    #[tokio::test]
    async fn names_are_escaped() {
        let cover = StubCover::new(false);
        let records = vec![PlayRecord {
            track_name: "Rock & Roll <Live>".into(),
            artist_name: "\"Weird\" Al".into(),
            ..Default::default()
        }];
        let fragment = SvgCard::new(&cover, 3, "card.svg")
            .render(&records, &mut Diagnostics::new())
            .await;
        let svg = contents(&fragment);

        assert!(svg.contains("Rock &amp; Roll &lt;Live&gt;"));
        assert!(svg.contains("&quot;Weird&quot; Al"));
        assert!(!svg.contains("<Live>"));
    }
}
