#![allow(dead_code)]

use std::time::Duration;

use serde_json::{json, Value};

pub fn client() -> reqwest::Client {
    spotify_activity::http_client(Duration::from_secs(2)).unwrap()
}

/// Client that gives up well before a delayed mock answers
pub fn impatient_client() -> reqwest::Client {
    spotify_activity::http_client(Duration::from_millis(200)).unwrap()
}

/// A row as the play log table returns it
pub fn row(track: &str, artist: &str, played_at: &str) -> Value {
    json!({
        "track_name": track,
        "artist_name": artist,
        "album_name": "Album",
        "track_id": format!("{track}-id"),
        "album_id": "album-id",
        "played_at": played_at,
        "duration_ms": 180000,
        "popularity": 50,
        "external_urls": format!("{{\"spotify\": \"https://open.spotify.com/track/{track}-id\"}}"),
    })
}
