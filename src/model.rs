use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::Deserialize;
use serde_json::Value;

use crate::logging::Diagnostics;

/// Columns requested from the row store, in the order listed in the `select` parameter
pub static COLUMNS: [&str; 9] = [
    "track_name",
    "artist_name",
    "album_name",
    "track_id",
    "album_id",
    "played_at",
    "duration_ms",
    "popularity",
    "external_urls",
];

/// Known external URLs for a track, keyed by service name (`spotify`, ...)
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct ExternalUrls(BTreeMap<String, String>);

impl ExternalUrls {
    /// The Spotify URL for the track, if one was stored
    pub fn spotify(&self) -> Option<&str> {
        self.get("spotify")
    }

    pub fn get(&self, service: &str) -> Option<&str> {
        self.0
            .get(service)
            .map(String::as_str)
            .filter(|url| !url.is_empty())
    }

    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, service: K, url: V) {
        self.0.insert(service.into(), url.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Normalize the stored column, which may be a JSON object or a JSON encoded string.
    ///
    /// Non string values are dropped. A string that does not decode to an object yields an
    /// empty map.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Object(map) => Ok(Self(
                map.iter()
                    .filter_map(|(k, v)| v.as_str().map(|url| (k.clone(), url.to_string())))
                    .collect(),
            )),
            Value::String(encoded) if encoded.trim().is_empty() => Ok(Self::default()),
            Value::String(encoded) => {
                let decoded: Value = serde_json::from_str(encoded)?;
                match decoded {
                    Value::Object(_) => Self::from_value(&decoded),
                    Value::Null => Ok(Self::default()),
                    _ => Err(serde::de::Error::custom("external_urls is not a JSON object")),
                }
            }
            _ => Ok(Self::default()),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ExternalUrls {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A row exactly as the row store returns it.
///
/// Every column is kept as raw JSON so that one column of the wrong type only empties that
/// column. Types are checked once, in [`PlayRecord::from_row`].
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PlayRow {
    #[serde(default)]
    pub track_name: Option<Value>,
    #[serde(default)]
    pub artist_name: Option<Value>,
    #[serde(default)]
    pub album_name: Option<Value>,
    #[serde(default)]
    pub track_id: Option<Value>,
    #[serde(default)]
    pub album_id: Option<Value>,
    #[serde(default)]
    pub played_at: Option<Value>,
    #[serde(default)]
    pub duration_ms: Option<Value>,
    #[serde(default)]
    pub popularity: Option<Value>,
    #[serde(default)]
    pub external_urls: Option<Value>,
}

impl PlayRow {
    /// Read a row out of a query result. Only JSON objects are rows.
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Object(_) => serde_json::from_value(value),
            Value::Array(_) => Err(serde::de::Error::custom("expected an object, got a list")),
            _ => Err(serde::de::Error::custom("expected an object, got a scalar")),
        }
    }
}

/// One logged play of a track
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PlayRecord {
    pub track_name: String,
    pub artist_name: String,
    pub album_name: String,
    pub track_id: String,
    pub album_id: String,
    pub played_at: Option<DateTime<FixedOffset>>,
    pub duration_ms: u64,
    /// 0-100, 0 when unknown
    pub popularity: i64,
    pub external_urls: ExternalUrls,
}

impl PlayRecord {
    /// Apply defaults to a raw row. Problems with single fields are reported and the field is
    /// emptied, the record itself is always kept.
    pub fn from_row(row: PlayRow, diagnostics: &mut Diagnostics) -> Self {
        let track_name = text(row.track_name, "track_name", "", diagnostics).unwrap_or_default();
        let mut column = |value, name: &str| text(value, name, &track_name, diagnostics);

        let artist_name = column(row.artist_name, "artist_name").unwrap_or_default();
        let album_name = column(row.album_name, "album_name").unwrap_or_default();
        let track_id = column(row.track_id, "track_id").unwrap_or_default();
        let album_id = column(row.album_id, "album_id").unwrap_or_default();
        let played_at = column(row.played_at, "played_at");

        let played_at = match played_at.as_deref() {
            None | Some("") => None,
            Some(raw) => {
                let parsed = parse_timestamp(raw);
                if parsed.is_none() {
                    diagnostics.warn(
                        "model",
                        format!("unrecognized played_at `{raw}` for `{track_name}`"),
                    );
                }
                parsed
            }
        };

        let duration_ms = integer(row.duration_ms, "duration_ms", &track_name, diagnostics);
        let popularity = integer(row.popularity, "popularity", &track_name, diagnostics);

        let external_urls = match &row.external_urls {
            None => ExternalUrls::default(),
            Some(value) => ExternalUrls::from_value(value).unwrap_or_else(|err| {
                diagnostics.warn(
                    "model",
                    format!("malformed external_urls for `{track_name}`: {err}"),
                );
                ExternalUrls::default()
            }),
        };

        Self {
            artist_name,
            album_name,
            track_id,
            album_id,
            played_at,
            duration_ms: duration_ms.unwrap_or_default().max(0) as u64,
            popularity: popularity.unwrap_or_default(),
            external_urls,
            track_name,
        }
    }

    /// Grouping key for the ranking. Missing names are empty strings, so records without a
    /// name share one key.
    pub fn key(&self) -> (&str, &str) {
        (&self.track_name, &self.artist_name)
    }
}

fn text(value: Option<Value>, column: &str, track: &str, diagnostics: &mut Diagnostics) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => {
            diagnostics.warn("model", format!("ignoring {column} `{other}` for `{track}`"));
            None
        }
    }
}

/// Whole numbers, also when sent as `180000.0` or `"180000"`
fn integer(value: Option<Value>, column: &str, track: &str, diagnostics: &mut Diagnostics) -> Option<i64> {
    let parsed = match value.as_ref()? {
        Value::Null => return None,
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.fract() == 0.0 && float.abs() < i64::MAX as f64)
                .map(|float| float as i64)
        }),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    };

    if parsed.is_none() {
        if let Some(value) = value {
            diagnostics.warn("model", format!("ignoring {column} `{value}` for `{track}`"));
        }
    }
    parsed
}

/// Parse an ISO-8601 timestamp. Timestamps without an offset are read as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp);
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc().fixed_offset())
}
