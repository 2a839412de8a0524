use std::future::Future;

use base64::Engine;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::logging::Diagnostics;

pub static DEFAULT_OEMBED_ENDPOINT: &str = "https://open.spotify.com/oembed";

/// 1x1 transparent PNG, used whenever cover art can not be embedded
pub static PLACEHOLDER_DATA_URI: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

/// Source of cover art for a track's public URL
pub trait CoverArt {
    /// Thumbnail image URL for a track, `None` when there is no art
    fn thumbnail_url(
        &self,
        track_url: &str,
        diagnostics: &mut Diagnostics,
    ) -> impl Future<Output = Option<String>>;

    /// Image as a `data:` URI. Always returns something that can be embedded.
    fn data_uri(&self, image_url: &str, diagnostics: &mut Diagnostics) -> impl Future<Output = String>;
}

#[derive(Debug, Deserialize)]
struct OEmbed {
    thumbnail_url: Option<String>,
}

/// Cover art through Spotify's oEmbed endpoint
#[derive(Debug, Clone)]
pub struct OEmbedClient {
    client: reqwest::Client,
    endpoint: String,
}

impl OEmbedClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_endpoint(client, DEFAULT_OEMBED_ENDPOINT)
    }

    pub fn with_endpoint<S: Into<String>>(client: reqwest::Client, endpoint: S) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    async fn lookup(&self, track_url: &str) -> Result<Option<String>> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("url", track_url)])
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(Error::custom(format!("oembed returned {}", response.status())));
        }

        let body: OEmbed = response.json().await?;
        Ok(body.thumbnail_url.filter(|url| !url.is_empty()))
    }

    async fn download(&self, image_url: &str) -> Result<String> {
        let response = self.client.get(image_url).send().await?;
        if !response.status().is_success() {
            return Err(Error::custom(format!("image returned {}", response.status())));
        }

        let content_type = image_content_type(
            response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok()),
        );

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(Error::custom("image body is empty"));
        }

        Ok(to_data_uri(&content_type, &bytes))
    }
}

impl CoverArt for OEmbedClient {
    async fn thumbnail_url(&self, track_url: &str, diagnostics: &mut Diagnostics) -> Option<String> {
        match self.lookup(track_url).await {
            Ok(Some(url)) => Some(url),
            Ok(None) => {
                diagnostics.warn("cover", format!("no thumbnail for {track_url}"));
                None
            }
            Err(err) => {
                diagnostics.warn("cover", format!("cover lookup failed for {track_url}: {err}"));
                None
            }
        }
    }

    async fn data_uri(&self, image_url: &str, diagnostics: &mut Diagnostics) -> String {
        match self.download(image_url).await {
            Ok(uri) => uri,
            Err(err) => {
                diagnostics.warn("cover", format!("using placeholder for {image_url}: {err}"));
                PLACEHOLDER_DATA_URI.to_string()
            }
        }
    }
}

/// Media type for a data URI from a `Content-Type` header. Anything that is not a plain
/// `image/<subtype>` becomes `image/jpeg`.
pub fn image_content_type(header: Option<&str>) -> String {
    header
        .and_then(|value| value.split(';').next())
        .map(|value| value.trim().to_ascii_lowercase())
        .filter(|value| {
            value.strip_prefix("image/").is_some_and(|subtype| {
                !subtype.is_empty()
                    && subtype
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | '-'))
            })
        })
        .unwrap_or_else(|| "image/jpeg".to_string())
}

pub fn to_data_uri(content_type: &str, bytes: &[u8]) -> String {
    format!(
        "data:{content_type};base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}
