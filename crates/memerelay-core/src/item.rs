use serde::{Deserialize, Serialize};

/// Maximum caption length kept at ingestion, in characters.
pub const CAPTION_LIMIT: usize = 200;

/// One admissible content unit awaiting dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    url: String,
    caption: String,
}

impl Item {
    /// Builds an item, truncating the caption to [`CAPTION_LIMIT`] characters.
    #[must_use]
    pub fn new(url: impl Into<String>, caption: &str) -> Self {
        Self {
            url: url.into(),
            caption: truncate_str(caption, CAPTION_LIMIT),
        }
    }

    /// Image URL, also the deduplication key.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Caption sent along with the image.
    #[must_use]
    pub fn caption(&self) -> &str {
        &self.caption
    }
}

/// Raw post returned by the scraper service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    /// Full-size image URL
    #[serde(default)]
    pub display_url: Option<String>,
    /// Post URL, used when no display URL is present
    #[serde(default)]
    pub url: Option<String>,
    /// Post caption
    #[serde(default)]
    pub caption: Option<String>,
    /// Video flag
    #[serde(default)]
    pub is_video: Option<bool>,
    /// Post type, e.g. `Image`, `Sidecar` or `Video`
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Reel flag
    #[serde(default)]
    pub is_reel: Option<bool>,
}

impl PostRecord {
    /// Resolves the image URL, preferring `displayUrl`. Empty strings count as absent.
    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        [self.display_url.as_deref(), self.url.as_deref()]
            .into_iter()
            .flatten()
            .find(|u| !u.is_empty())
    }

    /// Caption or the empty string.
    #[must_use]
    pub fn caption_text(&self) -> &str {
        self.caption.as_deref().unwrap_or_default()
    }

    /// True when any of the type indicators marks the post as video.
    #[must_use]
    pub fn is_video(&self) -> bool {
        self.is_video.unwrap_or(false)
            || self.is_reel.unwrap_or(false)
            || self.kind.as_deref() == Some("Video")
    }
}

/// Safely truncates a string to `max_chars` characters.
#[must_use]
pub fn truncate_str(s: impl AsRef<str>, max_chars: usize) -> String {
    let s = s.as_ref();
    s.char_indices()
        .nth(max_chars)
        .map_or_else(|| s.to_string(), |(pos, _)| s[..pos].to_string())
}
