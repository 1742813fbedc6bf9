//! Source URL modeling.
//!
//! Validates what the user asked to download before the agent is contacted.
//! YouTube video links in any of their shapes are canonicalised to the watch
//! URL; other http(s) pages are handed to the agent unchanged.

mod youtube;

use thiserror::Error;
use url::Url;

pub use youtube::video_id;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceUrlError {
    #[error("not a URL: {0}")]
    Invalid(String),
    #[error("unsupported scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),
}

/// A download source the agent can be asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceUrl {
    YouTube { video_id: String },
    Other(Url),
}

impl SourceUrl {
    /// Parses user input.
    ///
    /// # Examples
    ///
    /// - `"https://youtu.be/abc"` → `YouTube { video_id: "abc" }`
    /// - `"https://vimeo.com/1"` → `Other(..)`
    /// - `"ftp://host/file"` → `Err(UnsupportedScheme)`
    pub fn parse(input: &str) -> Result<Self, SourceUrlError> {
        let url = Url::parse(input.trim()).map_err(|e| SourceUrlError::Invalid(format!("{input}: {e}")))?;
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(SourceUrlError::UnsupportedScheme(other.to_string())),
        }
        Ok(match video_id(&url) {
            Some(video_id) => SourceUrl::YouTube { video_id },
            None => SourceUrl::Other(url),
        })
    }

    /// URL sent to the agent.
    pub fn to_request_url(&self) -> String {
        match self {
            SourceUrl::YouTube { video_id } => format!("https://www.youtube.com/watch?v={video_id}"),
            SourceUrl::Other(url) => url.to_string(),
        }
    }

    /// Short label for user-facing output.
    pub fn platform(&self) -> &'static str {
        match self {
            SourceUrl::YouTube { .. } => "YouTube",
            SourceUrl::Other(_) => "web",
        }
    }
}
