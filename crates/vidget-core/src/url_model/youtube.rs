//! YouTube video id extraction.

use url::Url;

fn is_youtube_host(host: &str) -> bool {
    host == "youtube.com" || host.ends_with(".youtube.com")
}

/// Extracts the video id from a watch, shorts or youtu.be URL.
///
/// Returns `None` for any other URL, including YouTube pages that are not a
/// single video (channel, search, playlist without `v`).
pub fn video_id(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    let id = if host == "youtu.be" {
        url.path_segments()?.next().map(str::to_string)
    } else if is_youtube_host(&host) {
        let mut segments = url.path_segments()?;
        match segments.next() {
            Some("watch") => url
                .query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned()),
            Some("shorts") => segments.next().map(str::to_string),
            _ => None,
        }
    } else {
        None
    };
    id.filter(|id| !id.is_empty())
}
