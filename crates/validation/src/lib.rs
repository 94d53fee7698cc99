use regex::Regex;

/// Canonical watch page prefix used to rebuild a URL from a bare video ID
pub const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

// Single source of truth for "is this a YouTube video URL". Both the HTTP
// service and the page logic call into this.
lazy_static::lazy_static! {
    static ref YOUTUBE_URL: Regex = Regex::new(
        r"^(https?://)?(www\.)?(youtube\.com/watch\?v=|youtu\.be/)([A-Za-z0-9_-]{11})(\S*)?$"
    )
    .expect("YouTube URL pattern should compile");
    static ref VIDEO_ID: Regex =
        Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("video ID pattern should compile");
    static ref WATCH_ID: Regex =
        Regex::new(r"youtube\.com/watch\?v=([^&]+)").expect("watch ID pattern should compile");
    static ref SHORT_ID: Regex =
        Regex::new(r"youtu\.be/([^?]+)").expect("short link ID pattern should compile");
}

/// Accept only watch/short-link shaped URLs carrying an 11 character video ID.
/// Protocol and `www.` are optional; trailing text must not contain whitespace.
pub fn validate_url(candidate: &str) -> bool {
    YOUTUBE_URL.is_match(candidate)
}

/// A bare video ID is exactly 11 characters of `[A-Za-z0-9_-]`
pub fn validate_video_id(id: &str) -> bool {
    VIDEO_ID.is_match(id)
}

/// Pull the video ID out of a watch URL (`v=` up to the next `&`) or a short
/// link (path up to the query string).
pub fn extract_video_id(url: &str) -> Option<String> {
    [&*WATCH_ID, &*SHORT_ID]
        .iter()
        .find_map(|pattern| pattern.captures(url))
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().to_string())
}

/// Rebuild the canonical watch URL for a video ID. The result is not
/// validated here; callers run it through [`validate_url`].
pub fn watch_url(video_id: &str) -> String {
    format!("{WATCH_URL_PREFIX}{video_id}")
}
