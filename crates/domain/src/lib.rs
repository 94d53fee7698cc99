use serde::{Deserialize, Serialize};

/// Full video record as returned by the delegate library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoDetails {
    pub video_id: String,
    pub title: String,
    pub length_seconds: u64,
    /// Ordered smallest to largest, the way YouTube lists them
    pub thumbnails: Vec<Thumbnail>,
    pub author: Author,
    pub view_count: u64,
    pub formats: Vec<Format>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thumbnail {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub channel_url: Option<String>,
}

/// One downloadable stream variant of a video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Format {
    /// Delegate-specific format identifier
    pub itag: String,
    pub container: String,
    /// YouTube quality token (`hd1080`, `hd720`, `large`, `medium`, `small`, `tiny`)
    pub quality: Option<String>,
    /// Human readable label such as `720p`
    pub quality_label: Option<String>,
    pub height: Option<u32>,
    pub has_video: bool,
    pub has_audio: bool,
    /// Total bitrate in bits per second
    pub bitrate: Option<u64>,
    /// Audio bitrate in kbps
    pub audio_bitrate: Option<u32>,
}

impl Format {
    pub fn is_audio_only(&self) -> bool {
        self.has_audio && !self.has_video
    }

    pub fn is_video_only(&self) -> bool {
        self.has_video && !self.has_audio
    }
}

/// What the service asks the delegate to pick from a format list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatSelection {
    AudioOnly,
    Quality(String),
}

impl FormatSelection {
    /// Token sent by clients that asks for the audio-only filter
    pub const AUDIO_TOKEN: &'static str = "audio";

    pub fn from_token(token: &str) -> Self {
        if token == Self::AUDIO_TOKEN {
            FormatSelection::AudioOnly
        } else {
            FormatSelection::Quality(token.to_string())
        }
    }
}

impl Default for FormatSelection {
    fn default() -> Self {
        FormatSelection::Quality("highest".to_string())
    }
}

/// Flat projection of a video returned by `/api/video-info`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub title: String,
    pub duration: u64,
    pub thumbnail: String,
    pub author: String,
    pub views: u64,
}

impl VideoInfo {
    /// Project delegate details into the flat record.
    /// Returns `None` when the delegate gave no thumbnails.
    pub fn from_details(details: &VideoDetails) -> Option<Self> {
        let thumbnail = details.thumbnails.last()?;
        Some(Self {
            title: details.title.clone(),
            duration: details.length_seconds,
            thumbnail: thumbnail.url.clone(),
            author: details.author.name.clone(),
            views: details.view_count,
        })
    }
}

/// Entry of the quality menu offered to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QualityOption {
    pub label: &'static str,
    pub quality: &'static str,
    pub format: &'static str,
}

/// Fixed menu of download choices. Not derived from the formats a video
/// actually has, so an entry may have no matching format.
pub const QUALITY_OPTIONS: [QualityOption; 5] = [
    QualityOption {
        label: "1080p HD",
        quality: "hd1080",
        format: "mp4",
    },
    QualityOption {
        label: "720p HD",
        quality: "hd720",
        format: "mp4",
    },
    QualityOption {
        label: "480p",
        quality: "medium",
        format: "mp4",
    },
    QualityOption {
        label: "360p",
        quality: "low",
        format: "mp4",
    },
    QualityOption {
        label: "Audio MP3",
        quality: "audio",
        format: "mp3",
    },
];

/// Body of `/health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}
