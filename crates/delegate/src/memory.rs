use crate::{ByteStream, DelegateError, VideoDelegate};
use async_trait::async_trait;
use bytes::Bytes;
use domain::{Author, Format, FormatSelection, Thumbnail, VideoDetails};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

/// Video ID of the seeded fixture video
pub const FIXTURE_VIDEO_ID: &str = "dQw4w9WgXcQ";

/// Only the most recent selections are kept
pub const MAX_RECORDED_SELECTIONS: usize = 32;

/// In-memory delegate serving seeded videos.
/// Records the last [`MAX_RECORDED_SELECTIONS`] format selections it is asked
/// to make so callers can check what the service requested.
#[derive(Clone)]
pub struct InMemoryDelegate {
    videos: Arc<RwLock<HashMap<String, VideoDetails>>>,
    selections: Arc<RwLock<VecDeque<FormatSelection>>>,
}

impl InMemoryDelegate {
    /// Create a delegate seeded with the fixture video
    pub fn new() -> Self {
        let delegate = Self::empty();
        delegate.populate_fixture();
        delegate
    }

    /// Create a delegate with no videos at all
    pub fn empty() -> Self {
        Self {
            videos: Arc::new(RwLock::new(HashMap::new())),
            selections: Arc::new(RwLock::new(VecDeque::new())),
        }
    }

    fn populate_fixture(&self) {
        let thumbnail = |name: &str, width: u32, height: u32| Thumbnail {
            url: format!("https://i.ytimg.com/vi/{FIXTURE_VIDEO_ID}/{name}.jpg"),
            width: Some(width),
            height: Some(height),
        };
        let format = |itag: &str,
                      container: &str,
                      quality: Option<&str>,
                      height: Option<u32>,
                      has_video: bool,
                      has_audio: bool,
                      bitrate: u64,
                      audio_bitrate: Option<u32>| Format {
            itag: itag.to_string(),
            container: container.to_string(),
            quality: quality.map(str::to_string),
            quality_label: height.map(|h| format!("{h}p")),
            height,
            has_video,
            has_audio,
            bitrate: Some(bitrate),
            audio_bitrate,
        };

        self.add_video(VideoDetails {
            video_id: FIXTURE_VIDEO_ID.to_string(),
            title: "Rick Astley - Never Gonna Give You Up (Official Music Video)".to_string(),
            length_seconds: 212,
            thumbnails: vec![
                thumbnail("default", 120, 90),
                thumbnail("hqdefault", 480, 360),
                thumbnail("maxresdefault", 1280, 720),
            ],
            author: Author {
                name: "Rick Astley".to_string(),
                channel_url: Some("https://www.youtube.com/@RickAstleyYT".to_string()),
            },
            view_count: 1_600_000_000,
            formats: vec![
                format("18", "mp4", Some("medium"), Some(360), true, true, 503_000, Some(96)),
                format("22", "mp4", Some("hd720"), Some(720), true, true, 1_200_000, Some(192)),
                format("137", "mp4", Some("hd1080"), Some(1080), true, false, 4_400_000, None),
                format("140", "m4a", None, None, false, true, 130_000, Some(128)),
                format("251", "webm", None, None, false, true, 160_000, Some(160)),
            ],
        });
    }

    /// Add or replace a video
    pub fn add_video(&self, video: VideoDetails) {
        self.videos
            .write()
            .expect("Failed to acquire write lock on videos")
            .insert(video.video_id.clone(), video);
    }

    /// Recent selections passed to `choose_format`, oldest first
    pub fn selections(&self) -> Vec<FormatSelection> {
        self.selections
            .read()
            .expect("Failed to acquire read lock on selections")
            .iter()
            .cloned()
            .collect()
    }

    fn lookup(&self, url: &str) -> Result<VideoDetails, DelegateError> {
        let id = validation::extract_video_id(url)
            .ok_or_else(|| DelegateError::NotFound(url.to_string()))?;
        self.videos
            .read()
            .expect("Failed to acquire read lock on videos")
            .get(&id)
            .cloned()
            .ok_or(DelegateError::NotFound(id))
    }
}

impl Default for InMemoryDelegate {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VideoDelegate for InMemoryDelegate {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get_info(&self, url: &str) -> Result<VideoDetails, DelegateError> {
        self.lookup(url)
    }

    fn choose_format(&self, formats: &[Format], selection: &FormatSelection) -> Option<Format> {
        {
            let mut selections = self
                .selections
                .write()
                .expect("Failed to acquire write lock on selections");
            if selections.len() == MAX_RECORDED_SELECTIONS {
                selections.pop_front();
            }
            selections.push_back(selection.clone());
        }
        crate::choose_format(formats, selection)
    }

    async fn open_stream(&self, url: &str, format: &Format) -> Result<ByteStream, DelegateError> {
        let video = self.lookup(url)?;
        // Two chunks so consumers see a real stream, not a single buffer
        let chunks: Vec<std::io::Result<Bytes>> = vec![
            Ok(Bytes::from(format!("{}:", video.video_id))),
            Ok(Bytes::from(format!("{}.{}", format.itag, format.container))),
        ];
        Ok(Box::pin(futures::stream::iter(chunks)))
    }
}
