use crate::{ByteStream, DelegateError, VideoDelegate};
use async_trait::async_trait;
use domain::{Author, Format, Thumbnail, VideoDetails};
use serde::Deserialize;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

/// Delegate backed by the `yt-dlp` executable
#[derive(Debug, Clone)]
pub struct YtDlpDelegate {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl YtDlpDelegate {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
        }
    }

    /// Bound the metadata fetch. Streams are never cut off.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }

    async fn dump_json(&self, url: &str) -> Result<Vec<u8>, DelegateError> {
        let run = Command::new(&self.program)
            .args(["--dump-json", "--no-warnings", "--no-playlist", url])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, run)
                .await
                .map_err(|_| DelegateError::Timeout(limit))?,
            None => run.await,
        }
        .map_err(|source| DelegateError::Launch {
            program: self.program_name(),
            source,
        })?;

        if !output.status.success() {
            return Err(DelegateError::Failed {
                program: self.program_name(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

impl Default for YtDlpDelegate {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

#[async_trait]
impl VideoDelegate for YtDlpDelegate {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn get_info(&self, url: &str) -> Result<VideoDetails, DelegateError> {
        let stdout = self.dump_json(url).await?;
        let details = details_from_json(&stdout)?;
        debug!(
            video_id = %details.video_id,
            formats = details.formats.len(),
            "fetched video details"
        );
        Ok(details)
    }

    async fn open_stream(&self, url: &str, format: &Format) -> Result<ByteStream, DelegateError> {
        let mut child = Command::new(&self.program)
            .args([
                "--format",
                format.itag.as_str(),
                "--output",
                "-",
                "--quiet",
                "--no-warnings",
                "--no-playlist",
                url,
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| DelegateError::Launch {
                program: self.program_name(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or(DelegateError::NoOutput)?;

        // Reap the process once the stream is drained and report how it ended
        let itag = format.itag.clone();
        tokio::spawn(async move {
            match child.wait_with_output().await {
                Ok(output) if output.status.success() => {
                    debug!(%itag, "stream process finished");
                }
                Ok(output) => warn!(
                    %itag,
                    status = %output.status,
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "stream process failed"
                ),
                Err(e) => warn!(%itag, error = %e, "could not wait for stream process"),
            }
        });

        Ok(Box::pin(ReaderStream::new(stdout)))
    }
}

#[derive(Debug, Deserialize)]
struct RawInfo {
    id: String,
    title: String,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    thumbnails: Vec<RawThumbnail>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    uploader: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    channel_url: Option<String>,
    #[serde(default)]
    view_count: Option<u64>,
    #[serde(default)]
    formats: Vec<RawFormat>,
}

#[derive(Debug, Deserialize)]
struct RawThumbnail {
    url: String,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawFormat {
    format_id: String,
    ext: String,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    vcodec: Option<String>,
    #[serde(default)]
    acodec: Option<String>,
    /// kbps
    #[serde(default)]
    tbr: Option<f64>,
    /// kbps
    #[serde(default)]
    abr: Option<f64>,
}

fn has_codec(codec: &Option<String>) -> bool {
    codec
        .as_deref()
        .is_some_and(|c| !c.is_empty() && c != "none")
}

/// YouTube's own names for its resolution steps
fn quality_token(height: u32) -> &'static str {
    match height {
        2160.. => "hd2160",
        1440.. => "hd1440",
        1080.. => "hd1080",
        720.. => "hd720",
        480.. => "large",
        360.. => "medium",
        240.. => "small",
        _ => "tiny",
    }
}

impl RawFormat {
    fn into_format(self) -> Option<Format> {
        let has_video = has_codec(&self.vcodec);
        let has_audio = has_codec(&self.acodec);
        // Storyboards and other image tracks carry neither
        if !has_video && !has_audio {
            return None;
        }

        let height = if has_video { self.height } else { None };
        Some(Format {
            itag: self.format_id,
            container: self.ext,
            quality: height.map(|h| quality_token(h).to_string()),
            quality_label: height.map(|h| format!("{h}p")),
            height,
            has_video,
            has_audio,
            bitrate: self.tbr.map(|kbps| (kbps * 1000.0).round() as u64),
            audio_bitrate: self.abr.map(|kbps| kbps.round() as u32),
        })
    }
}

pub(crate) fn details_from_json(raw: &[u8]) -> Result<VideoDetails, DelegateError> {
    let info: RawInfo = serde_json::from_slice(raw)?;

    let mut thumbnails: Vec<Thumbnail> = info
        .thumbnails
        .into_iter()
        .map(|t| Thumbnail {
            url: t.url,
            width: t.width,
            height: t.height,
        })
        .collect();
    if thumbnails.is_empty() {
        if let Some(url) = info.thumbnail {
            thumbnails.push(Thumbnail {
                url,
                width: None,
                height: None,
            });
        }
    }

    Ok(VideoDetails {
        video_id: info.id,
        title: info.title,
        length_seconds: info.duration.map(|d| d.round() as u64).unwrap_or(0),
        thumbnails,
        author: Author {
            name: info.channel.or(info.uploader).unwrap_or_default(),
            channel_url: info.channel_url,
        },
        view_count: info.view_count.unwrap_or(0),
        formats: info
            .formats
            .into_iter()
            .filter_map(RawFormat::into_format)
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = r#"{
        "id": "dQw4w9WgXcQ",
        "title": "Rick Astley - Never Gonna Give You Up",
        "duration": 212.0,
        "channel": "Rick Astley",
        "uploader": "RickAstleyVEVO",
        "channel_url": "https://www.youtube.com/channel/UCuAXFkgsw1L7xaCfnd5JJOw",
        "view_count": 1600000000,
        "thumbnails": [
            {"url": "https://i.ytimg.com/vi/dQw4w9WgXcQ/default.jpg", "width": 120, "height": 90},
            {"url": "https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg", "width": 1280, "height": 720}
        ],
        "formats": [
            {"format_id": "sb0", "ext": "mhtml", "vcodec": "none", "acodec": "none"},
            {"format_id": "140", "ext": "m4a", "vcodec": "none", "acodec": "mp4a.40.2", "abr": 129.5, "tbr": 129.5},
            {"format_id": "18", "ext": "mp4", "height": 360, "vcodec": "avc1.42001E", "acodec": "mp4a.40.2", "tbr": 503.2},
            {"format_id": "137", "ext": "mp4", "height": 1080, "vcodec": "avc1.640028", "acodec": "none", "tbr": 4400.0},
            {"format_id": "135", "ext": "mp4", "height": 480, "vcodec": "avc1.4d401f", "acodec": "none"}
        ],
        "extractor": "youtube"
    }"#;

    #[test]
    fn maps_dump_json() {
        let details = details_from_json(DUMP.as_bytes()).unwrap();
        assert_eq!(details.video_id, "dQw4w9WgXcQ");
        assert_eq!(details.length_seconds, 212);
        assert_eq!(details.author.name, "Rick Astley");
        assert_eq!(details.view_count, 1_600_000_000);
        assert_eq!(
            details.thumbnails.last().unwrap().url,
            "https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg"
        );
    }

    #[test]
    fn drops_storyboards_and_tags_quality() {
        let details = details_from_json(DUMP.as_bytes()).unwrap();
        let itags: Vec<&str> = details.formats.iter().map(|f| f.itag.as_str()).collect();
        assert_eq!(itags, vec!["140", "18", "137", "135"]);

        let audio = &details.formats[0];
        assert!(audio.is_audio_only());
        assert_eq!(audio.quality, None);
        assert_eq!(audio.audio_bitrate, Some(130));

        let hd = &details.formats[2];
        assert_eq!(hd.quality.as_deref(), Some("hd1080"));
        assert_eq!(hd.quality_label.as_deref(), Some("1080p"));
        assert!(hd.is_video_only());

        assert_eq!(details.formats[1].quality.as_deref(), Some("medium"));
        assert_eq!(details.formats[3].quality.as_deref(), Some("large"));
    }

    #[test]
    fn single_thumbnail_field_is_used_as_fallback() {
        let raw = r#"{"id": "x", "title": "t", "thumbnail": "https://img/x.jpg"}"#;
        let details = details_from_json(raw.as_bytes()).unwrap();
        assert_eq!(details.thumbnails.len(), 1);
        assert_eq!(details.length_seconds, 0);
        assert!(details.formats.is_empty());
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let err = details_from_json(b"ERROR: not json").unwrap_err();
        assert!(matches!(err, DelegateError::Parse(_)));
    }

    #[test]
    fn quality_tokens_follow_youtube_names() {
        assert_eq!(quality_token(2160), "hd2160");
        assert_eq!(quality_token(1080), "hd1080");
        assert_eq!(quality_token(720), "hd720");
        assert_eq!(quality_token(480), "large");
        assert_eq!(quality_token(360), "medium");
        assert_eq!(quality_token(144), "tiny");
    }

    #[tokio::test]
    async fn missing_binary_is_a_launch_error() {
        let delegate = YtDlpDelegate::new("/nonexistent/yt-dlp");
        let err = delegate
            .get_info("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
            .await
            .unwrap_err();
        assert!(matches!(err, DelegateError::Launch { .. }));
    }
}
