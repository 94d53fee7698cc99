use async_trait::async_trait;
use bytes::Bytes;
use domain::{Format, FormatSelection, VideoDetails};
use futures::Stream;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

pub mod chooser;
mod memory;
mod ytdlp;

pub use chooser::choose_format;
pub use memory::{FIXTURE_VIDEO_ID, InMemoryDelegate, MAX_RECORDED_SELECTIONS};
pub use ytdlp::YtDlpDelegate;

/// Raw media bytes produced by a delegate
pub type ByteStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>;

#[derive(Debug, Error)]
pub enum DelegateError {
    #[error("video not found: {0}")]
    NotFound(String),

    #[error("failed to launch {program}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("unreadable delegate output")]
    Parse(#[from] serde_json::Error),

    #[error("delegate did not answer within {0:?}")]
    Timeout(Duration),

    #[error("delegate process has no stdout")]
    NoOutput,
}

/// Seam to the library that does all YouTube specific work.
/// Everything behind it (metadata, format lists, stream extraction) is opaque
/// to the service.
#[async_trait]
pub trait VideoDelegate: Send + Sync {
    /// Name of the delegate (for logging)
    fn name(&self) -> &'static str;

    /// Fetch metadata and the available formats for a video URL
    async fn get_info(&self, url: &str) -> Result<VideoDetails, DelegateError>;

    /// Pick one format out of `formats`, or `None` if nothing matches
    fn choose_format(&self, formats: &[Format], selection: &FormatSelection) -> Option<Format> {
        choose_format(formats, selection)
    }

    /// Open the byte stream of a single format
    async fn open_stream(&self, url: &str, format: &Format) -> Result<ByteStream, DelegateError>;
}
