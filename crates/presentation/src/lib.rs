//! Page logic for the download front-end.
//!
//! Each control on the page has an id; events are routed through a table
//! keyed by that id to a handler that takes the current [`PageState`] and
//! returns the next one together with the side effects the host has to run
//! (HTTP calls, navigation, scrolling).

use domain::{QUALITY_OPTIONS, VideoInfo};
use std::collections::HashMap;

mod render;

pub use render::{escape_html, render_download_grid};

pub const MENU_BUTTON: &str = "menu-btn";
pub const NAV_MENU: &str = "nav-menu";
pub const ANALYZE_BUTTON: &str = "analyzeBtn";
pub const URL_INPUT: &str = "videoUrl";
pub const DOCUMENT: &str = "document";
pub const DOWNLOAD_BUTTON: &str = "download";
pub const VIDEO_INFO_PANEL: &str = "videoInfo";

const EMPTY_URL: &str = "Please enter a YouTube video URL";
const INVALID_URL: &str = "Please enter a valid YouTube video URL";
const FETCH_FALLBACK: &str = "Failed to fetch video information";

/// `0` reads as unknown; otherwise `M:SS` or `H:MM:SS`
pub fn format_duration(seconds: u64) -> String {
    if seconds == 0 {
        return "Duration unknown".to_string();
    }
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageState {
    pub url_input: String,
    pub menu_open: bool,
    pub loading: bool,
    pub error: Option<String>,
    /// ID of the video whose info request is in flight
    pub pending_video_id: Option<String>,
    pub video: Option<VideoCard>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoCard {
    pub video_id: String,
    pub thumbnail: String,
    pub title: String,
    pub duration: String,
    pub links: Vec<DownloadLink>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadLink {
    pub label: String,
    pub format: String,
    pub video_id: String,
    pub quality: String,
}

impl DownloadLink {
    pub fn href(&self) -> String {
        format!(
            "/api/download?videoId={}&quality={}",
            urlencoding::encode(&self.video_id),
            urlencoding::encode(&self.quality)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UiEvent {
    /// Id of the control the handler is registered on
    pub control: String,
    pub kind: EventKind,
}

impl UiEvent {
    pub fn new(control: &str, kind: EventKind) -> Self {
        Self {
            control: control.to_string(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// `target` is the id of the control the click actually landed on
    Click { target: String },
    KeyPress(String),
    Input(String),
    Download { video_id: String, quality: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// GET `path` against the backend, then feed the result to
    /// [`apply_fetch_outcome`]
    FetchVideoInfo { url: String, path: String },
    Navigate(String),
    ScrollIntoView(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: PageState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn unchanged(state: &PageState) -> Self {
        Self::new(state.clone())
    }

    fn new(state: PageState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }

    fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

pub type Handler = fn(&PageState, &EventKind) -> Transition;

/// Result of the `/api/video-info` call
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Loaded(VideoInfo),
    /// Carries the server's `error` message when it sent one
    Failed(Option<String>),
}

/// Event table keyed by control id
pub struct Dispatcher {
    handlers: HashMap<&'static str, Handler>,
}

impl Dispatcher {
    pub fn new() -> Self {
        let mut handlers: HashMap<&'static str, Handler> = HashMap::new();
        handlers.insert(MENU_BUTTON, toggle_menu);
        handlers.insert(DOCUMENT, close_menu_on_outside_click);
        handlers.insert(ANALYZE_BUTTON, analyze_clicked);
        handlers.insert(URL_INPUT, url_input_event);
        handlers.insert(DOWNLOAD_BUTTON, download_clicked);
        Self { handlers }
    }

    pub fn dispatch(&self, state: &PageState, event: &UiEvent) -> Transition {
        match self.handlers.get(event.control.as_str()) {
            Some(handler) => handler(state, &event.kind),
            None => Transition::unchanged(state),
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn toggle_menu(state: &PageState, event: &EventKind) -> Transition {
    match event {
        EventKind::Click { .. } => Transition::new(PageState {
            menu_open: !state.menu_open,
            ..state.clone()
        }),
        _ => Transition::unchanged(state),
    }
}

fn close_menu_on_outside_click(state: &PageState, event: &EventKind) -> Transition {
    match event {
        EventKind::Click { target }
            if state.menu_open && target != NAV_MENU && target != MENU_BUTTON =>
        {
            Transition::new(PageState {
                menu_open: false,
                ..state.clone()
            })
        }
        _ => Transition::unchanged(state),
    }
}

fn analyze_clicked(state: &PageState, event: &EventKind) -> Transition {
    match event {
        // The button is disabled while a request is running
        EventKind::Click { .. } if !state.loading => analyze(state),
        _ => Transition::unchanged(state),
    }
}

fn url_input_event(state: &PageState, event: &EventKind) -> Transition {
    match event {
        EventKind::Input(value) => Transition::new(PageState {
            url_input: value.clone(),
            ..state.clone()
        }),
        EventKind::KeyPress(key) if key == "Enter" => analyze(state),
        _ => Transition::unchanged(state),
    }
}

fn download_clicked(state: &PageState, event: &EventKind) -> Transition {
    match event {
        EventKind::Download { video_id, quality } => {
            let link = DownloadLink {
                label: String::new(),
                format: String::new(),
                video_id: video_id.clone(),
                quality: quality.clone(),
            };
            Transition::unchanged(state).with_effect(Effect::Navigate(link.href()))
        }
        _ => Transition::unchanged(state),
    }
}

fn analyze(state: &PageState) -> Transition {
    let url = state.url_input.trim();

    if url.is_empty() {
        return show_error(state, EMPTY_URL);
    }
    if !validation::validate_url(url) {
        return show_error(state, INVALID_URL);
    }

    let next = PageState {
        loading: true,
        error: None,
        video: None,
        pending_video_id: validation::extract_video_id(url),
        ..state.clone()
    };
    Transition::new(next).with_effect(Effect::FetchVideoInfo {
        url: url.to_string(),
        path: format!("/api/video-info?url={}", urlencoding::encode(url)),
    })
}

fn show_error(state: &PageState, message: &str) -> Transition {
    Transition::new(PageState {
        error: Some(message.to_string()),
        ..state.clone()
    })
}

/// Fold the answer of the info request into the page
pub fn apply_fetch_outcome(state: &PageState, outcome: FetchOutcome) -> Transition {
    let mut next = PageState {
        loading: false,
        ..state.clone()
    };
    let video_id = next.pending_video_id.take().unwrap_or_default();

    match outcome {
        FetchOutcome::Loaded(info) => {
            next.video = Some(video_card(&video_id, &info));
            Transition::new(next).with_effect(Effect::ScrollIntoView(VIDEO_INFO_PANEL))
        }
        FetchOutcome::Failed(message) => {
            next.error = Some(message.unwrap_or_else(|| FETCH_FALLBACK.to_string()));
            Transition::new(next)
        }
    }
}

fn video_card(video_id: &str, info: &VideoInfo) -> VideoCard {
    let thumbnail = if info.thumbnail.is_empty() {
        format!("https://img.youtube.com/vi/{video_id}/maxresdefault.jpg")
    } else {
        info.thumbnail.clone()
    };
    let title = if info.title.is_empty() {
        "Video Title".to_string()
    } else {
        info.title.clone()
    };

    VideoCard {
        video_id: video_id.to_string(),
        thumbnail,
        title,
        duration: format_duration(info.duration),
        links: QUALITY_OPTIONS
            .iter()
            .map(|option| DownloadLink {
                label: option.label.to_string(),
                format: option.format.to_uppercase(),
                video_id: video_id.to_string(),
                quality: option.quality.to_string(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

    fn info() -> VideoInfo {
        VideoInfo {
            title: "Never Gonna Give You Up".to_string(),
            duration: 212,
            thumbnail: "https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg".to_string(),
            author: "Rick Astley".to_string(),
            views: 42,
        }
    }

    fn click(control: &str, target: &str) -> UiEvent {
        UiEvent::new(
            control,
            EventKind::Click {
                target: target.to_string(),
            },
        )
    }

    fn typed(url: &str) -> PageState {
        Dispatcher::new()
            .dispatch(
                &PageState::default(),
                &UiEvent::new(URL_INPUT, EventKind::Input(url.to_string())),
            )
            .state
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(0), "Duration unknown");
        assert_eq!(format_duration(65), "1:05");
        assert_eq!(format_duration(3665), "1:01:05");
        assert_eq!(format_duration(59), "0:59");
        assert_eq!(format_duration(3600), "1:00:00");
    }

    #[test]
    fn menu_toggles_and_closes_on_outside_click() {
        let dispatcher = Dispatcher::new();
        let open = dispatcher
            .dispatch(&PageState::default(), &click(MENU_BUTTON, MENU_BUTTON))
            .state;
        assert!(open.menu_open);

        let still_open = dispatcher.dispatch(&open, &click(DOCUMENT, NAV_MENU)).state;
        assert!(still_open.menu_open);

        let closed = dispatcher.dispatch(&open, &click(DOCUMENT, "hero")).state;
        assert!(!closed.menu_open);
    }

    #[test]
    fn empty_input_shows_error() {
        let state = typed("   ");
        let transition = Dispatcher::new().dispatch(&state, &click(ANALYZE_BUTTON, ANALYZE_BUTTON));
        assert_eq!(transition.state.error.as_deref(), Some(EMPTY_URL));
        assert!(transition.effects.is_empty());
        assert!(!transition.state.loading);
    }

    #[test]
    fn invalid_input_shows_error() {
        let state = typed("https://vimeo.com/123");
        let transition = Dispatcher::new().dispatch(&state, &click(ANALYZE_BUTTON, ANALYZE_BUTTON));
        assert_eq!(transition.state.error.as_deref(), Some(INVALID_URL));
        assert!(transition.effects.is_empty());
    }

    #[test]
    fn enter_key_starts_fetch() {
        let state = typed(&format!("  {URL}  "));
        let transition = Dispatcher::new().dispatch(
            &state,
            &UiEvent::new(URL_INPUT, EventKind::KeyPress("Enter".to_string())),
        );

        assert!(transition.state.loading);
        assert_eq!(transition.state.error, None);
        assert_eq!(
            transition.state.pending_video_id.as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            transition.effects,
            vec![Effect::FetchVideoInfo {
                url: URL.to_string(),
                path: "/api/video-info?url=https%3A%2F%2Fwww.youtube.com%2Fwatch%3Fv%3DdQw4w9WgXcQ"
                    .to_string(),
            }]
        );
    }

    #[test]
    fn other_keys_do_nothing() {
        let state = typed(URL);
        let transition = Dispatcher::new().dispatch(
            &state,
            &UiEvent::new(URL_INPUT, EventKind::KeyPress("a".to_string())),
        );
        assert_eq!(transition.state, state);
        assert!(transition.effects.is_empty());
    }

    #[test]
    fn analyze_is_ignored_while_loading() {
        let state = PageState {
            loading: true,
            url_input: URL.to_string(),
            ..PageState::default()
        };
        let transition = Dispatcher::new().dispatch(&state, &click(ANALYZE_BUTTON, ANALYZE_BUTTON));
        assert!(transition.effects.is_empty());
    }

    #[test]
    fn loaded_info_renders_card() {
        let dispatcher = Dispatcher::new();
        let loading = dispatcher
            .dispatch(&typed(URL), &click(ANALYZE_BUTTON, ANALYZE_BUTTON))
            .state;

        let transition = apply_fetch_outcome(&loading, FetchOutcome::Loaded(info()));
        assert!(!transition.state.loading);
        assert_eq!(transition.state.pending_video_id, None);
        assert_eq!(
            transition.effects,
            vec![Effect::ScrollIntoView(VIDEO_INFO_PANEL)]
        );

        let card = transition.state.video.unwrap();
        assert_eq!(card.video_id, "dQw4w9WgXcQ");
        assert_eq!(card.duration, "3:32");
        assert_eq!(card.links.len(), QUALITY_OPTIONS.len());
        assert_eq!(card.links[4].format, "MP3");
        assert_eq!(
            card.links[0].href(),
            "/api/download?videoId=dQw4w9WgXcQ&quality=hd1080"
        );
    }

    #[test]
    fn blank_fields_fall_back() {
        let loading = PageState {
            pending_video_id: Some("dQw4w9WgXcQ".to_string()),
            loading: true,
            ..PageState::default()
        };
        let blank = VideoInfo {
            title: String::new(),
            duration: 0,
            thumbnail: String::new(),
            author: String::new(),
            views: 0,
        };
        let card = apply_fetch_outcome(&loading, FetchOutcome::Loaded(blank))
            .state
            .video
            .unwrap();
        assert_eq!(card.title, "Video Title");
        assert_eq!(card.duration, "Duration unknown");
        assert_eq!(
            card.thumbnail,
            "https://img.youtube.com/vi/dQw4w9WgXcQ/maxresdefault.jpg"
        );
    }

    #[test]
    fn failure_shows_server_message_or_fallback() {
        let loading = PageState {
            loading: true,
            ..PageState::default()
        };

        let with_message = apply_fetch_outcome(
            &loading,
            FetchOutcome::Failed(Some("Invalid YouTube URL".to_string())),
        );
        assert_eq!(
            with_message.state.error.as_deref(),
            Some("Invalid YouTube URL")
        );
        assert!(!with_message.state.loading);

        let without = apply_fetch_outcome(&loading, FetchOutcome::Failed(None));
        assert_eq!(without.state.error.as_deref(), Some(FETCH_FALLBACK));
        assert_eq!(without.state.video, None);
    }

    #[test]
    fn download_navigates_to_backend() {
        let transition = Dispatcher::new().dispatch(
            &PageState::default(),
            &UiEvent::new(
                DOWNLOAD_BUTTON,
                EventKind::Download {
                    video_id: "dQw4w9WgXcQ".to_string(),
                    quality: "audio".to_string(),
                },
            ),
        );
        assert_eq!(
            transition.effects,
            vec![Effect::Navigate(
                "/api/download?videoId=dQw4w9WgXcQ&quality=audio".to_string()
            )]
        );
    }

    #[test]
    fn unknown_control_is_ignored() {
        let state = typed(URL);
        let transition = Dispatcher::new().dispatch(&state, &click("footer", "footer"));
        assert_eq!(transition.state, state);
        assert!(transition.effects.is_empty());
    }
}
