//! Format selection over a delegate's format list.
//!
//! Ranking puts formats carrying both audio and video first, then orders by
//! video height, total bitrate and audio bitrate, all descending. Named
//! tokens (`highest`, `lowestaudio`, ...) pick from that ranking; any other
//! token must equal a format's quality token, quality label or itag.

use domain::{Format, FormatSelection};
use std::cmp::Reverse;

pub fn choose_format(formats: &[Format], selection: &FormatSelection) -> Option<Format> {
    match selection {
        FormatSelection::AudioOnly => {
            let mut audio: Vec<&Format> = formats.iter().filter(|f| f.is_audio_only()).collect();
            audio.sort_by_key(|f| Reverse((f.audio_bitrate.unwrap_or(0), f.bitrate.unwrap_or(0))));
            audio.first().map(|f| (*f).clone())
        }
        FormatSelection::Quality(token) => by_quality(formats, token),
    }
}

fn by_quality(formats: &[Format], token: &str) -> Option<Format> {
    let ranked = ranked(formats.iter().collect());

    let picked = match token {
        "highest" => ranked.first().copied(),
        "lowest" => ranked.last().copied(),
        "highestvideo" | "lowestvideo" => {
            let video = ranked_video(&ranked);
            if token == "highestvideo" {
                video.first().copied()
            } else {
                video.last().copied()
            }
        }
        "highestaudio" | "lowestaudio" => {
            let audio = ranked_audio(&ranked);
            if token == "highestaudio" {
                audio.first().copied()
            } else {
                audio.last().copied()
            }
        }
        _ => ranked.into_iter().find(|f| {
            f.quality.as_deref() == Some(token)
                || f.quality_label.as_deref() == Some(token)
                || f.itag == token
        }),
    };

    picked.cloned()
}

fn ranked(mut formats: Vec<&Format>) -> Vec<&Format> {
    formats.sort_by_key(|f| {
        Reverse((
            f.has_video && f.has_audio,
            f.height.unwrap_or(0),
            f.bitrate.unwrap_or(0),
            f.audio_bitrate.unwrap_or(0),
        ))
    });
    formats
}

// Video ranking ignores whether audio is muxed in
fn ranked_video<'a>(ranked: &[&'a Format]) -> Vec<&'a Format> {
    let mut video: Vec<&Format> = ranked.iter().copied().filter(|f| f.has_video).collect();
    video.sort_by_key(|f| Reverse((f.height.unwrap_or(0), f.bitrate.unwrap_or(0))));
    video
}

fn ranked_audio<'a>(ranked: &[&'a Format]) -> Vec<&'a Format> {
    let mut audio: Vec<&Format> = ranked.iter().copied().filter(|f| f.has_audio).collect();
    audio.sort_by_key(|f| Reverse((f.audio_bitrate.unwrap_or(0), f.bitrate.unwrap_or(0))));
    audio
}
