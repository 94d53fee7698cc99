use crate::VideoCard;

/// Escape text for use in HTML content and double-quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// HTML for the grid of download choices under a video card
pub fn render_download_grid(card: &VideoCard) -> String {
    card.links
        .iter()
        .map(|link| {
            format!(
                concat!(
                    "<div class=\"download-item\">",
                    "<div class=\"quality\">{}</div>",
                    "<div class=\"format\">{}</div>",
                    "<a class=\"download-btn\" href=\"{}\">Download</a>",
                    "</div>"
                ),
                escape_html(&link.label),
                escape_html(&link.format),
                escape_html(&link.href()),
            )
        })
        .collect()
}
