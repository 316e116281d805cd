//! Result page viewer.

use once_cell::sync::Lazy;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use regex::Regex;

use crate::app::submit::Document;

static SCRIPT_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script>").expect("valid regex"));
static STYLE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style>").expect("valid regex"));
static LINE_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(p|div|h[1-6]|li|section|title|ul)>").expect("valid regex")
});
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static CONTENT_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<(pre|textarea)\b[^>]*\bid="content"[^>]*>(.*?)</(?:pre|textarea)>"#)
        .expect("valid regex")
});

/// A result page shown in the terminal, plus how it was reached.
#[derive(Debug, Clone)]
pub struct DocumentState {
    document: Document,
    text: String,
    /// `true` when the page replaced the picker instead of navigating away from it.
    replaced: bool,
    scroll: u16,
}

impl DocumentState {
    pub fn navigated(document: Document) -> Self {
        Self::new(document, false)
    }

    pub fn replaced(document: Document) -> Self {
        Self::new(document, true)
    }

    fn new(document: Document, replaced: bool) -> Self {
        let text = html_to_text(&document.html);
        Self {
            document,
            text,
            replaced,
            scroll: 0,
        }
    }

    pub fn is_replacement(&self) -> bool {
        self.replaced
    }

    pub fn action(&self) -> &str {
        &self.document.action
    }

    /// The text a copy should place on the clipboard.
    pub fn copy_text(&self) -> String {
        content_text(&self.document.html).unwrap_or_else(|| self.text.clone())
    }

    pub fn scroll_by(&mut self, delta: i32) {
        let max = self.text.lines().count().saturating_sub(1) as i32;
        self.scroll = (self.scroll as i32 + delta).clamp(0, max.max(0)) as u16;
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll = 0;
    }
}

/// Ratatui component drawing a [`DocumentState`].
#[derive(Debug, Default)]
pub struct DocumentView;

impl DocumentView {
    pub fn render(&self, state: &DocumentState, area: Rect, buf: &mut Buffer) {
        let how = if state.replaced { "replaced" } else { "result" };
        let block = Block::default()
            .title(format!("{how} · {} · y copy · esc back", state.action()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let paragraph = Paragraph::new(state.text.as_str())
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((state.scroll, 0));
        paragraph.render(area, buf);
    }
}

/// Flatten an HTML page into readable text.
pub fn html_to_text(html: &str) -> String {
    let without_scripts = SCRIPT_BLOCK.replace_all(html, "");
    let without_styles = STYLE_BLOCK.replace_all(&without_scripts, "");
    let with_breaks = LINE_BREAK.replace_all(&without_styles, "\n");
    let stripped = TAG.replace_all(&with_breaks, "");
    let decoded = decode_entities(&stripped);

    let mut text = String::with_capacity(decoded.len());
    let mut blank_run = 0;
    for line in decoded.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        text.push_str(line);
        text.push('\n');
    }
    text.trim().to_owned()
}

/// Text of the page's `content` block, if it has one.
pub fn content_text(html: &str) -> Option<String> {
    CONTENT_BLOCK
        .captures(html)
        .and_then(|captures| captures.get(2))
        .map(|inner| decode_entities(inner.as_str()))
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#34;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&#x2f;", "/")
        .replace("&#x2F;", "/")
        .replace("&amp;", "&")
}
