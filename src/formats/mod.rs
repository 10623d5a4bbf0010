use std::sync::OnceLock;

use regex::Regex;

use crate::model::{OutputMode, SubtitleDocument, SubtitleFormat, Transcript};

pub mod srt;
pub mod vtt;

/// Route a document to the reader for its format and the renderer for `mode`.
pub fn parse(doc: &SubtitleDocument, mode: OutputMode) -> Transcript {
    let raw = doc.content.as_str();
    match (doc.format, mode) {
        (SubtitleFormat::Srt, OutputMode::Text) => Transcript::Text(srt::to_text(raw)),
        (SubtitleFormat::Srt, OutputMode::Timestamps) => Transcript::Entries(srt::to_entries(raw)),
        (SubtitleFormat::Vtt, OutputMode::Text) => Transcript::Text(vtt::to_text(raw)),
        (SubtitleFormat::Vtt, OutputMode::Timestamps) => Transcript::Entries(vtt::to_entries(raw)),
    }
}

fn tag_regex() -> &'static Regex {
    static TAG_REGEX: OnceLock<Regex> = OnceLock::new();
    TAG_REGEX.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag regex"))
}

/// Remove `<...>` markup, best-effort. Unbalanced `<` is left as is.
pub(crate) fn strip_tags(line: &str) -> String {
    tag_regex().replace_all(line, "").into_owned()
}

/// Drop a leading UTF-8 byte order mark; `str::trim` keeps it.
pub(crate) fn strip_bom(raw: &str) -> &str {
    raw.strip_prefix('\u{FEFF}').unwrap_or(raw)
}

/// Collapse every whitespace run to a single space and trim the ends.
pub(crate) fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
            }
            prev_space = true;
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}
