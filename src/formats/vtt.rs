use std::sync::OnceLock;

use regex::Regex;

use crate::{
    formats::{normalize_ws, strip_tags},
    model::CaptionEntry,
};

const HEADER: &str = "WEBVTT";
const ARROW: &str = "-->";

fn leading_timestamp_regex() -> &'static Regex {
    static TS: OnceLock<Regex> = OnceLock::new();
    TS.get_or_init(|| Regex::new(r"^\d{2}:\d{2}:\d{2}").expect("leading timestamp regex"))
}

fn is_header(line: &str) -> bool {
    line.trim_start_matches('\u{FEFF}').starts_with(HEADER)
}

/// Flatten a WebVTT document to a single line of caption text.
pub fn to_text(raw: &str) -> String {
    let mut kept: Vec<String> = Vec::new();

    for (idx, line) in raw.lines().enumerate() {
        if idx == 0 && is_header(line) {
            continue;
        }

        let line = line.trim();
        if line.is_empty() || leading_timestamp_regex().is_match(line) || line.contains(ARROW) {
            continue;
        }

        let stripped = strip_tags(line);
        let stripped = stripped.trim();
        if !stripped.is_empty() {
            kept.push(stripped.to_string());
        }
    }

    normalize_ws(&kept.join(" "))
}

/// Extract one entry per cue that has at least one line of text.
///
/// Anything before the first timing line (header, metadata, cue identifiers)
/// is ignored. Cue settings after the end timestamp are dropped.
pub fn to_entries(raw: &str) -> Vec<CaptionEntry> {
    let lines: Vec<&str> = raw.lines().collect();
    let mut entries = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        i += 1;
        if !line.contains(ARROW) {
            continue;
        }

        let mut text_lines: Vec<String> = Vec::new();
        while i < lines.len() {
            let next = lines[i].trim();
            if next.is_empty() || next.contains(ARROW) {
                break;
            }
            let stripped = strip_tags(next);
            let stripped = stripped.trim();
            if !stripped.is_empty() {
                text_lines.push(stripped.to_string());
            }
            i += 1;
        }

        let Some((start, raw_end)) = line.split_once(" --> ") else {
            tracing::trace!(line, "vtt timing line without spaced separator skipped");
            continue;
        };
        if text_lines.is_empty() {
            continue;
        }

        let end = raw_end.split_whitespace().next().unwrap_or_default();
        entries.push(CaptionEntry {
            text: text_lines.join(" "),
            start: start.trim().to_string(),
            end: end.trim().to_string(),
        });
    }

    entries
}
