use std::sync::OnceLock;

use regex::Regex;

use crate::{
    formats::{normalize_ws, strip_bom},
    model::CaptionEntry,
};

fn sequence_number_regex() -> &'static Regex {
    static SEQ: OnceLock<Regex> = OnceLock::new();
    SEQ.get_or_init(|| Regex::new(r"^\d+$").expect("sequence number regex"))
}

fn timestamp_regex() -> &'static Regex {
    static TS: OnceLock<Regex> = OnceLock::new();
    TS.get_or_init(|| Regex::new(r"\d{2}:\d{2}:\d{2}").expect("timestamp regex"))
}

/// Flatten an SRT document to a single line of caption text.
///
/// Works line by line without looking at block structure, so a caption made
/// only of digits is indistinguishable from a sequence number and is dropped.
pub fn to_text(raw: &str) -> String {
    let kept: Vec<&str> = strip_bom(raw)
        .lines()
        .map(str::trim)
        .filter(|line| {
            !line.is_empty()
                && !sequence_number_regex().is_match(line)
                && !timestamp_regex().is_match(line)
        })
        .collect();

    normalize_ws(&kept.join(" "))
}

/// Extract one entry per well-formed `seq / timing / text...` block.
pub fn to_entries(raw: &str) -> Vec<CaptionEntry> {
    let normalized = strip_bom(raw).replace("\r\n", "\n");
    let mut entries = Vec::new();

    for block in normalized.split("\n\n") {
        let lines: Vec<&str> = block.trim().split('\n').collect();
        if lines.len() < 3 {
            continue;
        }

        let Some((start, end)) = lines[1].split_once(" --> ") else {
            tracing::trace!(line = lines[1], "srt block without timing separator skipped");
            continue;
        };

        let text = lines[2..]
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if text.is_empty() {
            continue;
        }

        entries.push(CaptionEntry {
            text,
            start: start.trim().to_string(),
            end: end.trim().to_string(),
        });
    }

    entries
}
