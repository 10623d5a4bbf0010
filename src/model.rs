use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleFormat {
    Srt,
    Vtt,
}

impl SubtitleFormat {
    pub fn extension(self) -> &'static str {
        match self {
            SubtitleFormat::Srt => "srt",
            SubtitleFormat::Vtt => "vtt",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "srt" => Some(SubtitleFormat::Srt),
            "vtt" => Some(SubtitleFormat::Vtt),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// One normalized string
    Text,
    /// Ordered caption entries with start/end timestamps
    #[value(alias = "json")]
    #[serde(alias = "json")]
    Timestamps,
}

impl OutputMode {
    /// Name reported in extraction records.
    pub fn record_name(self) -> &'static str {
        match self {
            OutputMode::Text => "text",
            OutputMode::Timestamps => "json",
        }
    }
}

/// A raw subtitle file as handed over by the downloader.
#[derive(Debug, Clone)]
pub struct SubtitleDocument {
    pub content: String,
    pub format: SubtitleFormat,
}

impl SubtitleDocument {
    pub fn new(content: impl Into<String>, format: SubtitleFormat) -> Self {
        Self {
            content: content.into(),
            format,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionEntry {
    pub text: String,
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Transcript {
    Text(String),
    Entries(Vec<CaptionEntry>),
}

impl Transcript {
    pub fn is_empty(&self) -> bool {
        match self {
            Transcript::Text(s) => s.is_empty(),
            Transcript::Entries(e) => e.is_empty(),
        }
    }

    pub fn entries(&self) -> &[CaptionEntry] {
        match self {
            Transcript::Text(_) => &[],
            Transcript::Entries(e) => e,
        }
    }
}

/// One output item of `extract`, shaped like the workflow node's JSON.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptRecord {
    pub video_id: String,
    pub language: String,
    pub format: String,
    pub transcript: Transcript,
    pub extracted_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ItemOutput {
    Record(TranscriptRecord),
    Failed { error: String },
}
