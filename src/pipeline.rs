use anyhow::{Context, Result, anyhow};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    cli::{ExtractCmd, ParseCmd},
    config::Config,
    error::ExtractError,
    formats,
    model::{
        ItemOutput, OutputMode, SubtitleDocument, SubtitleFormat, Transcript, TranscriptRecord,
    },
};

const VIDEO_ID_LEN: usize = 11;

pub fn run_parse(cmd: ParseCmd, cfg: &Config) -> Result<()> {
    let span = tracing::info_span!("parse", input = cmd.input.as_str());
    let _g = span.enter();

    let format = match cmd.from {
        Some(f) => f,
        None => infer_format(&cmd.input)?,
    };
    let mode = cmd.mode.unwrap_or(cfg.output.mode);
    tracing::info!(?format, ?mode, "input format selected");

    let raw = read_input_to_string(&cmd.input)?;
    tracing::info!(bytes = raw.len(), "read input");

    let doc = SubtitleDocument::new(raw, format);
    let transcript = formats::parse(&doc, mode);
    log_transcript_summary(&transcript, cfg);

    let rendered = render_transcript(&transcript, cfg.output.pretty_json)?;

    if cmd.stdout {
        print!("{rendered}");
        tracing::info!(mode = "stdout", "wrote output");
        return Ok(());
    }

    let out_path = derive_output_path(&cmd, mode)?;
    write_output(&out_path, &rendered, cmd.overwrite)?;
    tracing::info!(path = out_path.as_str(), "wrote output file");

    Ok(())
}

pub fn run_extract(cmd: ExtractCmd, cfg: &Config) -> Result<()> {
    let language = cmd.language.unwrap_or_else(|| cfg.extract.language.clone());
    let dir = cmd.dir.unwrap_or_else(|| cfg.extract.dir.clone());
    let mode = cmd.mode.unwrap_or(cfg.output.mode);
    let continue_on_fail = cmd.continue_on_fail || cfg.extract.continue_on_fail;

    let span = tracing::info_span!("extract", language = language.as_str(), dir = %dir.display());
    let _g = span.enter();

    let items = extract_all(&cmd.video_ids, &language, &dir, mode, continue_on_fail, cfg)?;
    let rendered = to_json(&items, cfg.output.pretty_json)?;

    match cmd.output {
        Some(path) => {
            fs::write(&path, format!("{rendered}\n"))
                .with_context(|| format!("failed writing output: {}", path.display()))?;
            tracing::info!(path = %path.display(), items = items.len(), "wrote output file");
        }
        None => {
            println!("{rendered}");
            tracing::info!(mode = "stdout", items = items.len(), "wrote output");
        }
    }

    Ok(())
}

/// Process every video id in order. Without `continue_on_fail` the first
/// failure aborts the whole run.
pub fn extract_all(
    video_ids: &[String],
    language: &str,
    dir: &Path,
    mode: OutputMode,
    continue_on_fail: bool,
    cfg: &Config,
) -> Result<Vec<ItemOutput>> {
    let mut out = Vec::with_capacity(video_ids.len());

    for video_id in video_ids {
        match extract_one(video_id, language, dir, mode, cfg) {
            Ok(record) => out.push(ItemOutput::Record(record)),
            Err(err) if continue_on_fail => {
                let error = format!("{err:#}");
                tracing::warn!(video_id = video_id.as_str(), error = error.as_str(), "item failed");
                out.push(ItemOutput::Failed { error });
            }
            Err(err) => return Err(err.context(format!("failed extracting {video_id}"))),
        }
    }

    Ok(out)
}

pub fn extract_one(
    video_id: &str,
    language: &str,
    dir: &Path,
    mode: OutputMode,
    cfg: &Config,
) -> Result<TranscriptRecord> {
    validate_request(video_id, language)?;

    let path = find_subtitle_file(dir, video_id, language)?;
    let format = infer_format(&path.to_string_lossy())?;
    tracing::info!(video_id, path = %path.display(), ?format, "subtitle file found");

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed reading subtitle file: {}", path.display()))?;
    let transcript = formats::parse(&SubtitleDocument::new(raw, format), mode);
    log_transcript_summary(&transcript, cfg);

    Ok(TranscriptRecord {
        video_id: video_id.to_string(),
        language: language.to_string(),
        format: mode.record_name().to_string(),
        transcript,
        extracted_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

fn validate_request(video_id: &str, language: &str) -> Result<(), ExtractError> {
    if video_id.chars().count() != VIDEO_ID_LEN {
        return Err(ExtractError::InvalidVideoId(video_id.to_string()));
    }
    if language.trim().is_empty() {
        return Err(ExtractError::EmptyLanguage);
    }
    Ok(())
}

/// Locate `*<video_id>*.<language>.srt` (or `.vtt`) in `dir`.
///
/// SRT wins over VTT; ties are broken by file name.
pub fn find_subtitle_file(dir: &Path, video_id: &str, language: &str) -> Result<PathBuf> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed listing directory: {}", dir.display()))?;

    let suffixes = [SubtitleFormat::Srt, SubtitleFormat::Vtt]
        .map(|f| format!(".{language}.{}", f.extension()));

    let mut candidates: Vec<(usize, String, PathBuf)> = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if !name.contains(video_id) {
            continue;
        }
        if let Some(rank) = suffixes.iter().position(|s| name.ends_with(s.as_str())) {
            candidates.push((rank, name, entry.path()));
        }
    }

    candidates.sort();
    tracing::debug!(count = candidates.len(), "subtitle candidates");

    candidates
        .into_iter()
        .next()
        .map(|(_, _, path)| path)
        .ok_or_else(|| {
            ExtractError::NoTranscript {
                language: language.to_string(),
            }
            .into()
        })
}

fn infer_format(input: &str) -> Result<SubtitleFormat> {
    if input == "-" {
        return Err(anyhow!("--from is required when reading from stdin"));
    }
    let ext = Path::new(input)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    SubtitleFormat::from_extension(ext).ok_or_else(|| {
        anyhow!("cannot infer subtitle format from '{input}' (expected .srt or .vtt; pass --from)")
    })
}

fn read_input_to_string(input: &str) -> Result<String> {
    if input == "-" {
        use std::io::Read;
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed reading stdin")?;
        Ok(buf)
    } else {
        fs::read_to_string(input).with_context(|| format!("failed reading input: {input}"))
    }
}

fn render_transcript(t: &Transcript, pretty: bool) -> Result<String> {
    match t {
        Transcript::Text(s) => Ok(format!("{s}\n")),
        Transcript::Entries(entries) => Ok(format!("{}\n", to_json(entries, pretty)?)),
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String> {
    let s = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(s)
}

fn log_transcript_summary(t: &Transcript, cfg: &Config) {
    if t.is_empty() {
        tracing::warn!("no captions found in subtitle document");
        return;
    }

    let entries = t.entries();
    match t {
        Transcript::Text(s) => tracing::info!(chars = s.chars().count(), "transcript summary"),
        Transcript::Entries(_) => tracing::info!(
            entries = entries.len(),
            last_end = entries.last().map(|e| e.end.as_str()).unwrap_or(""),
            "transcript summary"
        ),
    }

    if tracing::enabled!(tracing::Level::DEBUG) {
        let n = cfg.logging.debug_cue_samples.min(entries.len());
        for (i, e) in entries.iter().take(n).enumerate() {
            tracing::debug!(
                idx = i,
                start = e.start.as_str(),
                end = e.end.as_str(),
                chars = e.text.chars().count(),
                "entry sample"
            );
        }
    }
}

fn derive_output_path(cmd: &ParseCmd, mode: OutputMode) -> Result<String> {
    if let Some(o) = &cmd.output {
        return Ok(o.clone());
    }

    if cmd.input == "-" {
        return Err(anyhow!(
            "output path required when input is stdin and --stdout is not set"
        ));
    }

    let p = Path::new(&cmd.input);
    let stem = p
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("bad input filename"))?;

    let ext = match mode {
        OutputMode::Text => "txt",
        OutputMode::Timestamps => "json",
    };
    let parent = p.parent().unwrap_or_else(|| Path::new("."));
    let out = parent.join(format!("{stem}.{ext}"));
    Ok(out.to_string_lossy().to_string())
}

fn write_output(path: &str, data: &str, overwrite: bool) -> Result<()> {
    if Path::new(path).exists() && !overwrite {
        return Err(anyhow!(
            "refusing to overwrite existing file (pass --overwrite): {path}"
        ));
    }
    fs::write(path, data).with_context(|| format!("failed writing output: {path}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const VIDEO: &str = "BmQ706_9wlQ";
    const SRT: &str = "1\n00:00:01,000 --> 00:00:02,000\nHello world\n\n2\n00:00:02,000 --> 00:00:03,000\nFoo bar\n";
    const VTT: &str = "WEBVTT\n\n00:00:01.000 --> 00:00:02.000 align:start\n<c>Hi</c> there\n";

    fn dir_with(files: &[(String, &str)]) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, body) in files {
            fs::write(dir.path().join(name), body).unwrap();
        }
        dir
    }

    fn parse_cmd(input: &str, mode: OutputMode) -> ParseCmd {
        ParseCmd {
            input: input.to_string(),
            output: None,
            from: None,
            mode: Some(mode),
            stdout: false,
            overwrite: false,
        }
    }

    #[test]
    fn finds_srt_before_vtt() {
        let dir = dir_with(&[
            (format!("Title [{VIDEO}].en.vtt"), VTT),
            (format!("Title [{VIDEO}].en.srt"), SRT),
            (format!("Title [{VIDEO}].es.srt"), SRT),
            ("other.en.srt".to_string(), SRT),
        ]);
        let found = find_subtitle_file(dir.path(), VIDEO, "en").unwrap();
        assert!(found.to_string_lossy().ends_with(".en.srt"));

        let found = find_subtitle_file(dir.path(), VIDEO, "es").unwrap();
        assert!(found.to_string_lossy().ends_with(".es.srt"));
    }

    #[test]
    fn missing_language_is_no_transcript() {
        let dir = dir_with(&[(format!("{VIDEO}.en.srt"), SRT)]);
        let err = find_subtitle_file(dir.path(), VIDEO, "fr").unwrap_err();
        assert_eq!(
            err.downcast_ref::<ExtractError>(),
            Some(&ExtractError::NoTranscript {
                language: "fr".to_string()
            })
        );
        assert_eq!(err.to_string(), "No transcript found for language: fr");
    }

    #[test]
    fn video_id_must_be_eleven_chars() {
        assert_eq!(
            validate_request("short", "en"),
            Err(ExtractError::InvalidVideoId("short".to_string()))
        );
        assert_eq!(validate_request(VIDEO, " "), Err(ExtractError::EmptyLanguage));
        assert!(validate_request(VIDEO, "en").is_ok());
    }

    #[test]
    fn extract_one_builds_record() {
        let dir = dir_with(&[(format!("{VIDEO}.en.vtt"), VTT)]);
        let cfg = Config::default();

        let rec = extract_one(VIDEO, "en", dir.path(), OutputMode::Timestamps, &cfg).unwrap();
        assert_eq!(rec.video_id, VIDEO);
        assert_eq!(rec.format, "json");
        assert_eq!(rec.transcript.entries()[0].end, "00:00:02.000");
        assert!(rec.extracted_at.ends_with('Z'));

        let rec = extract_one(VIDEO, "en", dir.path(), OutputMode::Text, &cfg).unwrap();
        assert_eq!(rec.format, "text");
        assert_eq!(rec.transcript, Transcript::Text("Hi there".to_string()));
    }

    #[test]
    fn continue_on_fail_emits_error_records() {
        let dir = dir_with(&[(format!("{VIDEO}.en.srt"), SRT)]);
        let cfg = Config::default();
        let ids = vec!["bad".to_string(), VIDEO.to_string()];

        let items = extract_all(&ids, "en", dir.path(), OutputMode::Text, true, &cfg).unwrap();
        assert_eq!(items.len(), 2);
        match &items[0] {
            ItemOutput::Failed { error } => {
                assert_eq!(
                    error,
                    "Invalid YouTube video ID 'bad'. Must be 11 characters long."
                )
            }
            other => panic!("expected failure, got {other:?}"),
        }
        match &items[1] {
            ItemOutput::Record(rec) => {
                assert_eq!(rec.transcript, Transcript::Text("Hello world Foo bar".to_string()))
            }
            other => panic!("expected record, got {other:?}"),
        }
    }

    #[test]
    fn first_failure_aborts_without_continue_on_fail() {
        let dir = dir_with(&[]);
        let cfg = Config::default();
        let ids = vec![VIDEO.to_string()];

        let err = extract_all(&ids, "en", dir.path(), OutputMode::Text, false, &cfg).unwrap_err();
        assert!(format!("{err:#}").contains("No transcript found for language: en"));
    }

    #[test]
    fn format_is_inferred_from_suffix() {
        assert_eq!(infer_format("a/b.SRT").unwrap(), SubtitleFormat::Srt);
        assert_eq!(infer_format("x.en.vtt").unwrap(), SubtitleFormat::Vtt);
        assert!(infer_format("notes.txt").is_err());
        assert!(infer_format("-").is_err());
    }

    #[test]
    fn run_parse_writes_next_to_input_and_refuses_overwrite() {
        let dir = dir_with(&[("talk.srt".to_string(), SRT)]);
        let input = dir.path().join("talk.srt").to_string_lossy().to_string();
        let cfg = Config::default();

        run_parse(parse_cmd(&input, OutputMode::Timestamps), &cfg).unwrap();
        let written = fs::read_to_string(dir.path().join("talk.json")).unwrap();
        let v: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(v[1]["text"], "Foo bar");
        assert_eq!(v[1]["start"], "00:00:02,000");

        run_parse(parse_cmd(&input, OutputMode::Text), &cfg).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("talk.txt")).unwrap(),
            "Hello world Foo bar\n"
        );

        let err = run_parse(parse_cmd(&input, OutputMode::Text), &cfg).unwrap_err();
        assert!(err.to_string().contains("refusing to overwrite"));
    }
}
