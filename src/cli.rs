use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::model::{OutputMode, SubtitleFormat};

#[derive(Debug, Parser)]
#[command(name = "ytsubs")]
#[command(about = "Turn downloaded YouTube subtitles (SRT/VTT) into plain text or timestamped captions.")]
pub struct Args {
    /// Path to config TOML (defaults to ./config.toml if present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse a single subtitle file
    Parse(ParseCmd),
    /// Build transcript records for downloaded subtitles of one or more videos
    Extract(ExtractCmd),
    /// Print the effective default config as TOML and exit
    PrintDefaultConfig,
}

#[derive(Debug, Parser)]
pub struct ParseCmd {
    /// Input file path, or '-' for stdin
    pub input: String,

    /// Output file path (optional)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Force input format (otherwise inferred from extension)
    #[arg(long, value_enum)]
    pub from: Option<SubtitleFormat>,

    /// Output mode (defaults to output.mode from config)
    #[arg(long, value_enum)]
    pub mode: Option<OutputMode>,

    /// Write to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,

    /// Allow overwriting output file
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Debug, Parser)]
pub struct ExtractCmd {
    /// YouTube video ID (11 characters from the URL); repeatable
    #[arg(long = "video-id", required = true)]
    pub video_ids: Vec<String>,

    /// Subtitle language code, e.g. en, es, fr (defaults to extract.language)
    #[arg(long)]
    pub language: Option<String>,

    /// Directory holding the downloaded subtitle files (defaults to extract.dir)
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Output mode (defaults to output.mode from config)
    #[arg(long, value_enum)]
    pub mode: Option<OutputMode>,

    /// Emit an error record for a failed video instead of aborting
    #[arg(long)]
    pub continue_on_fail: bool,

    /// Output file path (stdout when absent)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_command_accepts_json_alias() {
        let args = Args::parse_from(["ytsubs", "parse", "a.srt", "--mode", "json", "--stdout"]);
        let Command::Parse(cmd) = args.command else {
            panic!("expected parse command");
        };
        assert_eq!(cmd.mode, Some(OutputMode::Timestamps));
        assert!(cmd.stdout);
        assert_eq!(cmd.from, None);
    }

    #[test]
    fn extract_command_collects_video_ids() {
        let args = Args::parse_from([
            "ytsubs",
            "extract",
            "--video-id",
            "BmQ706_9wlQ",
            "--video-id",
            "dQw4w9WgXcQ",
            "--language",
            "es",
            "--continue-on-fail",
        ]);
        let Command::Extract(cmd) = args.command else {
            panic!("expected extract command");
        };
        assert_eq!(cmd.video_ids, vec!["BmQ706_9wlQ", "dQw4w9WgXcQ"]);
        assert_eq!(cmd.language.as_deref(), Some("es"));
        assert!(cmd.continue_on_fail);
    }

    #[test]
    fn extract_requires_a_video_id() {
        assert!(Args::try_parse_from(["ytsubs", "extract"]).is_err());
    }
}
