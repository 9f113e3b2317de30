//! CLI module for gapfill.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use crate::config::Settings;
use crate::orchestrator::Selection;
use crate::report::ReportFormat;
use clap::Parser;

/// gapfill - find and repair gaps in accurate-pass transcripts
///
/// Compares a fast base-model transcript against a slower large-model
/// transcript of the same chapter, reports spans the large model dropped,
/// and with --fix re-transcribes those spans into the large transcript.
#[derive(Parser, Debug)]
#[command(name = "gapfill")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Video ID to compare (optional if --all is used)
    pub video_id: Option<String>,

    /// Specific chapter number to compare
    #[arg(long)]
    pub chapter: Option<u32>,

    /// Compare all videos
    #[arg(long)]
    pub all: bool,

    /// Output file for the detailed report
    #[arg(short, long)]
    pub output: Option<String>,

    /// Detailed report format (text, json)
    #[arg(long, default_value = "text")]
    pub format: ReportFormat,

    /// Minimum gap duration in seconds to report
    #[arg(long)]
    pub min_gap: Option<f64>,

    /// Base model transcripts directory
    #[arg(long)]
    pub base_dir: Option<String>,

    /// Large model transcripts directory
    #[arg(long)]
    pub large_dir: Option<String>,

    /// Audio files directory (for --fix)
    #[arg(long)]
    pub audio_dir: Option<String>,

    /// Re-transcribe missing segments and insert them into the large model transcripts
    #[arg(long)]
    pub fix: bool,

    /// Transcription language for --fix
    #[arg(long)]
    pub language: Option<String>,
}

impl Cli {
    /// Chapters to compare, or None when nothing was selected.
    pub fn selection(&self) -> Option<Selection> {
        if self.all {
            return Some(Selection::All);
        }
        self.video_id.as_ref().map(|video_id| Selection::Video {
            video_id: video_id.clone(),
            chapter: self.chapter,
        })
    }

    /// Apply command-line overrides on top of file settings.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(min_gap) = self.min_gap {
            settings.gaps.min_gap_seconds = min_gap;
        }
        if let Some(dir) = &self.base_dir {
            settings.paths.base_dir = dir.clone();
        }
        if let Some(dir) = &self.large_dir {
            settings.paths.large_dir = dir.clone();
        }
        if let Some(dir) = &self.audio_dir {
            settings.paths.audio_dir = dir.clone();
        }
        if let Some(language) = &self.language {
            settings.repair.language = language.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_selection() {
        let cli = Cli::try_parse_from(["gapfill", "abc123", "--chapter", "2"]).unwrap();
        assert_eq!(
            cli.selection(),
            Some(Selection::Video { video_id: "abc123".to_string(), chapter: Some(2) })
        );

        let cli = Cli::try_parse_from(["gapfill", "--all"]).unwrap();
        assert_eq!(cli.selection(), Some(Selection::All));

        let cli = Cli::try_parse_from(["gapfill"]).unwrap();
        assert_eq!(cli.selection(), None);
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::try_parse_from([
            "gapfill",
            "abc123",
            "--min-gap",
            "2.5",
            "--large-dir",
            "/data/large",
            "--language",
            "ko",
            "--format",
            "json",
            "-vv",
        ])
        .unwrap();

        let mut settings = Settings::default();
        cli.apply_overrides(&mut settings);

        assert_eq!(settings.gaps.min_gap_seconds, 2.5);
        assert_eq!(settings.paths.large_dir, "/data/large");
        assert_eq!(settings.paths.base_dir, "test_data/transcripts");
        assert_eq!(settings.repair.language, "ko");
        assert_eq!(cli.format, ReportFormat::Json);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["gapfill", "abc", "--format", "xml"]).is_err());
    }
}
