//! Audio lookup and clipping.
//!
//! Gap repair needs the source audio of a video and short clips cut from it.

mod clipper;

pub use clipper::FfmpegClipper;

use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tempfile::TempPath;

/// Cuts a time range out of an audio file.
#[async_trait]
pub trait AudioClipper: Send + Sync {
    /// Extract `[start, end)` seconds of `source` into a new temporary file.
    ///
    /// The clip is deleted when the returned path is dropped.
    async fn clip(&self, source: &Path, start: f64, end: f64) -> Result<TempPath>;
}

/// Locates the source audio of a video: the first `{video_id}.{ext}` that
/// exists in `audio_dir`, trying `extensions` in order.
pub fn locate_audio_file(audio_dir: &Path, video_id: &str, extensions: &[String]) -> Option<PathBuf> {
    extensions
        .iter()
        .map(|ext| audio_dir.join(format!("{}.{}", video_id, ext.trim_start_matches('.'))))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exts() -> Vec<String> {
        vec!["mp3".into(), "m4a".into(), "webm".into(), "opus".into()]
    }

    #[test]
    fn test_locate_prefers_extension_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("abc.webm"), b"x").unwrap();
        std::fs::write(dir.path().join("abc.m4a"), b"x").unwrap();

        let found = locate_audio_file(dir.path(), "abc", &exts()).unwrap();
        assert!(found.ends_with("abc.m4a"));
    }

    #[test]
    fn test_locate_missing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("abcd.mp3"), b"x").unwrap();
        std::fs::write(dir.path().join("abc.wav"), b"x").unwrap();
        assert!(locate_audio_file(dir.path(), "abc", &exts()).is_none());
    }
}
