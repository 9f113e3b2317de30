//! ffmpeg-backed audio clipping.

use super::AudioClipper;
use crate::error::{GapfillError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tempfile::TempPath;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

/// Clips audio with the `ffmpeg` binary.
#[derive(Debug, Clone)]
pub struct FfmpegClipper {
    temp_dir: PathBuf,
}

impl FfmpegClipper {
    /// Clips are written to `temp_dir`, which is created on first use.
    pub fn new(temp_dir: PathBuf) -> Self {
        Self { temp_dir }
    }

    fn new_clip_path(&self) -> Result<TempPath> {
        std::fs::create_dir_all(&self.temp_dir)?;
        let file = tempfile::Builder::new()
            .prefix("clip_")
            .suffix(".mp3")
            .tempfile_in(&self.temp_dir)?;
        Ok(file.into_temp_path())
    }
}

/// Validate and normalise a requested clip range.
fn clip_bounds(start: f64, end: f64) -> Result<(f64, f64)> {
    let start = start.max(0.0);
    if end <= start {
        return Err(GapfillError::InvalidInput(format!(
            "Clip end ({:.2}s) must be after start ({:.2}s)",
            end, start
        )));
    }
    Ok((start, end - start))
}

#[async_trait]
impl AudioClipper for FfmpegClipper {
    #[instrument(skip(self), fields(source = %source.display()))]
    async fn clip(&self, source: &Path, start: f64, end: f64) -> Result<TempPath> {
        let (start, length) = clip_bounds(start, end)?;
        let dest = self.new_clip_path()?;

        debug!("Clipping {:.2}s from {:.2}s", length, start);

        // First attempt: stream copy
        let copy_result = Command::new("ffmpeg")
            .arg("-ss").arg(format!("{:.3}", start))
            .arg("-i").arg(source)
            .arg("-t").arg(format!("{:.3}", length))
            .arg("-c").arg("copy")
            .arg("-y")
            .arg("-loglevel").arg("warning")
            .arg(&*dest)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match copy_result {
            Ok(status) if status.success() && non_empty(&dest) => return Ok(dest),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(GapfillError::ToolNotFound("ffmpeg".into()));
            }
            _ => {}
        }

        warn!("Stream copy failed, re-encoding clip");

        let encode_result = Command::new("ffmpeg")
            .arg("-ss").arg(format!("{:.3}", start))
            .arg("-i").arg(source)
            .arg("-t").arg(format!("{:.3}", length))
            .arg("-codec:a").arg("libmp3lame")
            .arg("-qscale:a").arg("2")
            .arg("-y")
            .arg("-loglevel").arg("error")
            .arg(&*dest)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        match encode_result {
            Ok(out) if out.status.success() => Ok(dest),
            Ok(out) => {
                let err = String::from_utf8_lossy(&out.stderr);
                Err(GapfillError::Clip(format!("ffmpeg re-encode failed: {}", err.trim())))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(GapfillError::ToolNotFound("ffmpeg".into()))
            }
            Err(e) => Err(GapfillError::Clip(format!("ffmpeg error: {e}"))),
        }
    }
}

fn non_empty(path: &Path) -> bool {
    std::fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_bounds() {
        assert_eq!(clip_bounds(-1.5, 4.0).unwrap(), (0.0, 4.0));
        assert_eq!(clip_bounds(10.0, 12.5).unwrap(), (10.0, 2.5));
        assert!(clip_bounds(5.0, 5.0).is_err());
        assert!(clip_bounds(5.0, 3.0).is_err());
        assert!(clip_bounds(-4.0, -1.0).is_err());
    }

    #[tokio::test]
    async fn test_rejects_empty_range_before_running_ffmpeg() {
        let dir = tempfile::tempdir().unwrap();
        let clipper = FfmpegClipper::new(dir.path().join("clips"));
        let err = clipper
            .clip(Path::new("missing.mp3"), 8.0, 2.0)
            .await
            .unwrap_err();
        assert!(matches!(err, GapfillError::InvalidInput(_)));
        assert!(!dir.path().join("clips").exists());
    }

    #[test]
    fn test_clip_paths_are_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let clipper = FfmpegClipper::new(dir.path().to_path_buf());
        let path = clipper.new_clip_path().unwrap();
        let kept = path.to_path_buf();
        assert!(kept.exists());
        drop(path);
        assert!(!kept.exists());
    }
}
