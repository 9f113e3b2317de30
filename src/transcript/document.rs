//! Whole-document model of a transcript file: verbatim header plus segments.

use super::parser::{parse_segments, split_header, TimeRange};
use super::Segment;
use crate::error::Result;
use std::io::Write;
use std::path::Path;

/// A transcript file held in memory for read, transform, re-render.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptDocument {
    /// Header lines exactly as they appeared, trailing blank lines removed.
    pub header_lines: Vec<String>,
    /// Segments in file order.
    pub segments: Vec<Segment>,
}

impl TranscriptDocument {
    /// Parse a document from file content.
    pub fn parse(content: &str) -> Self {
        let lines: Vec<&str> = content.lines().collect();
        let (header, body) = split_header(&lines);

        let mut header_lines: Vec<String> = header.iter().map(|l| l.to_string()).collect();
        while header_lines.last().is_some_and(|l| l.trim().is_empty()) {
            header_lines.pop();
        }

        Self {
            header_lines,
            segments: parse_segments(body),
        }
    }

    /// Load a document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// The `Time: MM:SS - MM:SS` range declared in the header, if any.
    pub fn declared_range(&self) -> Option<TimeRange> {
        self.header_lines
            .iter()
            .find_map(|line| TimeRange::from_header_line(line))
    }

    /// Add segments and restore start-time order.
    ///
    /// The sort is stable, so segments sharing a start keep existing-first order.
    pub fn splice(&mut self, new_segments: Vec<Segment>) {
        self.segments.extend(new_segments);
        self.segments
            .sort_by(|a, b| a.start_seconds.total_cmp(&b.start_seconds));
    }

    /// Render the full file content.
    pub fn render(&self) -> String {
        let mut output = String::new();

        for line in &self.header_lines {
            output.push_str(line);
            output.push('\n');
        }
        if !self.header_lines.is_empty() {
            output.push('\n');
        }

        for segment in &self.segments {
            output.push_str(&segment.to_line());
            output.push('\n');
        }

        output
    }

    /// Replace the file at `path` with the rendered document.
    ///
    /// Content is written to a temporary file in the same directory and
    /// renamed over the target, so readers never observe a partial file.
    /// An existing target keeps its permissions.
    pub fn write_atomic(&self, path: &Path) -> Result<String> {
        let content = self.render();
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        if let Ok(metadata) = std::fs::metadata(path) {
            tmp.as_file().set_permissions(metadata.permissions())?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Chapter 3: At the airport
Video: Travel English
Time: 10:00 - 12:30
Model: large
============================================================

[00:02] Where is the check-in counter?
[00:09] It is next to gate five.
";

    #[test]
    fn test_render_round_trip() {
        let doc = TranscriptDocument::parse(SAMPLE);
        assert_eq!(doc.header_lines.len(), 5);
        assert_eq!(doc.render(), SAMPLE);
    }

    #[test]
    fn test_declared_range() {
        let doc = TranscriptDocument::parse(SAMPLE);
        assert_eq!(doc.declared_range(), Some(TimeRange::new(600.0, 750.0)));
    }

    #[test]
    fn test_splice_sorts_by_start() {
        let mut doc = TranscriptDocument::parse(SAMPLE);
        doc.splice(vec![
            Segment::new(5.0, 8.0, "Excuse me.".to_string()),
            Segment::new(0.0, 2.0, "Hello.".to_string()),
        ]);

        let starts: Vec<f64> = doc.segments.iter().map(|s| s.start_seconds).collect();
        assert_eq!(starts, vec![0.0, 2.0, 5.0, 9.0]);
        assert!(doc.render().contains("[00:05] Excuse me.\n[00:09] It is next"));
    }

    #[test]
    fn test_write_atomic_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vid_chapter3_airport.txt");
        std::fs::write(&path, SAMPLE).unwrap();

        let mut doc = TranscriptDocument::load(&path).unwrap();
        doc.splice(vec![Segment::new(4.0, 6.0, "Over there.".to_string())]);
        let written = doc.write_atomic(&path).unwrap();

        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert_eq!(on_disk, written);
        assert!(on_disk.starts_with("Chapter 3: At the airport\n"));
        assert_eq!(TranscriptDocument::parse(&on_disk).segments.len(), 3);
        // No temporary files left behind.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vid_chapter3_airport.txt");
        std::fs::write(&path, SAMPLE).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let mut doc = TranscriptDocument::load(&path).unwrap();
        doc.splice(vec![Segment::new(4.0, 6.0, "Over there.".to_string())]);
        doc.write_atomic(&path).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }
}
