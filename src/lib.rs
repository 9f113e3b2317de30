//! gapfill - Transcript comparison and gap repair
//!
//! Two speech-to-text passes over the same audio rarely agree: a fast base
//! model keeps every utterance but garbles some, while a slow large model is
//! accurate but occasionally drops whole spans. gapfill aligns the two,
//! reports the spans the accurate pass is missing, and can re-transcribe
//! just those spans and splice them back into the accurate transcript.
//!
//! # Architecture
//!
//! - `transcript` - Transcript file parsing, rewriting and anomaly checks
//! - `locator` - Pairing base and accurate files for a chapter
//! - `coverage` - Fuzzy coverage strategies
//! - `gaps` - Gap aggregation
//! - `audio` - Audio file lookup and clipping
//! - `transcription` - Speech-to-text
//! - `repair` - Re-transcription and splicing
//! - `report` - Console, text and JSON reports
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use gapfill::config::Settings;
//! use gapfill::orchestrator::{Orchestrator, Selection};
//! use gapfill::report::render_summary;
//!
//! fn main() -> anyhow::Result<()> {
//!     let orchestrator = Orchestrator::new(Settings::load()?);
//!     orchestrator.check_directories()?;
//!
//!     let targets = orchestrator.select_targets(&Selection::All)?;
//!     let results = orchestrator.compare_all(&targets);
//!     println!("{}", render_summary(&results));
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod cli;
pub mod config;
pub mod coverage;
pub mod error;
pub mod gaps;
pub mod locator;
pub mod openai;
pub mod orchestrator;
pub mod repair;
pub mod report;
pub mod transcript;
pub mod transcription;

pub use error::{GapfillError, Result};
