//! Configuration module for gapfill.
//!
//! Handles loading settings from `config.toml`.

mod settings;

pub use settings::{
    GapSettings, GeneralSettings, LocatorSettings, MatchingSettings, PathSettings,
    RepairSettings, Settings, TranscriptionSettings,
};
