//! Compare command implementation: report gaps, optionally repair them.

use crate::cli::preflight::{self, Operation};
use crate::cli::{Cli, Output};
use crate::config::Settings;
use crate::orchestrator::{Orchestrator, Selection};
use crate::report::{render_repair_summary, render_summary, write_detailed_report, ChapterResult};
use anyhow::Result;
use clap::CommandFactory;
use std::path::PathBuf;

/// Run the compare command.
pub async fn run_compare(cli: &Cli, settings: Settings) -> Result<()> {
    let Some(selection) = cli.selection() else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let orchestrator = Orchestrator::new(settings);

    if let Err(e) = orchestrator.check_directories() {
        println!("Error: {}", e);
        return Ok(());
    }

    let targets = orchestrator.select_targets(&selection)?;
    if targets.is_empty() {
        match &selection {
            Selection::All => Output::warning("No matching videos found in both directories."),
            Selection::Video { video_id, .. } => {
                Output::warning(&format!("No matching chapters found for video {}", video_id))
            }
        }
        return Ok(());
    }

    Output::info(&format!("Comparing {} chapter(s)", targets.len()));
    Output::kv("Base", &orchestrator.locator().base_dir().display().to_string());
    Output::kv("Large", &orchestrator.locator().large_dir().display().to_string());
    println!();

    let pb = Output::progress_bar(targets.len() as u64, "Comparing");
    let mut results = Vec::with_capacity(targets.len());
    for (video_id, chapter) in &targets {
        pb.set_message(format!("{} chapter {}", video_id, chapter));
        results.push(orchestrator.compare_chapter(video_id, *chapter));
        pb.inc(1);
    }
    pb.finish_and_clear();

    println!("{}", render_summary(&results));

    if let Some(output) = &cli.output {
        let path = PathBuf::from(output);
        write_detailed_report(&results, &path, cli.format)?;
        println!();
        Output::success(&format!("Detailed report saved to: {}", path.display()));
    }

    if cli.fix {
        run_repair(&orchestrator, &results).await?;
    }

    Ok(())
}

async fn run_repair(orchestrator: &Orchestrator, results: &[ChapterResult]) -> Result<()> {
    Output::header("Re-transcribing missing segments");

    let pending = results.iter().filter(|r| r.has_gaps()).count();
    if pending == 0 {
        Output::info("No gaps to repair.");
        return Ok(());
    }

    if let Err(e) = preflight::check(Operation::Repair) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let pipeline = orchestrator.repair_pipeline()?;
    Output::kv("Audio", &orchestrator.settings().audio_dir().display().to_string());
    Output::kv("Language", pipeline.language());
    println!();

    let spinner = Output::spinner(&format!("Repairing {} chapter(s)...", pending));
    let entries = orchestrator.repair(results, &pipeline).await;
    spinner.finish_and_clear();

    println!("{}", render_repair_summary(&entries));
    Ok(())
}
