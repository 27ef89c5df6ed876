use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use cc_app::{
    AppResult, BatchProgressEvent, BatchReport, BatchStage, RunRequest, RunState, run_batch,
    run_rainfall, summarize,
};
use cc_results::{export_csvs, export_struct, load_runs};

#[derive(Parser)]
#[command(name = "cc-cli")]
#[command(about = "Cave calcite forward models and cave data analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every model in a batch config
    Run {
        /// Path to the batch YAML file
        config_path: PathBuf,
        /// Re-run models even when identical stored runs exist
        #[arg(long)]
        force: bool,
        /// Run models concurrently
        #[arg(long)]
        parallel: bool,
    },
    /// Write one CSV per stored model
    ExportCsv {
        /// Directory holding settings.json and results.json
        output_dir: PathBuf,
        /// Destination directory (defaults to the output directory)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Write all stored models to one JSON structure
    ExportStruct {
        /// Directory holding settings.json and results.json
        output_dir: PathBuf,
        /// Destination file (defaults to models.json in the output directory)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Summarize one or more output directories
    Summary {
        /// Output directories to merge
        #[arg(required = true)]
        output_dirs: Vec<PathBuf>,
    },
    /// Estimate paleo-rainfall from a measured d44Ca record
    Rainfall {
        /// Path to the batch YAML file
        config_path: PathBuf,
        /// Position of the model in the config
        model_index: usize,
    },
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config_path,
            force,
            parallel,
        } => cmd_run(config_path, force, parallel),
        Commands::ExportCsv { output_dir, out } => cmd_export_csv(&output_dir, out.as_deref()),
        Commands::ExportStruct { output_dir, out } => {
            cmd_export_struct(&output_dir, out.as_deref())
        }
        Commands::Summary { output_dirs } => cmd_summary(&output_dirs),
        Commands::Rainfall {
            config_path,
            model_index,
        } => cmd_rainfall(&config_path, model_index),
    }
}

fn cmd_run(config_path: PathBuf, force: bool, parallel: bool) -> AppResult<()> {
    println!("Running batch: {}", config_path.display());

    let request = RunRequest {
        config_path,
        force,
        parallel,
    };

    let mut last_emit = Instant::now();
    let mut last_stage = None;
    let report = run_batch(
        &request,
        Some(&mut |event| {
            let emit_now =
                last_stage != Some(event.stage) || last_emit.elapsed().as_millis() >= 100;
            if emit_now {
                render_cli_progress(&event);
                last_stage = Some(event.stage);
                last_emit = Instant::now();
            }
        }),
    )?;
    clear_progress_line();

    print_report(&report);
    Ok(())
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(120));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &BatchProgressEvent) {
    let width = 28usize;
    let fraction = event.fraction_complete();
    let filled = ((fraction * width as f64).round() as usize).min(width);
    let bar = format!(
        "{}{}",
        "#".repeat(filled),
        "-".repeat(width.saturating_sub(filled))
    );
    let mut line = format!(
        "\r[{}] {}/{}  phase={}  elapsed={:.1}s",
        bar,
        event.completed,
        event.total,
        event.stage.label(),
        event.elapsed_wall_s
    );
    if let Some(id) = event.model_id {
        line.push_str(&format!("  model={}", id));
    }
    if let Some(msg) = &event.message {
        line.push_str(&format!("  {}", msg));
    }
    print!("{}", line);
    let _ = io::stdout().flush();
    if event.stage == BatchStage::Failed {
        println!();
    }
}

fn print_report(report: &BatchReport) {
    println!("✓ Batch finished in {:.3}s", report.elapsed_wall_s);
    println!("  Completed: {}", report.count(RunState::Completed));
    println!("  Reused:    {}", report.count(RunState::Reused));
    println!("  Failed:    {}", report.count(RunState::Failed));
    for (id, message) in &report.failures {
        println!("    model {}: {}", id, message);
    }

    if report.cda.models_compared > 0 {
        println!("\nCDA:");
        println!("  Models compared: {}", report.cda.models_compared);
        println!("  Rows recorded:   {}", report.cda.all_outputs_rows);
        println!("  Matches:         {}", report.cda.matches.len());
        let matched = report.cda.matched_models();
        if !matched.is_empty() {
            let ids: Vec<String> = matched.iter().map(|id| id.to_string()).collect();
            println!("  Matched models:  {}", ids.join(", "));
        }
    }
}

fn cmd_export_csv(output_dir: &Path, out: Option<&Path>) -> AppResult<()> {
    let runs = load_runs(&[output_dir.to_path_buf()])?;
    let dest = out.unwrap_or(output_dir);
    let files = export_csvs(&runs, dest)?;
    println!("✓ Exported {} models to {}", files.len(), dest.display());
    Ok(())
}

fn cmd_export_struct(output_dir: &Path, out: Option<&Path>) -> AppResult<()> {
    let runs = load_runs(&[output_dir.to_path_buf()])?;
    let dest = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| output_dir.join("models.json"));
    export_struct(&runs, &dest)?;
    println!("✓ Exported {} models to {}", runs.len(), dest.display());
    Ok(())
}

fn cmd_summary(output_dirs: &[PathBuf]) -> AppResult<()> {
    let summary = summarize(output_dirs)?;

    println!("Output summary:");
    println!("  Models: {}", summary.model_count);
    println!("  Precipitating models: {}", summary.precipitating_models);
    println!(
        "  Steps per model: {} - {}",
        summary.step_count_range.0, summary.step_count_range.1
    );
    println!("  All_outputs rows: {}", summary.all_output_rows);
    println!("  Matches rows: {}", summary.match_rows);

    let varied: Vec<_> = summary
        .settings
        .iter()
        .filter(|(_, values)| values.len() > 1)
        .collect();
    if !varied.is_empty() {
        println!("\nVaried settings:");
        for (name, values) in varied {
            let shown: Vec<String> = values.iter().map(|v| v.to_string()).collect();
            println!("  {}: {}", name, shown.join(", "));
        }
    }
    Ok(())
}

fn cmd_rainfall(config_path: &Path, model_index: usize) -> AppResult<()> {
    println!("Running rainfall calculator for model {}", model_index);
    let path = run_rainfall(config_path, model_index)?;
    println!("✓ Wrote {}", path.display());
    Ok(())
}
