use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

use gr_harness::{
    HarnessError, HarnessResult, RolloutSink, RolloutTiming, RunOptions, RunRequest,
    ensure_rollout_with_sink, export_checkpoint, extract_lane_series, get_rollout_summary,
    list_rollouts, load_rollout,
};
use gr_results::{LaneKind, StepRecord, StepStatus};

#[derive(Parser)]
#[command(name = "gr-cli")]
#[command(about = "Guardrail CLI - Safety-filter comparison harness", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate scenario file syntax and structure
    Validate {
        /// Path to the scenario YAML file
        scenario_path: PathBuf,
    },
    /// Run the comparison rollout for a scenario
    Run {
        /// Path to the scenario YAML file
        scenario_path: PathBuf,
        /// Skip cache and force re-run
        #[arg(long)]
        no_cache: bool,
        /// Suppress the live per-step line
        #[arg(long)]
        quiet: bool,
    },
    /// List cached rollouts for a scenario
    Runs {
        /// Path to the scenario YAML file
        scenario_path: PathBuf,
    },
    /// Show details of a cached rollout
    ShowRun {
        /// Path to the scenario YAML file
        scenario_path: PathBuf,
        /// Run ID to display
        run_id: String,
    },
    /// Export time series data from a rollout
    ExportSeries {
        /// Path to the scenario YAML file
        scenario_path: PathBuf,
        /// Run ID
        run_id: String,
        /// Lane (optimization or projection)
        lane: String,
        /// Variable name (position, velocity, nominal, filtered)
        variable: String,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Export the scenario's predictor weights as a checkpoint
    ExportWeights {
        /// Path to the scenario YAML file
        scenario_path: PathBuf,
        /// Output checkpoint file path
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> HarnessResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { scenario_path } => cmd_validate(&scenario_path),
        Commands::Run { scenario_path, no_cache, quiet } => {
            cmd_run(&scenario_path, !no_cache, quiet)
        }
        Commands::Runs { scenario_path } => cmd_runs(&scenario_path),
        Commands::ShowRun { scenario_path, run_id } => cmd_show_run(&scenario_path, &run_id),
        Commands::ExportSeries {
            scenario_path,
            run_id,
            lane,
            variable,
            output,
        } => cmd_export_series(&scenario_path, &run_id, &lane, &variable, output.as_deref()),
        Commands::ExportWeights { scenario_path, output } => {
            cmd_export_weights(&scenario_path, &output)
        }
    }
}

fn cmd_validate(scenario_path: &Path) -> HarnessResult<()> {
    println!("Validating scenario: {}", scenario_path.display());
    let scenario = gr_scenario::load_yaml(scenario_path)?;
    println!("✓ Scenario '{}' is valid", scenario.name);
    println!(
        "  {} steps @ {} s, corridor |x| <= {}",
        scenario.rollout.steps, scenario.rollout.time_step_s, scenario.barrier.position_bound
    );
    Ok(())
}

/// Live per-step progress rendering with a throttled carriage-return line.
struct LiveSink {
    last_emit: Instant,
    flagged_steps: usize,
}

impl LiveSink {
    fn new() -> Self {
        LiveSink { last_emit: Instant::now(), flagged_steps: 0 }
    }
}

impl RolloutSink for LiveSink {
    fn on_step(&mut self, optimization: &StepRecord, projection: &StepRecord) {
        if optimization.status != StepStatus::Ok || projection.status != StepStatus::Ok {
            self.flagged_steps += 1;
        }
        let emit_now = self.last_emit.elapsed().as_millis() >= 100;
        if !emit_now {
            return;
        }
        print!(
            "\rstep {:>5}  t={:>7.3}s  qp: x={:>7.3} v={:>7.3} {}  net: x={:>7.3} v={:>7.3} {}  flagged={}",
            optimization.step,
            optimization.time_s,
            optimization.position,
            optimization.velocity,
            status_marker(optimization.status),
            projection.position,
            projection.velocity,
            status_marker(projection.status),
            self.flagged_steps
        );
        let _ = io::stdout().flush();
        self.last_emit = Instant::now();
    }
}

fn status_marker(status: StepStatus) -> char {
    match status {
        StepStatus::Ok => ' ',
        StepStatus::Infeasible => '!',
        StepStatus::FilterFailed => 'x',
    }
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(120));
    let _ = io::stdout().flush();
}

fn cmd_run(scenario_path: &Path, use_cache: bool, quiet: bool) -> HarnessResult<()> {
    println!("Running comparison rollout: {}", scenario_path.display());

    let request = RunRequest {
        scenario_path,
        options: RunOptions { use_cache, harness_version: "0.1.0".to_string() },
    };

    let mut live = LiveSink::new();
    let sink: Option<&mut dyn RolloutSink> = if quiet { None } else { Some(&mut live) };
    let response = ensure_rollout_with_sink(&request, sink)?;
    if !quiet {
        clear_progress_line();
    }

    if response.loaded_from_cache {
        println!("✓ Loaded from cache: {}", response.run_id);
    } else {
        println!("✓ Rollout completed: {}", response.run_id);
    }

    print_timing_summary(&response.timing);

    // Load records and show a brief per-lane summary
    let (_manifest, records) = load_rollout(scenario_path, &response.run_id)?;
    let summary = get_rollout_summary(&records)?;
    println!("  Steps: {}", summary.record_count);
    print_lane_counts("Optimization", &summary.optimization);
    print_lane_counts("Projection", &summary.projection);

    Ok(())
}

fn print_lane_counts(label: &str, lane: &gr_harness::LaneSummary) {
    println!(
        "  {:<13} ok={} infeasible={} failed={}",
        label, lane.ok_steps, lane.infeasible_steps, lane.failed_steps
    );
}

fn print_timing_summary(timing: &RolloutTiming) {
    println!("\nTiming summary:");
    if timing.optimization_filter_time_s > 0.0 || timing.projection_filter_time_s > 0.0 {
        println!(
            "  Optimization filter: {:.4}s",
            timing.optimization_filter_time_s
        );
        println!(
            "  Projection filter:   {:.4}s",
            timing.projection_filter_time_s
        );
    }
    println!("  Total:               {:.4}s", timing.total_time_s);
}

fn cmd_runs(scenario_path: &Path) -> HarnessResult<()> {
    let runs = list_rollouts(scenario_path)?;

    if runs.is_empty() {
        println!("No cached rollouts found for scenario");
    } else {
        println!("Cached rollouts:");
        for manifest in runs {
            println!(
                "  {} ({}, {} steps)",
                manifest.run_id, manifest.timestamp, manifest.steps
            );
        }
    }
    Ok(())
}

fn cmd_show_run(scenario_path: &Path, run_id: &str) -> HarnessResult<()> {
    println!("Loading rollout: {}", run_id);

    let (manifest, records) = load_rollout(scenario_path, run_id)?;
    let summary = get_rollout_summary(&records)?;

    println!("\nRollout Summary:");
    println!("  Scenario: {}", manifest.scenario_name);
    println!("  Steps: {}", summary.record_count);
    println!(
        "  Time range: {:.3} - {:.3} s",
        summary.time_range.0, summary.time_range.1
    );
    print_lane_counts("Optimization", &summary.optimization);
    print_lane_counts("Projection", &summary.projection);

    Ok(())
}

fn cmd_export_series(
    scenario_path: &Path,
    run_id: &str,
    lane: &str,
    variable: &str,
    output: Option<&Path>,
) -> HarnessResult<()> {
    let lane = LaneKind::from_str(lane)?;
    let (_manifest, records) = load_rollout(scenario_path, run_id)?;
    let series = extract_lane_series(&records, lane, variable)?;

    // Build CSV
    let mut csv = String::from("time_s,value\n");
    for (t, val) in &series {
        csv.push_str(&format!("{},{}\n", t, val));
    }

    // Write to file or stdout
    if let Some(path) = output {
        std::fs::write(path, csv)?;
        println!(
            "✓ Exported {} data points to {}",
            series.len(),
            path.display()
        );
    } else {
        print!("{}", csv);
    }

    Ok(())
}

fn cmd_export_weights(scenario_path: &Path, output: &Path) -> HarnessResult<()> {
    let checkpoint = export_checkpoint(scenario_path, output)?;
    println!(
        "✓ Exported checkpoint for '{}' ({} hidden units) to {}",
        checkpoint.key,
        checkpoint.hidden,
        output.display()
    );
    Ok(())
}
