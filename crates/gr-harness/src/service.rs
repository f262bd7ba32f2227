//! Rollout execution service with content-addressed caching.
//!
//! The service is the high-level entry point used by the CLI: it loads
//! a scenario, compiles both filters from the shared barrier
//! definition, runs the comparison, and persists the paired records
//! keyed by a hash of the scenario. A repeated request with an
//! unchanged scenario is answered from the store.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use gr_filter::{BarrierConstraint, ProblemDims, QpFilter};
use gr_net::{Checkpoint, Predictor, ProjectionMethod};
use gr_results::{
    ComparisonRecord, RolloutManifest, RolloutStore, compute_run_id, pair_records,
};
use gr_scenario::{ProjectionMethodDef, Scenario, WeightsDef};
use tracing::info;

use crate::error::{HarnessError, HarnessResult};
use crate::nominal::NominalSignal;
use crate::rollout::{RolloutOptions, RolloutTiming, run_comparison};
use crate::sink::RolloutSink;

/// Options for executing rollouts.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Answer from the store when an identical rollout exists.
    pub use_cache: bool,
    /// Version stamp mixed into the run id and the manifest.
    pub harness_version: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions { use_cache: true, harness_version: "0.1.0".to_string() }
    }
}

/// Request to execute a comparison rollout.
#[derive(Debug, Clone)]
pub struct RunRequest<'a> {
    pub scenario_path: &'a Path,
    pub options: RunOptions,
}

/// Response from a rollout execution.
#[derive(Debug, Clone)]
pub struct RunResponse {
    pub run_id: String,
    pub manifest: RolloutManifest,
    pub loaded_from_cache: bool,
    pub timing: RolloutTiming,
}

/// Execute the requested rollout, or answer from the store.
pub fn ensure_rollout(request: &RunRequest) -> HarnessResult<RunResponse> {
    ensure_rollout_with_sink(request, None)
}

/// Like [`ensure_rollout`], streaming live records into `sink`.
///
/// The sink only fires on a real execution; a cache hit produces no
/// step traffic.
pub fn ensure_rollout_with_sink(
    request: &RunRequest,
    sink: Option<&mut dyn RolloutSink>,
) -> HarnessResult<RunResponse> {
    let started = Instant::now();
    let scenario = gr_scenario::load_yaml(request.scenario_path)?;
    let run_id = compute_run_id(&scenario, &request.options.harness_version);
    let store = RolloutStore::for_scenario(request.scenario_path)?;

    if request.options.use_cache && store.has_run(&run_id) {
        let manifest = store.load_manifest(&run_id)?;
        info!(run_id, scenario = %scenario.name, "loaded rollout from cache");
        return Ok(RunResponse {
            run_id,
            manifest,
            loaded_from_cache: true,
            timing: RolloutTiming {
                total_time_s: started.elapsed().as_secs_f64(),
                ..RolloutTiming::default()
            },
        });
    }

    let (constraint, dims) = compile_problem(&scenario)?;
    let optimization = QpFilter::new(constraint.clone(), &dims)?;
    let projection = build_predictor(&scenario, request.scenario_path, constraint, dims)?;
    let options = rollout_options(&scenario);

    info!(
        run_id,
        scenario = %scenario.name,
        steps = options.steps,
        "executing comparison rollout"
    );
    let rollout = run_comparison(&options, &optimization, &projection, sink)?;
    let records = pair_records(&rollout.optimization, &rollout.projection)?;

    let manifest = RolloutManifest {
        run_id: run_id.clone(),
        scenario_name: scenario.name.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        steps: scenario.rollout.steps,
        time_step_s: scenario.rollout.time_step_s,
        harness_version: request.options.harness_version.clone(),
    };
    store.save_rollout(&manifest, &records)?;

    let mut timing = rollout.timing;
    timing.total_time_s = started.elapsed().as_secs_f64();
    Ok(RunResponse { run_id, manifest, loaded_from_cache: false, timing })
}

/// Load a stored rollout's manifest and records.
pub fn load_rollout(
    scenario_path: &Path,
    run_id: &str,
) -> HarnessResult<(RolloutManifest, Vec<ComparisonRecord>)> {
    let store = RolloutStore::for_scenario(scenario_path)?;
    let manifest = store.load_manifest(run_id)?;
    let records = store.load_records(run_id)?;
    Ok((manifest, records))
}

/// List stored rollouts for the named scenario, newest first.
pub fn list_rollouts(scenario_path: &Path) -> HarnessResult<Vec<RolloutManifest>> {
    let scenario = gr_scenario::load_yaml(scenario_path)?;
    let store = RolloutStore::for_scenario(scenario_path)?;
    Ok(store.list_runs(&scenario.name)?)
}

/// Snapshot the scenario's predictor weights into a checkpoint file.
///
/// Fresh weights are materialized from the configured seed first, so
/// exporting is also how a seed-defined predictor is pinned for reuse.
pub fn export_checkpoint(scenario_path: &Path, output: &Path) -> HarnessResult<Checkpoint> {
    let scenario = gr_scenario::load_yaml(scenario_path)?;
    let (constraint, dims) = compile_problem(&scenario)?;
    let predictor = build_predictor(&scenario, scenario_path, constraint, dims)?;
    let checkpoint = Checkpoint::from_predictor(&predictor, &scenario.name);
    checkpoint.save(output)?;
    info!(scenario = %scenario.name, output = %output.display(), "exported checkpoint");
    Ok(checkpoint)
}

fn compile_problem(scenario: &Scenario) -> HarnessResult<(BarrierConstraint, ProblemDims)> {
    let barrier = &scenario.barrier;
    let constraint = BarrierConstraint::new(
        barrier.position_bound,
        barrier.alpha1,
        barrier.alpha2,
        barrier.control_bound,
    )?;
    let dims = ProblemDims {
        input_dim: scenario.dims.input_dim,
        context_dim: scenario.dims.context_dim,
        output_dim: scenario.dims.output_dim,
        constraint_count: scenario.dims.constraint_count,
    };
    Ok((constraint, dims))
}

fn rollout_options(scenario: &Scenario) -> RolloutOptions {
    RolloutOptions {
        steps: scenario.rollout.steps,
        time_step: scenario.rollout.time_step_s,
        initial_position: scenario.rollout.initial_position,
        initial_velocity: scenario.rollout.initial_velocity,
        nominal: NominalSignal::from_def(&scenario.nominal),
        qp_deadline: scenario
            .rollout
            .qp_deadline_ms
            .map(|ms| Duration::from_secs_f64(ms / 1e3)),
    }
}

fn projection_method(def: ProjectionMethodDef) -> ProjectionMethod {
    match def {
        ProjectionMethodDef::Squash => ProjectionMethod::Squash,
        ProjectionMethodDef::Clamp => ProjectionMethod::Clamp,
    }
}

fn build_predictor(
    scenario: &Scenario,
    scenario_path: &Path,
    constraint: BarrierConstraint,
    dims: ProblemDims,
) -> HarnessResult<Predictor> {
    let method = projection_method(scenario.predictor.method);
    let hidden = scenario.predictor.hidden_width;
    match &scenario.predictor.weights {
        WeightsDef::Fresh { seed } => {
            Ok(Predictor::fresh(dims, hidden, constraint, method, *seed)?)
        }
        WeightsDef::Checkpoint { path } => {
            let full = resolve_against_scenario(scenario_path, path);
            let checkpoint = Checkpoint::load(&full)?;
            verify_checkpoint(&checkpoint, scenario, &dims, method, hidden)?;
            Ok(checkpoint.into_predictor(constraint)?)
        }
    }
}

/// Relative checkpoint paths are taken from the scenario file's directory.
fn resolve_against_scenario(scenario_path: &Path, weights_path: &str) -> PathBuf {
    let weights = Path::new(weights_path);
    if weights.is_absolute() {
        return weights.to_path_buf();
    }
    match scenario_path.parent() {
        Some(dir) => dir.join(weights),
        None => weights.to_path_buf(),
    }
}

fn verify_checkpoint(
    checkpoint: &Checkpoint,
    scenario: &Scenario,
    dims: &ProblemDims,
    method: ProjectionMethod,
    hidden: usize,
) -> HarnessResult<()> {
    if checkpoint.key != scenario.name {
        return Err(HarnessError::ConfigMismatch {
            message: format!(
                "checkpoint is keyed for '{}' but the scenario is '{}'",
                checkpoint.key, scenario.name
            ),
        });
    }
    if checkpoint.dims != *dims {
        return Err(HarnessError::ConfigMismatch {
            message: "checkpoint dimensions disagree with the scenario".to_string(),
        });
    }
    if checkpoint.hidden != hidden {
        return Err(HarnessError::ConfigMismatch {
            message: format!(
                "checkpoint hidden width {} disagrees with configured width {}",
                checkpoint.hidden, hidden
            ),
        });
    }
    if checkpoint.method != method {
        return Err(HarnessError::ConfigMismatch {
            message: "checkpoint was built for a different projection method".to_string(),
        });
    }
    Ok(())
}
