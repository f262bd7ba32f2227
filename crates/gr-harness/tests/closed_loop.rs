use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use gr_core::Tolerances;
use gr_filter::BarrierConstraint;
use gr_harness::{RunOptions, RunRequest, ensure_rollout, get_rollout_summary, load_rollout};
use gr_results::{ComparisonRecord, LaneKind, RolloutStore, StepStatus};

static TEST_SCENARIO_COUNTER: AtomicU64 = AtomicU64::new(0);

fn clear_run_cache(scenario_path: &Path) {
    if let Some(scenario_dir) = scenario_path.parent() {
        let runs_dir = scenario_dir.join(".guardrail").join("runs");
        if runs_dir.exists() {
            let _ = std::fs::remove_dir_all(&runs_dir);
        }
    }
}

fn prepare_test_scenario(source: &Path) -> PathBuf {
    let temp_dir = std::env::temp_dir().join(format!(
        "gr_harness_closed_loop_{}",
        std::process::id()
    ));
    let _ = std::fs::create_dir_all(&temp_dir);
    let sequence = TEST_SCENARIO_COUNTER.fetch_add(1, Ordering::Relaxed);
    let dest = temp_dir.join(format!(
        "{}_{}_{}.yaml",
        source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("scenario"),
        sequence,
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0)
    ));
    std::fs::copy(source, &dest).expect("copy demo scenario");
    dest
}

fn request(path: &Path, use_cache: bool) -> RunRequest<'_> {
    RunRequest {
        scenario_path: path,
        options: RunOptions { use_cache, ..RunOptions::default() },
    }
}

/// Walk the records and check every filtered control against the
/// barrier rows evaluated at the state the filter actually saw (the
/// state *before* that step's advance).
fn assert_lane_respects_barrier(
    records: &[ComparisonRecord],
    lane: LaneKind,
    constraint: &BarrierConstraint,
    initial: (f64, f64),
) {
    let tol = Tolerances::default();
    let mut decision_state = initial;
    for record in records {
        let sample = record.lane(lane);
        if let Some(filtered) = sample.filtered {
            let rows = constraint.rows(decision_state.0, decision_state.1);
            assert!(
                rows.satisfied_by(filtered, tol),
                "step {}: control {} violates barrier at ({}, {})",
                record.step,
                filtered,
                decision_state.0,
                decision_state.1
            );
        }
        decision_state = (sample.position, sample.velocity);
    }
}

#[test]
fn corridor_demo_runs_and_persists() {
    let scenario_path =
        prepare_test_scenario(Path::new("../../demos/double_integrator.yaml"));
    clear_run_cache(&scenario_path);

    let response = ensure_rollout(&request(&scenario_path, false)).expect("rollout failed");
    assert!(!response.loaded_from_cache);
    assert_eq!(response.manifest.steps, 150);
    assert_eq!(response.manifest.scenario_name, "corridor-demo");

    let (_manifest, records) =
        load_rollout(&scenario_path, &response.run_id).expect("load rollout");
    assert_eq!(records.len(), 150);

    // Records carry post-advance time: dt, 2*dt, ..., steps*dt.
    assert!((records[0].time_s - 0.01).abs() < 1e-9);
    assert!((records[149].time_s - 1.50).abs() < 1e-9);

    // The corridor never pinches shut without a control bound, so both
    // lanes answer every step.
    for record in &records {
        assert_eq!(record.optimization.status, StepStatus::Ok);
        assert_eq!(record.projection.status, StepStatus::Ok);
        assert!(record.optimization.filtered.is_some());
        assert!(record.projection.filtered.is_some());
    }

    // Every accepted control satisfied the rows at its decision state.
    let scenario = gr_scenario::load_yaml(&scenario_path).expect("load scenario");
    let constraint = BarrierConstraint::new(
        scenario.barrier.position_bound,
        scenario.barrier.alpha1,
        scenario.barrier.alpha2,
        scenario.barrier.control_bound,
    )
    .expect("compile barrier");
    let initial = (
        scenario.rollout.initial_position,
        scenario.rollout.initial_velocity,
    );
    assert_lane_respects_barrier(&records, LaneKind::Optimization, &constraint, initial);
    assert_lane_respects_barrier(&records, LaneKind::Projection, &constraint, initial);

    // Both plants stay inside the corridor, give or take the slop a
    // discrete step with lagged control can introduce.
    for record in &records {
        assert!(record.optimization.position.abs() < 0.95);
        assert!(record.projection.position.abs() < 1.05);
    }

    // The run landed in the scenario's store.
    let store = RolloutStore::for_scenario(&scenario_path).expect("open store");
    let runs = store.list_runs("corridor-demo").expect("list runs");
    assert!(runs.iter().any(|m| m.run_id == response.run_id));

    let summary = get_rollout_summary(&records).expect("summarize");
    assert_eq!(summary.record_count, 150);
    assert_eq!(summary.optimization.ok_steps, 150);
    assert_eq!(summary.projection.ok_steps, 150);
}

#[test]
fn repeat_requests_hit_the_cache_and_reruns_are_identical() {
    let scenario_path =
        prepare_test_scenario(Path::new("../../demos/double_integrator.yaml"));
    clear_run_cache(&scenario_path);

    let first = ensure_rollout(&request(&scenario_path, true)).expect("first run");
    assert!(!first.loaded_from_cache);
    let (_, first_records) =
        load_rollout(&scenario_path, &first.run_id).expect("load first");

    let cached = ensure_rollout(&request(&scenario_path, true)).expect("cached run");
    assert!(cached.loaded_from_cache);
    assert_eq!(cached.run_id, first.run_id);
    assert_eq!(cached.manifest.scenario_name, first.manifest.scenario_name);

    // A forced re-execution reproduces the records bit for bit.
    let rerun = ensure_rollout(&request(&scenario_path, false)).expect("rerun");
    assert!(!rerun.loaded_from_cache);
    assert_eq!(rerun.run_id, first.run_id);
    let (_, rerun_records) =
        load_rollout(&scenario_path, &rerun.run_id).expect("load rerun");
    assert_eq!(rerun_records, first_records);
}

#[test]
fn bounded_control_demo_reports_infeasible_steps() {
    let scenario_path =
        prepare_test_scenario(Path::new("../../demos/bounded_control.yaml"));
    clear_run_cache(&scenario_path);

    let response = ensure_rollout(&request(&scenario_path, false)).expect("rollout failed");
    let (_, records) = load_rollout(&scenario_path, &response.run_id).expect("load");

    // Starting fast near the wall with a tight force limit empties the
    // feasible interval for at least the first solves.
    let summary = get_rollout_summary(&records).expect("summarize");
    assert!(summary.optimization.infeasible_steps > 0);

    // An infeasible optimization step still carries its fallback value.
    let flagged = records
        .iter()
        .find(|r| r.optimization.status == StepStatus::Infeasible)
        .expect("expected at least one infeasible step");
    assert!(flagged.optimization.filtered.is_some());

    // The projection lane flags those same pinched states as failures
    // and the rollout still runs to completion.
    assert_eq!(records.len(), 40);
    assert!(summary.projection.failed_steps > 0);
    let failed = records
        .iter()
        .find(|r| r.projection.status == StepStatus::FilterFailed)
        .expect("expected at least one failed projection step");
    assert_eq!(failed.projection.filtered, None);
}
