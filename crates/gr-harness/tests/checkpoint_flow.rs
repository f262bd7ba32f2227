use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use gr_harness::{
    RunOptions, RunRequest, ensure_rollout, export_checkpoint, extract_lane_series,
    load_rollout,
};
use gr_results::LaneKind;
use gr_scenario::WeightsDef;

static TEST_SCENARIO_COUNTER: AtomicU64 = AtomicU64::new(0);

fn unique_name(stem: &str, extension: &str) -> String {
    let sequence = TEST_SCENARIO_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!(
        "{}_{}_{}.{}",
        stem,
        sequence,
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0),
        extension
    )
}

fn prepare_test_scenario(source: &Path) -> PathBuf {
    let temp_dir = std::env::temp_dir().join(format!(
        "gr_harness_checkpoint_flow_{}",
        std::process::id()
    ));
    let _ = std::fs::create_dir_all(&temp_dir);
    let dest = temp_dir.join(unique_name(
        source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("scenario"),
        "yaml",
    ));
    std::fs::copy(source, &dest).expect("copy demo scenario");
    dest
}

fn run_and_load_projection_series(scenario_path: &Path) -> Vec<(f64, f64)> {
    let request = RunRequest {
        scenario_path,
        options: RunOptions { use_cache: false, ..RunOptions::default() },
    };
    let response = ensure_rollout(&request).expect("rollout failed");
    let (_, records) = load_rollout(scenario_path, &response.run_id).expect("load rollout");
    extract_lane_series(&records, LaneKind::Projection, "filtered").expect("extract series")
}

#[test]
fn exported_checkpoint_reproduces_the_seeded_predictor() {
    let fresh_path =
        prepare_test_scenario(Path::new("../../demos/double_integrator.yaml"));
    let scenario_dir = fresh_path.parent().expect("temp dir").to_path_buf();

    // Pin the seed-defined weights to a file.
    let weights_name = unique_name("weights", "json");
    let weights_path = scenario_dir.join(&weights_name);
    let checkpoint =
        export_checkpoint(&fresh_path, &weights_path).expect("export checkpoint");
    assert_eq!(checkpoint.key, "corridor-demo");
    assert!(weights_path.exists());

    // The same scenario pointed at the checkpoint instead of the seed.
    let mut pinned = gr_scenario::load_yaml(&fresh_path).expect("load scenario");
    pinned.predictor.weights = WeightsDef::Checkpoint { path: weights_name };
    let pinned_path = scenario_dir.join(unique_name("double_integrator_pinned", "yaml"));
    gr_scenario::save_yaml(&pinned_path, &pinned).expect("save pinned scenario");

    let from_seed = run_and_load_projection_series(&fresh_path);
    let from_checkpoint = run_and_load_projection_series(&pinned_path);
    assert_eq!(from_seed.len(), 150);
    assert_eq!(from_seed, from_checkpoint);
}

#[test]
fn checkpoint_for_another_scenario_is_rejected() {
    let fresh_path =
        prepare_test_scenario(Path::new("../../demos/double_integrator.yaml"));
    let scenario_dir = fresh_path.parent().expect("temp dir").to_path_buf();

    let weights_name = unique_name("weights", "json");
    export_checkpoint(&fresh_path, &scenario_dir.join(&weights_name))
        .expect("export checkpoint");

    // Same weights file, different scenario name: the key check trips.
    let mut renamed = gr_scenario::load_yaml(&fresh_path).expect("load scenario");
    renamed.name = "different-demo".to_string();
    renamed.predictor.weights = WeightsDef::Checkpoint { path: weights_name };
    let renamed_path = scenario_dir.join(unique_name("double_integrator_renamed", "yaml"));
    gr_scenario::save_yaml(&renamed_path, &renamed).expect("save renamed scenario");

    let request = RunRequest {
        scenario_path: &renamed_path,
        options: RunOptions { use_cache: false, ..RunOptions::default() },
    };
    let err = ensure_rollout(&request).expect_err("mismatched checkpoint must fail");
    assert!(err.to_string().contains("keyed"));
}
