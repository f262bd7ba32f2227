//! Content-based hashing for run IDs.
//!
//! A run id is a digest of the full scenario plus the harness version,
//! so rerunning an unchanged scenario hits the cache and any config or
//! code-version edit misses it.

use gr_scenario::Scenario;
use sha2::{Digest, Sha256};

pub fn compute_run_id(scenario: &Scenario, harness_version: &str) -> String {
    let mut hasher = Sha256::new();

    let scenario_json = serde_json::to_string(scenario).unwrap_or_default();
    hasher.update(scenario_json.as_bytes());

    hasher.update(harness_version.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}
