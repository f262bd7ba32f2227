//! Closed-loop comparison harness for control safety filters.
//!
//! Ties the workspace together:
//! - loads a scenario and compiles both filters from the shared barrier
//!   definition ([`service`])
//! - drives both filters through a lockstep rollout with a one-step
//!   control lag ([`rollout`])
//! - persists paired records content-addressed by scenario hash, and
//!   answers repeat requests from the store ([`service`])
//! - summarizes and extracts series from stored records ([`query`])

pub mod error;
pub mod nominal;
pub mod query;
pub mod rollout;
pub mod service;
pub mod sink;

pub use error::{HarnessError, HarnessResult};
pub use nominal::NominalSignal;
pub use query::{LaneSummary, RolloutSummary, extract_lane_series, get_rollout_summary};
pub use rollout::{
    ComparisonRollout, RolloutOptions, RolloutTiming, run_comparison,
};
pub use service::{
    RunOptions, RunRequest, RunResponse, ensure_rollout, ensure_rollout_with_sink,
    export_checkpoint, list_rollouts, load_rollout,
};
pub use sink::{MemorySink, NullSink, RolloutSink};
