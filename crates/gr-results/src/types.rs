//! Rollout record types.

use serde::{Deserialize, Serialize};

use crate::{ResultsError, ResultsResult};

pub type RunId = String;

/// Which strategy produced a lane of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneKind {
    Optimization,
    Projection,
}

impl LaneKind {
    pub fn label(&self) -> &'static str {
        match self {
            LaneKind::Optimization => "optimization",
            LaneKind::Projection => "projection",
        }
    }
}

impl std::str::FromStr for LaneKind {
    type Err = ResultsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "optimization" => Ok(LaneKind::Optimization),
            "projection" => Ok(LaneKind::Projection),
            other => Err(ResultsError::InvalidLane {
                name: other.to_string(),
            }),
        }
    }
}

/// Whether a step's control decision is trustworthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// The filter produced a feasible control
    Ok,
    /// Best-effort fallback against an empty feasible set, or a blown
    /// solve deadline
    Infeasible,
    /// The filter produced no control at all; the plant coasted
    FilterFailed,
}

/// Nominal/filtered control pair for one step of one lane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlSample {
    pub nominal: f64,
    /// None when the filter failed outright
    pub filtered: Option<f64>,
}

/// One lane's step: the post-advance plant state together with the
/// control decision made at the pre-advance state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: usize,
    pub time_s: f64,
    pub position: f64,
    pub velocity: f64,
    pub sample: ControlSample,
    pub status: StepStatus,
}

/// Append-only per-lane history of one rollout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RolloutRecord {
    pub lane: LaneKind,
    pub steps: Vec<StepRecord>,
}

impl RolloutRecord {
    pub fn new(lane: LaneKind) -> Self {
        Self {
            lane,
            steps: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn push(&mut self, record: StepRecord) {
        self.steps.push(record);
    }

    pub fn count_status(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|r| r.status == status).count()
    }
}

/// One lane's slice of a comparison step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaneSample {
    pub position: f64,
    pub velocity: f64,
    pub filtered: Option<f64>,
    pub status: StepStatus,
}

impl From<&StepRecord> for LaneSample {
    fn from(r: &StepRecord) -> Self {
        Self {
            position: r.position,
            velocity: r.velocity,
            filtered: r.sample.filtered,
            status: r.status,
        }
    }
}

/// Both lanes at one step; the stored line format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRecord {
    pub step: usize,
    pub time_s: f64,
    pub nominal: f64,
    pub optimization: LaneSample,
    pub projection: LaneSample,
}

impl ComparisonRecord {
    pub fn lane(&self, lane: LaneKind) -> &LaneSample {
        match lane {
            LaneKind::Optimization => &self.optimization,
            LaneKind::Projection => &self.projection,
        }
    }
}

/// Metadata for one stored rollout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RolloutManifest {
    pub run_id: RunId,
    pub scenario_name: String,
    pub timestamp: String,
    pub steps: usize,
    pub time_step_s: f64,
    pub harness_version: String,
}

/// Zip the two lanes of one rollout into stored comparison records.
///
/// The lanes must carry the expected kinds, be the same length, and
/// agree step by step on index, time, and nominal control. Anything
/// else means the rollout that produced them was not a fair
/// comparison.
pub fn pair_records(
    optimization: &RolloutRecord,
    projection: &RolloutRecord,
) -> ResultsResult<Vec<ComparisonRecord>> {
    if optimization.lane != LaneKind::Optimization || projection.lane != LaneKind::Projection {
        return Err(ResultsError::Mismatch {
            what: "lanes passed in the wrong order".to_string(),
        });
    }
    if optimization.len() != projection.len() {
        return Err(ResultsError::Mismatch {
            what: format!(
                "lane lengths differ: {} vs {}",
                optimization.len(),
                projection.len()
            ),
        });
    }
    let mut records = Vec::with_capacity(optimization.len());
    for (a, b) in optimization.steps.iter().zip(projection.steps.iter()) {
        if a.step != b.step || a.time_s != b.time_s {
            return Err(ResultsError::Mismatch {
                what: format!("lanes disagree on step indexing at step {}", a.step),
            });
        }
        if a.sample.nominal != b.sample.nominal {
            return Err(ResultsError::Mismatch {
                what: format!("lanes saw different nominal controls at step {}", a.step),
            });
        }
        records.push(ComparisonRecord {
            step: a.step,
            time_s: a.time_s,
            nominal: a.sample.nominal,
            optimization: LaneSample::from(a),
            projection: LaneSample::from(b),
        });
    }
    Ok(records)
}
