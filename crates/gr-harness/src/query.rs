//! Query helpers over stored comparison records.

use gr_results::{ComparisonRecord, LaneKind, StepStatus};

use crate::error::{HarnessError, HarnessResult};

/// Step-status tallies for one lane of a rollout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaneSummary {
    pub ok_steps: usize,
    pub infeasible_steps: usize,
    pub failed_steps: usize,
}

/// Summary of one stored rollout.
#[derive(Debug, Clone)]
pub struct RolloutSummary {
    pub record_count: usize,
    /// First and last record times, seconds.
    pub time_range: (f64, f64),
    pub optimization: LaneSummary,
    pub projection: LaneSummary,
}

/// Summarize a record set; empty rollouts cannot be summarized.
pub fn get_rollout_summary(records: &[ComparisonRecord]) -> HarnessResult<RolloutSummary> {
    let (first, last) = match (records.first(), records.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            return Err(HarnessError::InvalidInput(
                "No records in rollout".to_string(),
            ));
        }
    };

    let mut summary = RolloutSummary {
        record_count: records.len(),
        time_range: (first.time_s, last.time_s),
        optimization: LaneSummary::default(),
        projection: LaneSummary::default(),
    };
    for record in records {
        tally(&mut summary.optimization, record.optimization.status);
        tally(&mut summary.projection, record.projection.status);
    }
    Ok(summary)
}

fn tally(lane: &mut LaneSummary, status: StepStatus) {
    match status {
        StepStatus::Ok => lane.ok_steps += 1,
        StepStatus::Infeasible => lane.infeasible_steps += 1,
        StepStatus::FilterFailed => lane.failed_steps += 1,
    }
}

/// Extract a `(time, value)` series for one lane variable.
///
/// Known variables are `position`, `velocity`, `nominal`, and
/// `filtered`. Steps where the filter failed carry no filtered value
/// and are skipped when extracting `filtered`.
pub fn extract_lane_series(
    records: &[ComparisonRecord],
    lane: LaneKind,
    variable: &str,
) -> HarnessResult<Vec<(f64, f64)>> {
    let mut series = Vec::with_capacity(records.len());
    for record in records {
        let sample = record.lane(lane);
        let value = match variable {
            "position" => Some(sample.position),
            "velocity" => Some(sample.velocity),
            "nominal" => Some(record.nominal),
            "filtered" => sample.filtered,
            _ => {
                return Err(HarnessError::InvalidInput(format!(
                    "Unknown lane variable: {variable}"
                )));
            }
        };
        if let Some(value) = value {
            series.push((record.time_s, value));
        }
    }
    Ok(series)
}
