//! Two-lane lockstep rollout.
//!
//! Each step, both lanes read their own plant state, ask their filter
//! for a safe control, then advance the plant under the control stashed
//! by the *previous* step. The first advance is therefore unforced, and
//! the control computed at step `i` moves the plant during step `i + 1`.
//! A failed filter stashes nothing, so the advance after a failure
//! coasts.
//!
//! Lane termination is encoded in ownership: finishing a lane consumes
//! it, so no record can be appended to a completed history.

use std::time::{Duration, Instant};

use gr_core::Real;
use gr_filter::{FilterError, FilterOutcome, ProblemContext, SafetyFilter};
use gr_plant::DoubleIntegrator;
use gr_results::{ControlSample, LaneKind, RolloutRecord, StepRecord, StepStatus};
use tracing::{error, warn};

use crate::error::{HarnessError, HarnessResult};
use crate::nominal::NominalSignal;
use crate::sink::RolloutSink;

/// Options for a comparison rollout.
#[derive(Clone, Debug)]
pub struct RolloutOptions {
    /// Number of steps to execute.
    pub steps: usize,
    /// Plant integration step, seconds.
    pub time_step: Real,
    pub initial_position: Real,
    pub initial_velocity: Real,
    /// Shared control demand.
    pub nominal: NominalSignal,
    /// Wall-clock budget per optimization solve. A solve that answers
    /// late keeps its answer but the step is flagged infeasible.
    pub qp_deadline: Option<Duration>,
}

impl RolloutOptions {
    fn validate(&self) -> HarnessResult<()> {
        if !self.time_step.is_finite() || self.time_step <= 0.0 {
            return Err(HarnessError::InvalidInput(format!(
                "Time step must be positive and finite, got {}",
                self.time_step
            )));
        }
        if !self.initial_position.is_finite() || !self.initial_velocity.is_finite() {
            return Err(HarnessError::InvalidInput(
                "Initial plant state must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Wall-clock accounting for one comparison.
#[derive(Clone, Copy, Debug, Default)]
pub struct RolloutTiming {
    /// Total time spent inside the optimization filter, seconds.
    pub optimization_filter_time_s: f64,
    /// Total time spent inside the projection filter, seconds.
    pub projection_filter_time_s: f64,
    /// End-to-end rollout time, seconds.
    pub total_time_s: f64,
}

/// Both lanes' step histories plus timing.
#[derive(Clone, Debug)]
pub struct ComparisonRollout {
    pub optimization: RolloutRecord,
    pub projection: RolloutRecord,
    pub timing: RolloutTiming,
}

/// One plant-plus-filter pipeline inside a comparison.
struct Lane<'a> {
    plant: DoubleIntegrator,
    filter: &'a dyn SafetyFilter,
    /// Control computed this step, applied at the next advance.
    pending: Option<Real>,
    record: RolloutRecord,
    filter_time_s: f64,
    deadline: Option<Duration>,
}

impl<'a> Lane<'a> {
    fn new(
        kind: LaneKind,
        filter: &'a dyn SafetyFilter,
        options: &RolloutOptions,
    ) -> HarnessResult<Self> {
        let plant = DoubleIntegrator::new(
            options.initial_position,
            options.initial_velocity,
            options.time_step,
        )?;
        Ok(Lane {
            plant,
            filter,
            pending: None,
            record: RolloutRecord::new(kind),
            filter_time_s: 0.0,
            deadline: options.qp_deadline,
        })
    }

    fn step(&mut self, step: usize, nominal: Real) -> HarnessResult<StepRecord> {
        // The filter decides on the pre-advance state.
        let context =
            ProblemContext::new(nominal, self.plant.position(), self.plant.velocity());

        let solve_started = Instant::now();
        let outcome = self.filter.filter(&context);
        let solve_elapsed = solve_started.elapsed();
        self.filter_time_s += solve_elapsed.as_secs_f64();

        let (filtered, status) = match outcome {
            Ok(FilterOutcome::Optimized { value, feasible }) => {
                if !feasible {
                    warn!(
                        lane = self.record.lane.label(),
                        step,
                        value,
                        "no feasible control, applying fallback"
                    );
                    (Some(value), StepStatus::Infeasible)
                } else if self.deadline.is_some_and(|budget| solve_elapsed > budget) {
                    warn!(
                        lane = self.record.lane.label(),
                        step,
                        elapsed_ms = solve_elapsed.as_secs_f64() * 1e3,
                        "solve exceeded its deadline"
                    );
                    (Some(value), StepStatus::Infeasible)
                } else {
                    (Some(value), StepStatus::Ok)
                }
            }
            Ok(FilterOutcome::Projected { value }) => (Some(value), StepStatus::Ok),
            Err(FilterError::Degenerate { what }) => {
                error!(
                    lane = self.record.lane.label(),
                    step,
                    %what,
                    "filter failed, plant will coast"
                );
                (None, StepStatus::FilterFailed)
            }
            Err(err) => return Err(err.into()),
        };

        // One-step control lag: apply what the previous step stashed.
        let applied = self.pending.take();
        let state = self.plant.advance(applied);
        self.pending = filtered;

        let record = StepRecord {
            step,
            time_s: state.elapsed,
            position: state.position,
            velocity: state.velocity,
            sample: ControlSample { nominal, filtered },
            status,
        };
        self.record.push(record);
        Ok(record)
    }

    fn finish(self) -> (RolloutRecord, f64) {
        (self.record, self.filter_time_s)
    }
}

/// Drive both strategies through the same rollout in lockstep.
///
/// Both lanes start from identical plant state and see the identical
/// nominal signal; they diverge only through their filters. A
/// degenerate filter answer flags the step and lets the rollout
/// continue; any other filter error aborts the whole comparison.
pub fn run_comparison(
    options: &RolloutOptions,
    optimization: &dyn SafetyFilter,
    projection: &dyn SafetyFilter,
    mut sink: Option<&mut dyn RolloutSink>,
) -> HarnessResult<ComparisonRollout> {
    options.validate()?;

    let started = Instant::now();
    let mut optimization_lane = Lane::new(LaneKind::Optimization, optimization, options)?;
    let mut projection_lane = Lane::new(LaneKind::Projection, projection, options)?;

    for step in 0..options.steps {
        let nominal = options.nominal.value_at(step);
        let optimization_record = optimization_lane.step(step, nominal)?;
        let projection_record = projection_lane.step(step, nominal)?;
        if let Some(sink) = sink.as_mut() {
            sink.on_step(&optimization_record, &projection_record);
        }
    }

    let (optimization, optimization_time) = optimization_lane.finish();
    let (projection, projection_time) = projection_lane.finish();

    Ok(ComparisonRollout {
        optimization,
        projection,
        timing: RolloutTiming {
            optimization_filter_time_s: optimization_time,
            projection_filter_time_s: projection_time,
            total_time_s: started.elapsed().as_secs_f64(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use gr_filter::FilterResult;

    /// Always returns the same feasible optimized control.
    struct FixedFilter(Real);

    impl SafetyFilter for FixedFilter {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn filter(&self, _context: &ProblemContext) -> FilterResult<FilterOutcome> {
            Ok(FilterOutcome::Optimized { value: self.0, feasible: true })
        }
    }

    /// Always reports an infeasible solve with a fallback value.
    struct InfeasibleFilter;

    impl SafetyFilter for InfeasibleFilter {
        fn name(&self) -> &'static str {
            "infeasible"
        }

        fn filter(&self, _context: &ProblemContext) -> FilterResult<FilterOutcome> {
            Ok(FilterOutcome::Optimized { value: -1.0, feasible: false })
        }
    }

    /// Always fails with a degenerate-problem error.
    struct DegenerateFilter;

    impl SafetyFilter for DegenerateFilter {
        fn name(&self) -> &'static str {
            "degenerate"
        }

        fn filter(&self, _context: &ProblemContext) -> FilterResult<FilterOutcome> {
            Err(FilterError::Degenerate { what: "rigged".to_string() })
        }
    }

    /// Always fails with a non-degenerate error.
    struct FaultyFilter;

    impl SafetyFilter for FaultyFilter {
        fn name(&self) -> &'static str {
            "faulty"
        }

        fn filter(&self, _context: &ProblemContext) -> FilterResult<FilterOutcome> {
            Err(FilterError::Backend { message: "rigged".to_string() })
        }
    }

    fn options(steps: usize) -> RolloutOptions {
        RolloutOptions {
            steps,
            time_step: 1.0,
            initial_position: 0.0,
            initial_velocity: 0.0,
            nominal: NominalSignal::Constant { value: 0.0 },
            qp_deadline: None,
        }
    }

    #[test]
    fn first_advance_is_unforced() {
        let filter = FixedFilter(5.0);
        let rollout = run_comparison(&options(2), &filter, &filter, None).unwrap();

        // Step 0 coasts from rest; the control computed there lands at step 1.
        let steps = &rollout.optimization.steps;
        assert_eq!(steps[0].position, 0.0);
        assert_eq!(steps[0].velocity, 0.0);
        assert_eq!(steps[1].velocity, 5.0);
        assert_eq!(steps[1].position, 5.0);
    }

    #[test]
    fn records_carry_post_advance_time() {
        let filter = FixedFilter(0.0);
        let rollout = run_comparison(&options(3), &filter, &filter, None).unwrap();
        let times: Vec<f64> =
            rollout.projection.steps.iter().map(|r| r.time_s).collect();
        assert_eq!(times, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn one_record_per_step() {
        let filter = FixedFilter(0.5);
        for steps in [0, 1, 7] {
            let rollout = run_comparison(&options(steps), &filter, &filter, None).unwrap();
            assert_eq!(rollout.optimization.len(), steps);
            assert_eq!(rollout.projection.len(), steps);
        }
    }

    #[test]
    fn failed_steps_record_none_and_coast() {
        let healthy = FixedFilter(0.0);
        let mut opts = options(3);
        opts.initial_velocity = 1.0;
        let rollout = run_comparison(&opts, &healthy, &DegenerateFilter, None).unwrap();

        for (index, record) in rollout.projection.steps.iter().enumerate() {
            assert_eq!(record.status, StepStatus::FilterFailed);
            assert_eq!(record.sample.filtered, None);
            // Pure coast of the initial velocity.
            assert_eq!(record.position, (index + 1) as f64);
            assert_eq!(record.velocity, 1.0);
        }
        // The healthy lane is unaffected.
        assert!(rollout
            .optimization
            .steps
            .iter()
            .all(|r| r.status == StepStatus::Ok));
    }

    #[test]
    fn infeasible_steps_are_flagged_but_run_continues() {
        let rollout =
            run_comparison(&options(4), &InfeasibleFilter, &FixedFilter(0.0), None).unwrap();
        assert_eq!(rollout.optimization.len(), 4);
        for record in &rollout.optimization.steps {
            assert_eq!(record.status, StepStatus::Infeasible);
            assert_eq!(record.sample.filtered, Some(-1.0));
        }
    }

    #[test]
    fn non_degenerate_error_aborts() {
        let healthy = FixedFilter(0.0);
        let result = run_comparison(&options(3), &healthy, &FaultyFilter, None);
        assert!(matches!(result, Err(HarnessError::Filter(_))));
    }

    #[test]
    fn lanes_share_the_nominal_signal() {
        let mut opts = options(5);
        opts.nominal = NominalSignal::Cosine { amplitude: 1.5, period: 3.0 };
        let filter = FixedFilter(0.0);
        let rollout = run_comparison(&opts, &filter, &filter, None).unwrap();
        for (a, b) in rollout
            .optimization
            .steps
            .iter()
            .zip(rollout.projection.steps.iter())
        {
            assert_eq!(a.sample.nominal, b.sample.nominal);
            assert_eq!(a.step, b.step);
        }
    }

    #[test]
    fn sink_sees_every_step() {
        let filter = FixedFilter(0.0);
        let mut sink = MemorySink::default();
        run_comparison(&options(6), &filter, &filter, Some(&mut sink)).unwrap();
        assert_eq!(sink.steps.len(), 6);
        assert_eq!(sink.steps[5].0.step, 5);
    }

    #[test]
    fn rejects_bad_time_step() {
        let mut opts = options(1);
        opts.time_step = 0.0;
        let filter = FixedFilter(0.0);
        let result = run_comparison(&opts, &filter, &filter, None);
        assert!(matches!(result, Err(HarnessError::InvalidInput(_))));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn record_count_always_matches_steps(steps in 0usize..40) {
                let filter = FixedFilter(0.1);
                let rollout =
                    run_comparison(&options(steps), &filter, &filter, None).unwrap();
                prop_assert_eq!(rollout.optimization.len(), steps);
                prop_assert_eq!(rollout.projection.len(), steps);
            }

            #[test]
            fn elapsed_time_is_steps_times_dt(steps in 1usize..40) {
                let filter = FixedFilter(0.0);
                let mut opts = options(steps);
                opts.time_step = 0.25;
                let rollout =
                    run_comparison(&opts, &filter, &filter, None).unwrap();
                let last = rollout.optimization.steps.last().unwrap();
                prop_assert!((last.time_s - 0.25 * steps as f64).abs() < 1e-9);
            }
        }
    }
}
