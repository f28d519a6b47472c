//! Per-iteration diagnostics and cooperative cancellation.

use std::time::Duration;

/// Diagnostics emitted once per update step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationEvent {
    /// 1-based index of the update step
    pub iteration: usize,
    /// Objective value accumulated during this step
    pub objective: f64,
    /// Frobenius norm of the membership change
    pub convergence_norm: f64,
    /// Wall-clock time spent in this step
    pub elapsed: Duration,
}

/// Receives iteration events and may ask the loop to stop early.
pub trait IterationObserver {
    /// Called after every update step.
    fn on_iteration(&mut self, event: &IterationEvent);

    /// Checked between iterations. Returning `true` ends the run with
    /// [`Termination::Cancelled`](crate::Termination::Cancelled).
    fn should_stop(&self) -> bool {
        false
    }
}

/// Logs every iteration at `debug` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl IterationObserver for TracingObserver {
    fn on_iteration(&mut self, event: &IterationEvent) {
        tracing::debug!(
            iteration = event.iteration,
            objective = event.objective,
            convergence_norm = event.convergence_norm,
            elapsed_s = event.elapsed.as_secs_f64(),
            "fuzzy c-means step"
        );
    }
}

/// Records every event, optionally stopping after a fixed number of steps.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Vec<IterationEvent>,
    stop_after: Option<usize>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation once `steps` events have been recorded.
    pub fn stop_after(steps: usize) -> Self {
        Self {
            events: Vec::new(),
            stop_after: Some(steps),
        }
    }

    pub fn events(&self) -> &[IterationEvent] {
        &self.events
    }
}

impl IterationObserver for EventLog {
    fn on_iteration(&mut self, event: &IterationEvent) {
        self.events.push(*event);
    }

    fn should_stop(&self) -> bool {
        self.stop_after
            .is_some_and(|steps| self.events.len() >= steps)
    }
}
