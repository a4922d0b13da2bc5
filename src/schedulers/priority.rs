use super::{take_min_by_key, Dispatch, Scheduler};
use crate::types::Process;
use crate::utils::prelude::*;

/// Non-preemptive static priority, lower value first.
///
/// Ties go to the earlier arrival, then the lower id. There is no aging: a
/// low-priority process waits as long as higher-priority work keeps coming.
#[derive(Debug, Default)]
pub struct PriorityFirst {
    ready: Vec<usize>,
}

impl Scheduler for PriorityFirst {
    fn on_arrival(&mut self, idx: usize, _: &[Process]) {
        self.ready.push(idx);
    }

    #[instrument(level = "trace", skip(self, procs), fields(ready.len = self.ready.len()))]
    fn dispatch(&mut self, procs: &[Process]) -> Option<Dispatch> {
        // input validation guarantees a priority; sort a missing one last anyway
        take_min_by_key(&mut self.ready, |&i| {
            let p = &procs[i];
            (p.priority.unwrap_or(i64::MAX), p.arrival, p.id)
        })
        .map(Dispatch::to_completion)
    }

    fn on_slice_end(&mut self, idx: usize, _: &[Process]) {
        self.ready.push(idx);
    }
}
