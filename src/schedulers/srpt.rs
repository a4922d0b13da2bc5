use super::{take_min_by_key, Dispatch, Scheduler};
use crate::types::Process;
use crate::utils::prelude::*;

/// Preemptive shortest-remaining-processing-time.
///
/// The running process keeps the CPU unless a ready process has strictly
/// less work left; otherwise the smallest remaining time wins, ties by id.
#[derive(Debug, Default)]
pub struct ShortestRemainingFirst {
    ready: Vec<usize>,
}

impl Scheduler for ShortestRemainingFirst {
    fn on_arrival(&mut self, idx: usize, _: &[Process]) {
        self.ready.push(idx);
    }

    #[instrument(level = "trace", skip(self, procs), fields(ready.len = self.ready.len()))]
    fn dispatch(&mut self, procs: &[Process]) -> Option<Dispatch> {
        take_min_by_key(&mut self.ready, |&i| (procs[i].remaining, procs[i].id)).map(Dispatch::to_completion)
    }

    fn on_slice_end(&mut self, idx: usize, _: &[Process]) {
        self.ready.push(idx);
    }

    fn preemptive(&self) -> bool {
        true
    }

    fn should_preempt(&self, running: usize, procs: &[Process]) -> bool {
        let current = procs[running].remaining;
        self.ready.iter().any(|&i| procs[i].remaining < current)
    }
}
