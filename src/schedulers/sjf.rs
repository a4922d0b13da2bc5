use super::{take_min_by_key, Dispatch, Scheduler};
use crate::types::Process;
use crate::utils::prelude::*;

/// Non-preemptive shortest-job-first.
///
/// Picks the smallest burst among arrived processes, ties by arrival then id.
/// A shorter job arriving mid-run waits for the current one to finish.
#[derive(Debug, Default)]
pub struct ShortestJobFirst {
    ready: Vec<usize>,
}

impl Scheduler for ShortestJobFirst {
    fn on_arrival(&mut self, idx: usize, _: &[Process]) {
        self.ready.push(idx);
    }

    #[instrument(level = "trace", skip(self, procs), fields(ready.len = self.ready.len()))]
    fn dispatch(&mut self, procs: &[Process]) -> Option<Dispatch> {
        take_min_by_key(&mut self.ready, |&i| {
            let p = &procs[i];
            (p.burst, p.arrival, p.id)
        })
        .map(Dispatch::to_completion)
    }

    fn on_slice_end(&mut self, idx: usize, _: &[Process]) {
        self.ready.push(idx);
    }
}
