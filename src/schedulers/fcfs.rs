use std::collections::VecDeque;

use super::{Dispatch, Scheduler};
use crate::types::Process;

/// First-come-first-served, non-preemptive.
///
/// Arrivals are admitted in `(arrival, id)` order, so a plain FIFO runs them
/// in that order.
#[derive(Debug, Default)]
pub struct Fcfs {
    ready: VecDeque<usize>,
}

impl Scheduler for Fcfs {
    fn on_arrival(&mut self, idx: usize, _: &[Process]) {
        self.ready.push_back(idx);
    }

    fn dispatch(&mut self, _: &[Process]) -> Option<Dispatch> {
        self.ready.pop_front().map(Dispatch::to_completion)
    }

    fn on_slice_end(&mut self, idx: usize, procs: &[Process]) {
        // no slices and not preemptive: the engine only calls this for either
        unreachable!("fcfs asked to requeue P{}", procs[idx].id);
    }
}
