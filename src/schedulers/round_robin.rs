use std::collections::VecDeque;

use super::{Dispatch, Scheduler};
use crate::types::{Duration, Process};
use crate::utils::prelude::*;

/// Round-robin with a fixed time quantum.
///
/// The simulator admits everything that arrived during a slice before the
/// preempted process comes back through `on_slice_end`, so new arrivals queue
/// ahead of it.
#[derive(Debug)]
pub struct RoundRobin {
    quantum: Duration,
    ready: VecDeque<usize>,
}

impl RoundRobin {
    pub fn new(quantum: u64) -> Result<Self> {
        if quantum == 0 {
            return Err(Error::NonPositiveQuantum(quantum));
        }
        Ok(Self {
            quantum: Duration(quantum),
            ready: Default::default(),
        })
    }
}

impl Scheduler for RoundRobin {
    fn on_arrival(&mut self, idx: usize, _: &[Process]) {
        self.ready.push_back(idx);
    }

    fn dispatch(&mut self, _: &[Process]) -> Option<Dispatch> {
        self.ready.pop_front().map(|idx| Dispatch {
            idx,
            slice: Some(self.quantum),
        })
    }

    fn on_slice_end(&mut self, idx: usize, _: &[Process]) {
        self.ready.push_back(idx);
    }
}
