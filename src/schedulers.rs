use itertools::Itertools;
use parse_display::{Display, FromStr};

use crate::types::{Duration, Process};
use crate::utils::prelude::*;

mod fcfs;
mod priority;
mod round_robin;
mod sjf;
mod srpt;

pub use fcfs::Fcfs;
pub use priority::PriorityFirst;
pub use round_robin::RoundRobin;
pub use sjf::ShortestJobFirst;
pub use srpt::ShortestRemainingFirst;

/// Default round-robin time slice
pub const DEFAULT_QUANTUM: u64 = 4;

/// The scheduling policies the simulator knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, FromStr, serde::Deserialize, serde::Serialize)]
#[display(style = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    Fcfs,
    Sjf,
    Srpt,
    Priority,
    Rr,
}

impl Policy {
    pub const ALL: [Policy; 5] = [Policy::Fcfs, Policy::Sjf, Policy::Srpt, Policy::Priority, Policy::Rr];

    pub fn title(self) -> &'static str {
        match self {
            Policy::Fcfs => "First-Come-First-Served",
            Policy::Sjf => "Shortest-Job-First",
            Policy::Srpt => "Shortest-Remaining-Processing-Time",
            Policy::Priority => "Priority",
            Policy::Rr => "Round-Robin",
        }
    }

    pub fn needs_priority(self) -> bool {
        self == Policy::Priority
    }
}

/// What to run next, and for how long at most
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch {
    /// index into the process slice
    pub idx: usize,
    /// `None` runs the process until it completes
    pub slice: Option<Duration>,
}

impl Dispatch {
    pub fn to_completion(idx: usize) -> Self {
        Self { idx, slice: None }
    }
}

/// A scheduling policy, driven by the simulator.
///
/// Processes are referred to by their index in the slice the simulator owns.
/// The simulator hands every process to `on_arrival` exactly once, in
/// `(arrival, id)` order, and never while it is on the CPU.
pub trait Scheduler {
    /// A process became eligible to run
    fn on_arrival(&mut self, idx: usize, procs: &[Process]);

    /// Pick the next process for an idle CPU and remove it from the ready set
    fn dispatch(&mut self, procs: &[Process]) -> Option<Dispatch>;

    /// The running process gave up the CPU with work left,
    /// either at the end of its slice or through preemption
    fn on_slice_end(&mut self, idx: usize, procs: &[Process]);

    /// Whether arrivals can cut a running process short
    fn preemptive(&self) -> bool {
        false
    }

    /// Asked after new processes arrived while `running` is on the CPU
    fn should_preempt(&self, _running: usize, _procs: &[Process]) -> bool {
        false
    }
}

impl Scheduler for Box<dyn Scheduler> {
    #[inline]
    fn on_arrival(&mut self, idx: usize, procs: &[Process]) {
        (**self).on_arrival(idx, procs)
    }

    #[inline]
    fn dispatch(&mut self, procs: &[Process]) -> Option<Dispatch> {
        (**self).dispatch(procs)
    }

    #[inline]
    fn on_slice_end(&mut self, idx: usize, procs: &[Process]) {
        (**self).on_slice_end(idx, procs)
    }

    #[inline]
    fn preemptive(&self) -> bool {
        (**self).preemptive()
    }

    #[inline]
    fn should_preempt(&self, running: usize, procs: &[Process]) -> bool {
        (**self).should_preempt(running, procs)
    }
}

pub fn from_config(policy: Policy, quantum: u64) -> Result<Box<dyn Scheduler + 'static>> {
    debug!(%policy, quantum, "using");
    Ok(match policy {
        Policy::Fcfs => Box::new(Fcfs::default()),
        Policy::Sjf => Box::new(ShortestJobFirst::default()),
        Policy::Srpt => Box::new(ShortestRemainingFirst::default()),
        Policy::Priority => Box::new(PriorityFirst::default()),
        Policy::Rr => Box::new(RoundRobin::new(quantum)?),
    })
}

/// Remove and return the ready entry with the smallest key
fn take_min_by_key<K, F>(ready: &mut Vec<usize>, key: F) -> Option<usize>
where
    K: Ord,
    F: FnMut(&usize) -> K,
{
    let pos = ready.iter().copied().position_min_by_key(key)?;
    // the full key decides the choice, so ready order need not be kept
    Some(ready.swap_remove(pos))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_names() {
        assert_eq!(Policy::Rr.to_string(), "rr");
        assert_eq!("srpt".parse::<Policy>().unwrap(), Policy::Srpt);
        assert_eq!("priority".parse::<Policy>().unwrap(), Policy::Priority);
        assert!("lottery".parse::<Policy>().is_err());
        for p in Policy::ALL.iter() {
            assert_eq!(p.to_string().parse::<Policy>().unwrap(), *p);
        }
    }

    #[test]
    fn zero_quantum_is_rejected() {
        assert!(matches!(from_config(Policy::Rr, 0), Err(Error::NonPositiveQuantum(0))));
        // the quantum is ignored by other policies
        assert!(from_config(Policy::Fcfs, 0).is_ok());
    }

    #[test]
    fn take_min_uses_whole_key() {
        let mut ready = vec![4, 1, 3, 1];
        assert_eq!(take_min_by_key(&mut ready, |&i| i), Some(1));
        assert_eq!(ready.len(), 3);
        assert_eq!(take_min_by_key(&mut ready, |&i| std::cmp::Reverse(i)), Some(4));
        let mut empty = vec![];
        assert_eq!(take_min_by_key(&mut empty, |&i| i), None);
    }
}
