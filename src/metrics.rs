use serde::Serialize;

use crate::simulator::Outcome;
use crate::types::{Pid, Process, Time};
use crate::utils::prelude::*;

/// Per-process results of a finished run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessMetrics {
    pub id: Pid,
    pub arrival: u64,
    pub burst: u64,
    pub priority: Option<i64>,
    pub start: u64,
    pub finish: u64,
    pub waiting: u64,
    pub turnaround: u64,
    pub response: u64,
}

impl ProcessMetrics {
    pub fn of(p: &Process) -> Result<Self> {
        Ok(Self {
            id: p.id,
            arrival: p.arrival.0,
            burst: p.burst.0,
            priority: p.priority,
            start: p.start_time()?.0,
            finish: p.finish_time()?.0,
            waiting: p.waiting()?.0,
            turnaround: p.turnaround()?.0,
            response: p.response()?.0,
        })
    }
}

/// Averages over every process of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub processes: usize,
    pub avg_waiting: f64,
    pub avg_turnaround: f64,
    pub avg_response: f64,
    /// completion time of the last process
    pub makespan: Time,
    /// busy share of `[0, makespan)`
    pub cpu_utilization: f64,
    /// completed processes per time unit
    pub throughput: f64,
}

/// Per-process rows, in the order of the outcome
pub fn per_process(outcome: &Outcome) -> Result<Vec<ProcessMetrics>> {
    outcome.processes.iter().map(ProcessMetrics::of).collect()
}

/// Aggregate a finished run.
///
/// An empty batch has no meaningful averages and yields `Ok(None)`; a process
/// without a finish time yields `Error::IncompleteSimulation`.
pub fn aggregate(outcome: &Outcome) -> Result<Option<Summary>> {
    let rows = per_process(outcome)?;
    if rows.is_empty() {
        return Ok(None);
    }

    let n = rows.len() as f64;
    // widened so that many long turnarounds cannot overflow the sum
    let mean = |f: fn(&ProcessMetrics) -> u64| rows.iter().map(|r| u128::from(f(r))).sum::<u128>() as f64 / n;

    let makespan = outcome.timeline.makespan();
    let busy = outcome.timeline.busy_time();
    Ok(Some(Summary {
        processes: rows.len(),
        avg_waiting: mean(|r| r.waiting),
        avg_turnaround: mean(|r| r.turnaround),
        avg_response: mean(|r| r.response),
        makespan,
        // makespan >= sum of bursts >= 1 for a non-empty batch
        cpu_utilization: busy.0 as f64 / makespan.0 as f64,
        throughput: n / makespan.0 as f64,
    }))
}
