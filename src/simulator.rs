use std::collections::HashSet;

use parse_display::{Display, FromStr};

use crate::schedulers::{self, Dispatch, Policy, Scheduler};
use crate::timeline::{Interval, Timeline};
use crate::types::{Duration, Pid, Process, Time};
use crate::utils::prelude::*;

/// How the clock moves between decisions.
///
/// Both modes produce the same timeline; `Tick` exists to check that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, FromStr, serde::Deserialize, serde::Serialize)]
#[display(style = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Stepping {
    /// Jump straight to the next arrival, slice end or completion
    Event,
    /// Advance one time unit at a time
    Tick,
}

impl Default for Stepping {
    fn default() -> Self {
        Stepping::Event
    }
}

/// Result of one policy over one batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub policy: Policy,
    /// Same order as the input, with start and finish times filled in
    pub processes: Vec<Process>,
    pub timeline: Timeline,
}

impl Outcome {
    pub fn process(&self, pid: Pid) -> Option<&Process> {
        self.processes.iter().find(|p| p.id == pid)
    }
}

/// Run `policy` over a copy of `processes`.
///
/// The input is validated first: ids must be unique, the priority policy
/// needs a priority on every process, and round-robin needs `quantum >= 1`.
pub fn schedule(processes: &[Process], policy: Policy, quantum: u64, stepping: Stepping) -> Result<Outcome> {
    validate(processes, policy)?;
    let scheduler = schedulers::from_config(policy, quantum)?;

    let _g = info_span!("schedule", %policy, %stepping).entered();
    let (processes, timeline) = Simulation::new(scheduler, processes.to_vec(), stepping).run();
    info!(
        processes = processes.len(),
        intervals = timeline.len(),
        makespan = %timeline.makespan(),
        "done"
    );

    Ok(Outcome {
        policy,
        processes,
        timeline,
    })
}

fn validate(processes: &[Process], policy: Policy) -> Result<()> {
    let mut seen = HashSet::with_capacity(processes.len());
    for p in processes {
        if !seen.insert(p.id) {
            return Err(Error::DuplicateId(p.id));
        }
        if policy.needs_priority() && p.priority.is_none() {
            return Err(Error::MissingPriority { id: p.id });
        }
    }

    // no instant of the run can pass the last arrival plus all the work
    let last_arrival = processes.iter().map(|p| p.arrival).max().unwrap_or_default();
    processes
        .iter()
        .try_fold(last_arrival, |t, p| t.checked_add(p.burst))
        .ok_or(Error::TimeOverflow)?;
    Ok(())
}

/// A process currently holding the CPU
#[derive(Debug, Clone, Copy)]
struct Run {
    idx: usize,
    /// start of the interval being recorded
    since: Time,
    /// end of the slice granted at dispatch, if any
    slice_end: Option<Time>,
}

/// State of one simulation run over a single CPU
pub struct Simulation<S> {
    scheduler: S,
    stepping: Stepping,
    time: Time,
    processes: Vec<Process>,
    /// process indices in `(arrival, id)` order
    arrivals: Vec<usize>,
    /// next entry of `arrivals` not yet handed to the scheduler
    next_arrival: usize,
    running: Option<Run>,
    /// gave up the CPU with work left; its interval stays open in case it is
    /// dispatched again right away
    stopped: Option<Run>,
    timeline: Timeline,
    completed: usize,
}

impl<S: Scheduler> Simulation<S> {
    pub fn new(scheduler: S, mut processes: Vec<Process>, stepping: Stepping) -> Self {
        processes.iter_mut().for_each(Process::reset);
        let mut arrivals: Vec<usize> = (0..processes.len()).collect();
        arrivals.sort_by_key(|&i| (processes[i].arrival, processes[i].id));

        Self {
            scheduler,
            stepping,
            time: Time(0),
            processes,
            arrivals,
            next_arrival: 0,
            running: None,
            stopped: None,
            timeline: Timeline::new(),
            completed: 0,
        }
    }

    /// Run until every process completes
    pub fn run(mut self) -> (Vec<Process>, Timeline) {
        while self.step() {}

        assert_eq!(
            self.completed,
            self.processes.len(),
            "scheduler stopped dispatching with unfinished processes"
        );
        (self.processes, self.timeline)
    }

    /// Advance to the next decision point. Returns `false` once nothing is left to do.
    pub fn step(&mut self) -> bool {
        self.admit();

        let run = match self.running.take() {
            Some(run) => run,
            None => match self.scheduler.dispatch(&self.processes) {
                Some(dispatch) => self.start(dispatch),
                None => return self.idle(),
            },
        };

        let idx = run.idx;
        let until = self.run_until(&run);
        let ran = until - self.time;
        self.processes[idx].remaining -= ran;
        self.time = until;
        trace!(time = %self.time, pid = self.processes[idx].id, %ran, "ran");

        if self.processes[idx].remaining.is_zero() {
            self.processes[idx].finish_time = Some(self.time);
            self.completed += 1;
            self.close(run);
            debug!(time = %self.time, pid = self.processes[idx].id, "finished");
        } else if run.slice_end == Some(self.time) {
            // whatever arrived during the slice queues ahead of the preempted process
            self.admit();
            self.scheduler.on_slice_end(idx, &self.processes);
            self.stopped = Some(run);
            debug!(time = %self.time, pid = self.processes[idx].id, "slice expired");
        } else {
            self.admit();
            if self.scheduler.preemptive() && self.scheduler.should_preempt(idx, &self.processes) {
                self.scheduler.on_slice_end(idx, &self.processes);
                self.stopped = Some(run);
                debug!(time = %self.time, pid = self.processes[idx].id, "preempted");
            } else {
                self.running = Some(run);
            }
        }
        true
    }

    /// Hand everything that has arrived by now to the scheduler
    fn admit(&mut self) {
        while let Some(&idx) = self.arrivals.get(self.next_arrival) {
            if self.processes[idx].arrival > self.time {
                break;
            }
            trace!(time = %self.time, pid = self.processes[idx].id, "arrived");
            self.scheduler.on_arrival(idx, &self.processes);
            self.next_arrival += 1;
        }
    }

    fn next_arrival_time(&self) -> Option<Time> {
        self.arrivals
            .get(self.next_arrival)
            .map(|&idx| self.processes[idx].arrival)
    }

    /// Nothing ready: move the clock to the next arrival, or report the end
    fn idle(&mut self) -> bool {
        if let Some(run) = self.stopped.take() {
            self.close(run);
        }
        match self.next_arrival_time() {
            Some(next) => {
                let to = match self.stepping {
                    Stepping::Event => next,
                    Stepping::Tick => self.time + Duration(1),
                };
                debug!(from = %self.time, %to, "cpu idle");
                self.time = to;
                true
            }
            None => false,
        }
    }

    fn start(&mut self, dispatch: Dispatch) -> Run {
        let Dispatch { idx, slice } = dispatch;
        let now = self.time;
        // a slice reaching past the time range cannot expire before completion
        let slice_end = slice.and_then(|q| now.checked_add(q));

        // the same process picked again without anyone else running in between
        // keeps its interval open
        let since = match self.stopped.take() {
            Some(prev) if prev.idx == idx => prev.since,
            Some(prev) => {
                self.close(prev);
                now
            }
            None => now,
        };

        let p = &mut self.processes[idx];
        p.start_time.get_or_insert(now);
        debug!(time = %now, pid = p.id, remaining = %p.remaining, ?slice, "dispatch");

        Run { idx, since, slice_end }
    }

    /// The instant the current run must stop to hand control back to the scheduler
    fn run_until(&self, run: &Run) -> Time {
        let mut until = self.time + self.processes[run.idx].remaining;
        if let Some(end) = run.slice_end {
            until = until.min(end);
        }
        if self.scheduler.preemptive() {
            // arrivals up to now are admitted, so this is strictly in the future
            if let Some(next) = self.next_arrival_time() {
                until = until.min(next);
            }
        }
        if self.stepping == Stepping::Tick {
            until = until.min(self.time + Duration(1));
        }
        until
    }

    fn close(&mut self, run: Run) {
        let pid = self.processes[run.idx].id;
        self.timeline.push(Interval::new(pid, run.since, self.time));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProcessSpec;
    use crate::workload::{self, WorkloadConfig};

    fn procs(specs: &[(Pid, i64, i64)]) -> Vec<Process> {
        Process::from_specs(specs.iter().map(|&(id, a, b)| ProcessSpec::new(id, a, b))).unwrap()
    }

    fn prio_procs(specs: &[(Pid, i64, i64, i64)]) -> Vec<Process> {
        Process::from_specs(
            specs
                .iter()
                .map(|&(id, a, b, p)| ProcessSpec::new(id, a, b).with_priority(p)),
        )
        .unwrap()
    }

    fn run(policy: Policy, processes: &[Process]) -> Outcome {
        schedule(processes, policy, 4, Stepping::Event).unwrap()
    }

    fn intervals(ivs: &[(Pid, u64, u64)]) -> Vec<Interval> {
        ivs.iter().map(|&iv| iv.into()).collect()
    }

    fn waits(outcome: &Outcome) -> Vec<u64> {
        outcome.processes.iter().map(|p| p.waiting().unwrap().0).collect()
    }

    /// Properties every finished run must have, whatever the policy
    fn check_invariants(outcome: &Outcome) {
        let tl = outcome.timeline.intervals();
        for w in tl.windows(2) {
            assert!(w[0].end <= w[1].start, "{} overlaps {}", w[0], w[1]);
        }
        for p in &outcome.processes {
            assert!(p.remaining.is_zero());
            assert!(p.turnaround().unwrap() >= p.burst, "{}", p);
            let own: Vec<_> = tl.iter().filter(|iv| iv.pid == p.id).collect();
            let served: Duration = own.iter().map(|iv| iv.duration()).sum();
            assert_eq!(served, p.burst, "{} served {}", p, served);
            assert!(own[0].start >= p.arrival);
            assert_eq!(Some(own[0].start), p.start_time);
            assert_eq!(Some(own[own.len() - 1].end), p.finish_time);
        }
        // the cpu only idles when nobody is waiting
        for (from, to) in outcome.timeline.idle_gaps() {
            for p in &outcome.processes {
                assert!(
                    p.arrival >= to || p.finish_time.unwrap() <= from,
                    "{} was ready during idle gap {}-{}",
                    p,
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn single_process_is_trivial_everywhere() {
        let ps = prio_procs(&[(1, 0, 5, 1)]);
        for &policy in Policy::ALL.iter() {
            for &stepping in &[Stepping::Event, Stepping::Tick] {
                let out = schedule(&ps, policy, 4, stepping).unwrap();
                assert_eq!(out.timeline.intervals(), &intervals(&[(1, 0, 5)])[..], "{}", policy);
                assert_eq!(out.processes[0].waiting().unwrap(), Duration(0));
                assert_eq!(out.processes[0].turnaround().unwrap(), Duration(5));
            }
        }
    }

    #[test]
    fn non_overlapping_arrivals_agree_across_policies() {
        let ps = prio_procs(&[(1, 0, 3, 2), (2, 3, 2, 1)]);
        for &policy in Policy::ALL.iter() {
            let out = run(policy, &ps);
            assert_eq!(out.timeline.intervals(), &intervals(&[(1, 0, 3), (2, 3, 5)])[..], "{}", policy);
            assert_eq!(waits(&out), vec![0, 0], "{}", policy);
            check_invariants(&out);
        }
    }

    #[test]
    fn sjf_is_non_preemptive() {
        let ps = procs(&[(1, 0, 8), (2, 1, 4)]);
        assert_eq!(waits(&run(Policy::Fcfs, &ps)), vec![0, 7]);
        assert_eq!(waits(&run(Policy::Sjf, &ps)), vec![0, 7]);
    }

    #[test]
    fn sjf_and_fcfs_diverge_on_simultaneous_arrivals() {
        let ps = procs(&[(1, 0, 8), (2, 0, 4)]);

        let sjf = run(Policy::Sjf, &ps);
        assert_eq!(waits(&sjf), vec![4, 0]);
        assert_eq!(sjf.timeline.intervals(), &intervals(&[(2, 0, 4), (1, 4, 12)])[..]);

        let fcfs = run(Policy::Fcfs, &ps);
        assert_eq!(waits(&fcfs), vec![0, 8]);
    }

    #[test]
    fn fcfs_breaks_arrival_ties_by_id() {
        let ps = procs(&[(3, 0, 1), (2, 0, 1), (1, 1, 1)]);
        let out = run(Policy::Fcfs, &ps);
        assert_eq!(out.timeline.intervals(), &intervals(&[(2, 0, 1), (3, 1, 2), (1, 2, 3)])[..]);
    }

    #[test]
    fn sjf_breaks_burst_ties_by_arrival_then_id() {
        let ps = procs(&[(1, 0, 5), (4, 1, 2), (3, 2, 2), (2, 2, 2)]);
        let out = run(Policy::Sjf, &ps);
        assert_eq!(
            out.timeline.intervals(),
            &intervals(&[(1, 0, 5), (4, 5, 7), (2, 7, 9), (3, 9, 11)])[..]
        );
    }

    #[test]
    fn srpt_preempts_on_shorter_arrival() {
        let ps = procs(&[(1, 0, 5), (2, 2, 2)]);
        for &stepping in &[Stepping::Event, Stepping::Tick] {
            let out = schedule(&ps, Policy::Srpt, 4, stepping).unwrap();
            assert_eq!(
                out.timeline.intervals(),
                &intervals(&[(1, 0, 2), (2, 2, 4), (1, 4, 7)])[..]
            );
            assert_eq!(out.process(1).unwrap().finish_time, Some(Time(7)));
            assert_eq!(waits(&out), vec![2, 0]);
        }
    }

    #[test]
    fn srpt_keeps_running_process_on_ties() {
        // at t=2 both have 3 left: no switch
        let ps = procs(&[(1, 0, 5), (2, 2, 3)]);
        let out = run(Policy::Srpt, &ps);
        assert_eq!(out.timeline.intervals(), &intervals(&[(1, 0, 5), (2, 5, 8)])[..]);

        // a longer arrival does not split the running interval
        let ps = procs(&[(1, 0, 5), (2, 2, 4)]);
        let out = run(Policy::Srpt, &ps);
        assert_eq!(out.timeline.intervals(), &intervals(&[(1, 0, 5), (2, 5, 9)])[..]);
    }

    #[test]
    fn srpt_resumes_by_lowest_id_on_ties() {
        // p1 preempts p9; at t=2 p9 and the new p2 both have 4 left
        let ps = procs(&[(9, 0, 5), (1, 1, 1), (2, 2, 4)]);
        let out = run(Policy::Srpt, &ps);
        assert_eq!(
            out.timeline.intervals(),
            &intervals(&[(9, 0, 1), (1, 1, 2), (2, 2, 6), (9, 6, 10)])[..]
        );

        let ps = procs(&[(2, 0, 4), (1, 0, 4)]);
        let out = run(Policy::Srpt, &ps);
        assert_eq!(out.timeline.intervals(), &intervals(&[(1, 0, 4), (2, 4, 8)])[..]);
    }

    #[test]
    fn priority_picks_lowest_value() {
        let ps = prio_procs(&[(1, 0, 4, 3), (2, 0, 3, 1), (3, 1, 2, 2), (4, 1, 1, 2)]);
        let out = run(Policy::Priority, &ps);
        assert_eq!(
            out.timeline.intervals(),
            &intervals(&[(2, 0, 3), (3, 3, 5), (4, 5, 6), (1, 6, 10)])[..]
        );
        check_invariants(&out);
    }

    #[test]
    fn priority_starves_low_priority_work() {
        // p1 waits as long as more urgent work keeps arriving
        let ps = prio_procs(&[(1, 0, 1, 9), (2, 0, 3, 1), (3, 2, 3, 1), (4, 5, 3, 1)]);
        let out = run(Policy::Priority, &ps);
        assert_eq!(out.process(1).unwrap().start_time, Some(Time(9)));
        assert_eq!(out.process(1).unwrap().waiting().unwrap(), Duration(9));
    }

    #[test]
    fn round_robin_requeues_after_arrivals() {
        let ps = procs(&[(1, 0, 5), (2, 1, 3)]);
        let out = run(Policy::Rr, &ps);
        assert_eq!(
            out.timeline.intervals(),
            &intervals(&[(1, 0, 4), (2, 4, 7), (1, 7, 8)])[..]
        );
        assert_eq!(out.timeline.makespan(), Time(8));

        // p2 and p3 arrive during p1's first slice and go ahead of it
        let ps = procs(&[(1, 0, 6), (2, 2, 2), (3, 4, 2)]);
        let out = run(Policy::Rr, &ps);
        assert_eq!(
            out.timeline.intervals(),
            &intervals(&[(1, 0, 4), (2, 4, 6), (3, 6, 8), (1, 8, 10)])[..]
        );
    }

    #[test]
    fn round_robin_quantum_matters() {
        let ps = procs(&[(1, 0, 3), (2, 0, 3)]);
        let out = schedule(&ps, Policy::Rr, 1, Stepping::Event).unwrap();
        assert_eq!(
            out.timeline.intervals(),
            &intervals(&[(1, 0, 1), (2, 1, 2), (1, 2, 3), (2, 3, 4), (1, 4, 5), (2, 5, 6)])[..]
        );
        // an exact fit completes instead of being requeued
        let out = schedule(&ps, Policy::Rr, 3, Stepping::Event).unwrap();
        assert_eq!(out.timeline.intervals(), &intervals(&[(1, 0, 3), (2, 3, 6)])[..]);
    }

    #[test]
    fn lone_process_keeps_one_interval_across_slices() {
        let ps = procs(&[(1, 0, 10), (2, 12, 1)]);
        let out = schedule(&ps, Policy::Rr, 3, Stepping::Event).unwrap();
        assert_eq!(out.timeline.intervals(), &intervals(&[(1, 0, 10), (2, 12, 13)])[..]);
    }

    #[test]
    fn idle_time_jumps_to_next_arrival() {
        let ps = prio_procs(&[(1, 5, 2, 1), (2, 10, 1, 1)]);
        for &policy in Policy::ALL.iter() {
            for &stepping in &[Stepping::Event, Stepping::Tick] {
                let out = schedule(&ps, policy, 4, stepping).unwrap();
                assert_eq!(out.timeline.intervals(), &intervals(&[(1, 5, 7), (2, 10, 11)])[..]);
                assert_eq!(out.timeline.idle_gaps(), vec![(Time(0), Time(5)), (Time(7), Time(10))]);
            }
        }
    }

    #[test]
    fn empty_batch_is_not_an_error() {
        for &policy in Policy::ALL.iter() {
            let out = run(policy, &[]);
            assert!(out.timeline.is_empty());
            assert!(out.processes.is_empty());
        }
    }

    #[test]
    fn invalid_input_is_rejected_before_scheduling() {
        let ps = procs(&[(1, 0, 2), (1, 3, 2)]);
        assert!(matches!(
            schedule(&ps, Policy::Fcfs, 4, Stepping::Event),
            Err(Error::DuplicateId(1))
        ));

        let ps = procs(&[(1, 0, 2)]);
        assert!(matches!(
            schedule(&ps, Policy::Priority, 4, Stepping::Event),
            Err(Error::MissingPriority { id: 1 })
        ));
        assert!(matches!(
            schedule(&ps, Policy::Rr, 0, Stepping::Event),
            Err(Error::NonPositiveQuantum(0))
        ));
    }

    #[test]
    fn batches_past_the_time_range_are_rejected() {
        let ps = procs(&[(1, 0, i64::MAX), (2, 0, i64::MAX), (3, 0, i64::MAX)]);
        for &policy in &[Policy::Fcfs, Policy::Sjf, Policy::Srpt, Policy::Rr] {
            assert!(matches!(
                schedule(&ps, policy, 4, Stepping::Event),
                Err(Error::TimeOverflow)
            ));
        }

        let ps = procs(&[(1, i64::MAX, i64::MAX), (2, 0, 2)]);
        assert!(matches!(
            schedule(&ps, Policy::Fcfs, 4, Stepping::Event),
            Err(Error::TimeOverflow)
        ));
    }

    #[test]
    fn huge_values_inside_the_time_range() {
        let big = i64::MAX as u64;
        let ps = procs(&[(1, 0, i64::MAX), (2, i64::MAX, 1)]);
        for &policy in &[Policy::Fcfs, Policy::Sjf, Policy::Srpt] {
            let out = run(policy, &ps);
            assert_eq!(out.timeline.intervals(), &intervals(&[(1, 0, big), (2, big, big + 1)])[..]);
        }

        // the slice end lies past u64::MAX, so the process simply completes
        let ps = procs(&[(1, 5, 3)]);
        let out = schedule(&ps, Policy::Rr, u64::MAX, Stepping::Event).unwrap();
        assert_eq!(out.timeline.intervals(), &intervals(&[(1, 5, 8)])[..]);
    }

    #[test]
    fn output_keeps_input_order_and_input_is_untouched() {
        let ps = procs(&[(3, 4, 1), (1, 0, 2), (2, 1, 1)]);
        let out = run(Policy::Sjf, &ps);
        let ids: Vec<_> = out.processes.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert!(ps.iter().all(|p| p.finish_time.is_none()));
    }

    #[test]
    fn rerun_is_identical() {
        let ps = Process::from_specs(workload::generate("rerun", &WorkloadConfig::default())).unwrap();
        for &policy in Policy::ALL.iter() {
            assert_eq!(run(policy, &ps), run(policy, &ps));
        }
    }

    #[test]
    fn random_batches_hold_invariants_in_both_stepping_modes() {
        let cfg = WorkloadConfig {
            count: 12,
            max_arrival: 30,
            max_burst: 9,
            max_priority: 4,
        };
        for seed in 0..40 {
            let ps = Process::from_specs(workload::generate(&format!("seed {}", seed), &cfg)).unwrap();
            for &policy in Policy::ALL.iter() {
                for quantum in 1..=5 {
                    let event = schedule(&ps, policy, quantum, Stepping::Event).unwrap();
                    let tick = schedule(&ps, policy, quantum, Stepping::Tick).unwrap();
                    check_invariants(&event);
                    assert_eq!(event, tick, "{} q={} seed {}", policy, quantum, seed);
                    if policy != Policy::Rr {
                        break;
                    }
                }
            }
        }
    }

    #[test]
    fn sjf_minimizes_average_wait_on_simultaneous_batch() {
        let ps = prio_procs(&[(1, 0, 6, 1), (2, 0, 8, 1), (3, 0, 7, 1), (4, 0, 3, 1)]);
        let total = |out: &Outcome| waits(out).iter().sum::<u64>();
        let sjf = total(&run(Policy::Sjf, &ps));
        for &policy in Policy::ALL.iter() {
            assert!(sjf <= total(&run(policy, &ps)), "{}", policy);
        }
        assert_eq!(sjf, 3 + 9 + 16);
    }
}
