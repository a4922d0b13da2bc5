use std::fmt;

use itertools::Itertools;
use serde::Serialize;

use crate::types::{Duration, Pid, Time};

/// One contiguous stretch of CPU time given to a process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Interval {
    pub pid: Pid,
    pub start: Time,
    pub end: Time,
}

impl Interval {
    pub fn new(pid: Pid, start: Time, end: Time) -> Self {
        Self { pid, start, end }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

impl From<(Pid, u64, u64)> for Interval {
    fn from((pid, start, end): (Pid, u64, u64)) -> Self {
        Self::new(pid, Time(start), Time(end))
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{} ({}-{})", self.pid, self.start, self.end)
    }
}

/// The Gantt record of a run: CPU intervals in chronological order.
///
/// Intervals never overlap; the gaps between them are idle CPU time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    intervals: Vec<Interval>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an interval; it must start no earlier than the last one ended
    pub fn push(&mut self, interval: Interval) {
        assert!(interval.start < interval.end, "empty interval {}", interval);
        if let Some(last) = self.intervals.last() {
            assert!(
                last.end <= interval.start,
                "interval {} overlaps {}",
                interval,
                last
            );
        }
        self.intervals.push(interval);
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Display view: back-to-back intervals of the same process become one
    pub fn merged(&self) -> Vec<Interval> {
        self.intervals
            .iter()
            .copied()
            .coalesce(|a, b| {
                if a.pid == b.pid && a.end == b.start {
                    Ok(Interval::new(a.pid, a.start, b.end))
                } else {
                    Err((a, b))
                }
            })
            .collect()
    }

    /// Stretches of `[0, makespan)` with nothing on the CPU
    pub fn idle_gaps(&self) -> Vec<(Time, Time)> {
        let mut cursor = Time(0);
        let mut gaps = vec![];
        for iv in &self.intervals {
            if iv.start > cursor {
                gaps.push((cursor, iv.start));
            }
            cursor = iv.end;
        }
        gaps
    }

    /// End of the last interval
    pub fn makespan(&self) -> Time {
        self.intervals.last().map(|iv| iv.end).unwrap_or_default()
    }

    pub fn busy_time(&self) -> Duration {
        self.intervals.iter().map(Interval::duration).sum()
    }
}

/// Text Gantt chart, `| P1 (0-3) | P2 (3-5) |`
impl fmt::Display for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for iv in &self.intervals {
            write!(f, "| {} ", iv)?;
        }
        write!(f, "|")
    }
}
