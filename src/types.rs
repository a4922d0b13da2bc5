use std::convert::TryFrom;
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use parse_display::Display;
use serde::{Deserialize, Serialize};

use crate::utils::prelude::*;

/// A time point in simulation
#[derive(Debug, Clone, Copy, Default, PartialOrd, Ord, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
#[display("{0}")]
pub struct Time(pub u64);

/// A duration of time in simulation
#[derive(Debug, Clone, Copy, Default, PartialOrd, Ord, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
#[display("{0}")]
pub struct Duration(pub u64);

impl Duration {
    pub const ZERO: Duration = Duration(0);

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl Time {
    pub fn checked_add(self, d: Duration) -> Option<Time> {
        self.0.checked_add(d.0).map(Time)
    }
}

impl Add<Duration> for Time {
    type Output = Time;

    fn add(self, rhs: Duration) -> Self::Output {
        Time(self.0 + rhs.0)
    }
}

impl AddAssign<Duration> for Time {
    fn add_assign(&mut self, rhs: Duration) {
        self.0 += rhs.0;
    }
}

impl Sub for Time {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Self::Output {
        debug_assert!(self >= rhs, "time went backwards: {} - {}", self, rhs);
        Duration(self.0 - rhs.0)
    }
}

impl Add for Duration {
    type Output = Duration;

    fn add(self, rhs: Self) -> Self::Output {
        Duration(self.0 + rhs.0)
    }
}

impl Sub for Duration {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Self::Output {
        Duration(self.0 - rhs.0)
    }
}

impl SubAssign for Duration {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl std::iter::Sum for Duration {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Duration(iter.map(|d| d.0).sum())
    }
}

/// Process id as written in the batch file
pub type Pid = usize;

/// One row of a batch, as read, before validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSpec {
    #[serde(rename = "Process")]
    pub id: Pid,
    #[serde(rename = "Arrival")]
    pub arrival: i64,
    #[serde(rename = "CPU Burst Time")]
    pub burst: i64,
    #[serde(rename = "Priority", default)]
    pub priority: Option<i64>,
}

impl ProcessSpec {
    pub fn new(id: Pid, arrival: i64, burst: i64) -> Self {
        Self {
            id,
            arrival,
            burst,
            priority: None,
        }
    }

    pub fn with_priority(self, priority: i64) -> Self {
        Self {
            priority: Some(priority),
            ..self
        }
    }
}

/// A schedulable process and what the simulation did with it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Process {
    pub id: Pid,
    pub arrival: Time,
    /// total CPU time requested
    pub burst: Duration,
    /// lower value runs first
    pub priority: Option<i64>,

    /// CPU time not yet executed
    pub remaining: Duration,
    /// set on first dispatch
    pub start_time: Option<Time>,
    /// set when `remaining` reaches zero
    pub finish_time: Option<Time>,
}

impl TryFrom<ProcessSpec> for Process {
    type Error = Error;

    fn try_from(spec: ProcessSpec) -> Result<Self> {
        let arrival = u64::try_from(spec.arrival).map_err(|_| Error::NegativeArrival {
            id: spec.id,
            arrival: spec.arrival,
        })?;
        if spec.burst <= 0 {
            return Err(Error::NonPositiveBurst {
                id: spec.id,
                burst: spec.burst,
            });
        }
        let burst = Duration(spec.burst as u64);
        Ok(Process {
            id: spec.id,
            arrival: Time(arrival),
            burst,
            priority: spec.priority,
            remaining: burst,
            start_time: None,
            finish_time: None,
        })
    }
}

impl Process {
    /// Validate a whole batch, keeping the input order
    pub fn from_specs(specs: impl IntoIterator<Item = ProcessSpec>) -> Result<Vec<Process>> {
        specs.into_iter().map(Process::try_from).collect()
    }

    pub fn is_done(&self) -> bool {
        self.finish_time.is_some()
    }

    /// Clear all simulation outputs
    pub fn reset(&mut self) {
        self.remaining = self.burst;
        self.start_time = None;
        self.finish_time = None;
    }

    pub fn finish_time(&self) -> Result<Time> {
        self.finish_time.ok_or(Error::IncompleteSimulation {
            id: self.id,
            what: "finish time",
        })
    }

    pub fn start_time(&self) -> Result<Time> {
        self.start_time.ok_or(Error::IncompleteSimulation {
            id: self.id,
            what: "start time",
        })
    }

    /// Time from arrival to completion
    pub fn turnaround(&self) -> Result<Duration> {
        Ok(self.finish_time()? - self.arrival)
    }

    /// Time spent eligible but not running
    pub fn waiting(&self) -> Result<Duration> {
        Ok(self.turnaround()? - self.burst)
    }

    /// Time from arrival to first dispatch
    pub fn response(&self) -> Result<Duration> {
        Ok(self.start_time()? - self.arrival)
    }
}

impl fmt::Display for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}(@{}, {}", self.id, self.arrival, self.burst)?;
        if let Some(p) = self.priority {
            write!(f, ", prio {}", p)?;
        }
        write!(f, ")")
    }
}
