use std::io::Write;
use std::path::Path;

use crate::utils::prelude::*;

pub mod batch;
pub mod config;
pub mod metrics;
pub mod output;
pub mod schedulers;
pub mod simulator;
pub mod timeline;
pub mod types;
pub mod utils;
pub mod workload;

pub use crate::config::SimConfig;
pub use crate::metrics::{aggregate, ProcessMetrics, Summary};
pub use crate::schedulers::Policy;
pub use crate::simulator::{schedule, Outcome, Stepping};
pub use crate::timeline::{Interval, Timeline};
pub use crate::types::{Duration, Pid, Process, ProcessSpec, Time};

/// Read a batch file and validate every row
pub fn load_batch(path: &Path) -> Result<Vec<Process>> {
    Process::from_specs(batch::read_batch(path)?)
}

/// Run the configured policy and write the report to `out`
pub fn run_sim(cfg: &SimConfig, out: Option<&mut dyn Write>) -> Result<Outcome> {
    let _g = info_span!("sim", policy = %cfg.policy).entered();

    let processes = load_batch(&cfg.batch_file)?;
    let outcome = schedule(&processes, cfg.policy, cfg.quantum, cfg.stepping)?;
    let rows = metrics::per_process(&outcome)?;
    let summary = aggregate(&outcome)?;

    {
        let _g = info_span!("output").entered();
        if let Some(out) = out {
            output::render_report(out, &outcome, cfg.quantum, &rows, summary.as_ref())?;
        }
        if cfg.chrome_trace {
            let path = cfg.output_file(format!("trace-{}.json", cfg.policy))?;
            output::render_chrome_trace(&path, std::slice::from_ref(&outcome))?;
        }
        if cfg.job_trace {
            let path = cfg.output_file(format!("jobs-{}.csv", cfg.policy))?;
            output::render_job_trace(&path, &rows)?;
        }
    }

    Ok(outcome)
}

/// Run every policy over the same batch and write a comparison table to `out`.
///
/// The priority policy is left out, and shown as `n/a`, when the batch carries
/// no priorities at all.
pub fn run_compare(cfg: &SimConfig, out: &mut dyn Write) -> Result<Vec<Outcome>> {
    let _g = info_span!("compare").entered();

    let processes = load_batch(&cfg.batch_file)?;
    let no_priorities = !processes.is_empty() && processes.iter().all(|p| p.priority.is_none());

    let mut outcomes = vec![];
    let mut rows = vec![];
    for &policy in Policy::ALL.iter() {
        if policy.needs_priority() && no_priorities {
            warn!(%policy, "batch has no priorities, skipping");
            rows.push((policy, None));
            continue;
        }
        let outcome = schedule(&processes, policy, cfg.quantum, cfg.stepping)?;
        rows.push((policy, aggregate(&outcome)?));
        if cfg.job_trace {
            let path = cfg.output_file(format!("jobs-{}.csv", policy))?;
            output::render_job_trace(&path, &metrics::per_process(&outcome)?)?;
        }
        outcomes.push(outcome);
    }

    output::render_comparison(&mut *out, &rows)?;
    if cfg.chrome_trace {
        let path = cfg.output_file("trace-compare.json")?;
        output::render_chrome_trace(&path, &outcomes)?;
    }

    Ok(outcomes)
}
