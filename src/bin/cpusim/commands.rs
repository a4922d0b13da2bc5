use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use structopt::StructOpt;

use cpusim::batch;
use cpusim::utils::prelude::*;
use cpusim::workload::{self, WorkloadConfig};
use cpusim::{Policy, SimConfig, Stepping};

/// Should be implemented by individual subcommand
pub trait Cmd {
    fn run(self) -> Result<()>;

    /// Whether the command writes its result to stdout
    fn produces_output(&self) -> bool {
        true
    }
}

/// Overrides shared by the simulating commands
#[derive(StructOpt)]
pub struct SimArgs {
    /// Batch file, tab separated with a `Process Arrival CPU Burst Time [Priority]` header
    #[structopt(parse(from_os_str))]
    batch: Option<PathBuf>,

    /// Round-robin time quantum
    #[structopt(short, long)]
    quantum: Option<u64>,

    /// Clock advancement: event or tick
    #[structopt(long)]
    stepping: Option<Stepping>,

    /// Directory for trace files
    #[structopt(long, parse(from_os_str))]
    output_dir: Option<PathBuf>,

    /// Write a chrome://tracing file of the timeline
    #[structopt(long)]
    chrome_trace: bool,

    /// Write per-process metrics as CSV
    #[structopt(long)]
    job_trace: bool,
}

impl SimArgs {
    fn resolve(self) -> Result<SimConfig> {
        let mut cfg = SimConfig::load()?;
        if let Some(batch) = self.batch {
            cfg.batch_file = batch;
        }
        if let Some(quantum) = self.quantum {
            cfg.quantum = quantum;
        }
        if let Some(stepping) = self.stepping {
            cfg.stepping = stepping;
        }
        if let Some(dir) = self.output_dir {
            cfg.output_dir = dir;
        }
        cfg.chrome_trace |= self.chrome_trace;
        cfg.job_trace |= self.job_trace;
        Ok(cfg)
    }
}

/// Show the configuration
#[derive(StructOpt)]
pub struct Config {}

impl Cmd for Config {
    fn run(self) -> Result<()> {
        let cfg = SimConfig::load()?;
        serde_yaml::to_writer(io::stdout(), &cfg)?;
        println!();
        Ok(())
    }
}

/// Run one policy end-to-end
#[derive(StructOpt)]
pub struct Run {
    /// fcfs, sjf, srpt, priority or rr
    #[structopt(long)]
    policy: Option<Policy>,

    /// Skip the report, only write trace files
    #[structopt(long)]
    quiet: bool,

    #[structopt(flatten)]
    sim: SimArgs,
}

impl Cmd for Run {
    fn run(self) -> Result<()> {
        let mut cfg = self.sim.resolve()?;
        if let Some(policy) = self.policy {
            cfg.policy = policy;
        }

        if self.quiet {
            cpusim::run_sim(&cfg, None)?;
        } else {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            cpusim::run_sim(&cfg, Some(&mut out))?;
            out.flush()?;
        }
        Ok(())
    }

    fn produces_output(&self) -> bool {
        !self.quiet
    }
}

/// Run all policies and print a comparison table
#[derive(StructOpt)]
pub struct Compare {
    #[structopt(flatten)]
    sim: SimArgs,
}

impl Cmd for Compare {
    fn run(self) -> Result<()> {
        let cfg = self.sim.resolve()?;
        let stdout = io::stdout();
        let mut out = stdout.lock();
        cpusim::run_compare(&cfg, &mut out)?;
        out.flush()?;
        Ok(())
    }
}

/// Generate a random batch
#[derive(StructOpt)]
pub struct Generate {
    /// Number of processes
    #[structopt(short = "n", long, default_value = "10")]
    count: usize,

    /// Seed for the random generator
    #[structopt(long, default_value = "stripy zebra")]
    seed: String,

    /// Latest arrival time
    #[structopt(long, default_value = "20")]
    max_arrival: i64,

    /// Longest burst
    #[structopt(long, default_value = "10")]
    max_burst: i64,

    /// Largest priority value
    #[structopt(long, default_value = "5")]
    max_priority: i64,

    /// Write to a file instead of stdout
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,
}

impl Cmd for Generate {
    fn run(self) -> Result<()> {
        let cfg = WorkloadConfig {
            count: self.count,
            max_arrival: self.max_arrival,
            max_burst: self.max_burst,
            max_priority: self.max_priority,
        };
        let specs = workload::generate(&self.seed, &cfg);
        match &self.output {
            Some(path) => batch::write_batch(File::create(path)?, &specs)?,
            None => batch::write_batch(io::stdout(), &specs)?,
        }
        info!(processes = specs.len(), "generated batch");
        Ok(())
    }

    fn produces_output(&self) -> bool {
        self.output.is_none()
    }
}
