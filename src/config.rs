use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::schedulers::{Policy, DEFAULT_QUANTUM};
use crate::simulator::Stepping;
use crate::utils::prelude::*;

/// Everything a simulation run needs, as read from the config tree
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SimConfig {
    pub batch_file: PathBuf,
    pub policy: Policy,
    #[serde(default = "default_quantum")]
    pub quantum: u64,
    #[serde(default)]
    pub stepping: Stepping,
    pub output_dir: PathBuf,
    #[serde(default)]
    pub chrome_trace: bool,
    #[serde(default)]
    pub job_trace: bool,
}

fn default_quantum() -> u64 {
    DEFAULT_QUANTUM
}

impl SimConfig {
    /// Resolve the config tree held by the global `AppConfig`
    pub fn load() -> Result<Self> {
        config().fetch()
    }

    /// Path of an output file, creating the output directory on demand
    pub fn output_file(&self, name: impl AsRef<Path>) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        Ok(self.output_dir.join(name))
    }
}
