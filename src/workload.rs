use rand::Rng;
use rand_seeder::{Seeder, SipRng};
use serde::{Deserialize, Serialize};

use crate::types::ProcessSpec;
use crate::utils::prelude::*;

/// Shape of a randomly drawn batch
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct WorkloadConfig {
    pub count: usize,
    /// arrivals are drawn from `[0, max_arrival]`
    pub max_arrival: i64,
    /// bursts are drawn from `[1, max_burst]`
    pub max_burst: i64,
    /// priorities are drawn from `[1, max_priority]`
    pub max_priority: i64,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            count: 10,
            max_arrival: 20,
            max_burst: 10,
            max_priority: 5,
        }
    }
}

/// Draw a batch from a seeded generator; the same seed gives the same batch.
///
/// Ids are handed out in arrival order, starting at 1. Bounds below the
/// smallest valid value are raised to it.
pub fn generate(seed: &str, cfg: &WorkloadConfig) -> Vec<ProcessSpec> {
    let mut rng: SipRng = Seeder::from(seed).make_rng();

    let mut arrivals: Vec<i64> = (0..cfg.count)
        .map(|_| rng.gen_range(0..=cfg.max_arrival.max(0)))
        .collect();
    arrivals.sort_unstable();

    let specs: Vec<_> = arrivals
        .into_iter()
        .enumerate()
        .map(|(i, arrival)| ProcessSpec {
            id: i + 1,
            arrival,
            burst: rng.gen_range(1..=cfg.max_burst.max(1)),
            priority: Some(rng.gen_range(1..=cfg.max_priority.max(1))),
        })
        .collect();
    debug!(seed, count = specs.len(), "generated workload");
    specs
}
