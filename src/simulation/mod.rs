//! Stochastic simulator and statistical analyzer

pub mod rng;
pub mod runner;
pub mod stats;

pub use rng::{worker_rng, WorkerRng};
pub use runner::{
    clamp_iterations, run_simulation, run_simulation_with_config, SimulationResult,
    MAX_ITERATIONS, MIN_ITERATIONS,
};
pub use stats::{percentile, Histogram, HistogramBin, Percentiles, SimulationStatistics};
