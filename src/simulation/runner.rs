//! Monte Carlo matchup simulation
//!
//! One deterministic pass (engine plus modifiers) fixes the per-attack stage
//! probabilities. Each trial then rolls every attack independently against
//! those probabilities. Rules that change how individual dice interact are
//! only represented through the aggregate probabilities, not replayed per
//! die. Sustained hits raise expected hits without changing the hit
//! probability, and lethal hits only move the reported wound probability, so
//! both are underrepresented in the trials compared with the closed form.
//!
//! Trials run on rayon: the output buffers are cut into disjoint chunks and
//! each chunk is filled by one worker with its own random source.

use std::time::Instant;

use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::combat::{apply_modifiers, bonus_attacks, bonus_damage, combat_result, CombatResult};
use crate::core::config::SimulationConfig;
use crate::dice::{mitigation_pass_probability, DamageSpec};
use crate::profile::{AttackProfile, DefenseProfile};
use crate::simulation::rng::worker_rng;
use crate::simulation::stats::{Histogram, SimulationStatistics};

pub const MIN_ITERATIONS: usize = 1;
pub const MAX_ITERATIONS: usize = 1_000_000;

/// Upper bound on the number of chunks one run is cut into
///
/// Fixed so that a seeded run splits the same way on every machine.
const MAX_WORKER_CHUNKS: usize = 256;

/// Outcome distribution of a simulated matchup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub iterations: usize,
    pub damage_samples: Vec<f64>,
    pub models_removed_samples: Vec<f64>,
    pub damage_stats: SimulationStatistics,
    pub models_removed_stats: SimulationStatistics,
    pub any_damage_probability: f64,
    pub any_kill_probability: f64,
    pub wipe_probability: f64,
    pub damage_histogram: Histogram,
    pub models_removed_histogram: Histogram,
}

/// Clamp a requested iteration count into the supported range
pub fn clamp_iterations(requested: i64) -> usize {
    if requested < MIN_ITERATIONS as i64 {
        MIN_ITERATIONS
    } else if requested > MAX_ITERATIONS as i64 {
        MAX_ITERATIONS
    } else {
        requested as usize
    }
}

/// Fixed per-attack parameters shared by every trial
#[derive(Debug, Clone, Copy)]
struct TrialParams {
    attacks: u32,
    hit_p: f64,
    wound_p: f64,
    save_fail_p: f64,
    mitigation_p: f64,
    damage: DamageSpec,
    bonus_damage: u32,
    wounds_per_model: u32,
    model_count: u32,
}

impl TrialParams {
    fn new(
        result: &CombatResult,
        attack: &AttackProfile,
        defense: &DefenseProfile,
        range: Option<u32>,
    ) -> Self {
        Self {
            attacks: attack.attacks + bonus_attacks(attack, defense, range),
            hit_p: result.hit_probability,
            wound_p: result.wound_probability,
            save_fail_p: result.save_fail_probability,
            mitigation_p: mitigation_pass_probability(defense.mitigation),
            damage: attack.damage_spec(),
            bonus_damage: bonus_damage(attack, range),
            wounds_per_model: defense.wounds_per_model,
            model_count: defense.model_count,
        }
    }
}

/// Roll one exchange; returns (damage dealt, models removed)
///
/// Damage from one unsaved wound lands on a single model and any excess is
/// lost. Once the unit is gone, damage still counts but removes nothing.
fn run_trial<R: Rng + ?Sized>(params: &TrialParams, rng: &mut R) -> (f64, f64) {
    let mut damage_total: u64 = 0;
    let mut removed: u32 = 0;
    let mut remaining = params.wounds_per_model;

    for _ in 0..params.attacks {
        if rng.gen::<f64>() >= params.hit_p {
            continue;
        }
        if rng.gen::<f64>() >= params.wound_p {
            continue;
        }
        if rng.gen::<f64>() >= params.save_fail_p {
            continue;
        }

        let raw = params.damage.sample(rng).saturating_add(params.bonus_damage);
        let dealt = if params.mitigation_p > 0.0 {
            (0..raw)
                .filter(|_| rng.gen::<f64>() >= params.mitigation_p)
                .count() as u32
        } else {
            raw
        };
        damage_total += dealt as u64;

        if dealt == 0 || params.wounds_per_model == 0 || removed >= params.model_count {
            continue;
        }
        remaining = remaining.saturating_sub(dealt);
        if remaining == 0 {
            removed += 1;
            remaining = params.wounds_per_model;
        }
    }

    (damage_total as f64, removed as f64)
}

fn chunk_size(iterations: usize, config: &SimulationConfig) -> usize {
    iterations
        .div_ceil(MAX_WORKER_CHUNKS)
        .max(config.min_trials_per_worker)
        .max(1)
}

fn ratio(count: usize, iterations: usize) -> f64 {
    if iterations == 0 {
        0.0
    } else {
        count as f64 / iterations as f64
    }
}

/// Simulate a matchup with the default configuration
pub fn run_simulation(
    attack: &AttackProfile,
    defense: &DefenseProfile,
    iterations: i64,
    range: Option<u32>,
    categories: &[String],
    has_cover: bool,
) -> SimulationResult {
    run_simulation_with_config(
        attack,
        defense,
        iterations,
        range,
        categories,
        has_cover,
        &SimulationConfig::default(),
    )
}

/// Simulate a matchup
///
/// `iterations` is clamped to `MIN_ITERATIONS..=MAX_ITERATIONS`. Blocks until
/// every trial is done.
pub fn run_simulation_with_config(
    attack: &AttackProfile,
    defense: &DefenseProfile,
    iterations: i64,
    range: Option<u32>,
    categories: &[String],
    has_cover: bool,
    config: &SimulationConfig,
) -> SimulationResult {
    let start = Instant::now();
    let n = clamp_iterations(iterations);
    if n as i64 != iterations {
        tracing::warn!("Iterations {} clamped to {}", iterations, n);
    }

    let base = combat_result(attack, defense);
    let adjusted = apply_modifiers(&base, attack, defense, range, categories, has_cover);
    let params = TrialParams::new(&adjusted, attack, defense, range);

    let chunk = chunk_size(n, config);
    tracing::info!(
        "Simulating {} vs {}: {} iterations in {} chunks",
        attack.name,
        defense.name,
        n,
        n.div_ceil(chunk)
    );

    let mut damage_samples = vec![0.0; n];
    let mut models_removed_samples = vec![0.0; n];

    damage_samples
        .par_chunks_mut(chunk)
        .zip(models_removed_samples.par_chunks_mut(chunk))
        .enumerate()
        .for_each(|(worker, (damage_chunk, models_chunk))| {
            let mut rng = worker_rng(config.seed, worker);
            for (damage, models) in damage_chunk.iter_mut().zip(models_chunk.iter_mut()) {
                let (dealt, removed) = run_trial(&params, &mut rng);
                *damage = dealt;
                *models = removed;
            }
        });

    let any_damage = damage_samples.iter().filter(|&&d| d > 0.0).count();
    let any_kill = models_removed_samples.iter().filter(|&&m| m >= 1.0).count();
    let wipes = if defense.model_count > 0 {
        models_removed_samples
            .iter()
            .filter(|&&m| m >= defense.model_count as f64)
            .count()
    } else {
        0
    };

    let bins = config.histogram_bins;
    let result = SimulationResult {
        iterations: n,
        damage_stats: SimulationStatistics::from_samples(&damage_samples, bins),
        models_removed_stats: SimulationStatistics::from_samples(&models_removed_samples, bins),
        any_damage_probability: ratio(any_damage, n),
        any_kill_probability: ratio(any_kill, n),
        wipe_probability: ratio(wipes, n),
        damage_histogram: Histogram::from_samples(&damage_samples, bins),
        models_removed_histogram: Histogram::from_samples(&models_removed_samples, bins),
        damage_samples,
        models_removed_samples,
    };

    tracing::info!(
        "Simulation finished in {:.3}s: mean damage {:.3}, wipe {:.3}",
        start.elapsed().as_secs_f64(),
        result.damage_stats.mean,
        result.wipe_probability
    );

    result
}
