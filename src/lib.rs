//! Mathhammer - dice-resolution combat odds
//!
//! Closed-form expected values for an attack profile against a defense
//! profile (hit, wound, save, mitigation, damage, casualties), a processor
//! for weapon rules that alter that chain, and a parallel Monte Carlo
//! simulator for full outcome distributions.

pub mod combat;
pub mod core;
pub mod dice;
pub mod profile;
pub mod simulation;

pub use crate::combat::{apply_modifiers, combat_result, CombatResult};
pub use crate::core::{OddsError, Result, SimulationConfig};
pub use crate::dice::{
    hit_probability, mitigation_pass_probability, save_fail_probability, wound_probability,
    DamageSpec,
};
pub use crate::profile::{AttackProfile, DefenseProfile, ModifierSet, ModifierTag};
pub use crate::simulation::{
    run_simulation, run_simulation_with_config, Histogram, SimulationResult,
    SimulationStatistics,
};
