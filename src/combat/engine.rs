//! Deterministic combat resolution
//!
//! Chains the four stage probabilities into expected values for one
//! attacker/defender pair. No modifiers are applied here.
//!
//! Kill probability is the linear clamp `min(models_removed, 1)`. It is an
//! approximation; the simulator gives the exact figure.

use crate::combat::CombatResult;
use crate::dice::{
    hit_probability, mitigation_pass_probability, save_fail_probability, wound_probability,
};
use crate::profile::{AttackProfile, DefenseProfile};

/// Everything the expected-value chain depends on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainInputs {
    pub attacks: f64,
    pub hit_probability: f64,
    pub wound_probability: f64,
    pub save_fail_probability: f64,
    pub mitigation_probability: f64,
    pub mean_damage: f64,
    pub capacity: f64,
}

impl ChainInputs {
    pub fn from_profiles(attack: &AttackProfile, defense: &DefenseProfile) -> Self {
        Self {
            attacks: attack.attacks as f64,
            hit_probability: hit_probability(attack.skill),
            wound_probability: wound_probability(attack.power, defense.resilience),
            save_fail_probability: save_fail_probability(
                defense.save,
                attack.penetration,
                defense.alt_save,
            ),
            mitigation_probability: mitigation_pass_probability(defense.mitigation),
            mean_damage: attack.damage_spec().mean(),
            capacity: defense.wounds_per_model as f64,
        }
    }
}

/// Models removed for a given damage total; 0 for zero capacity
pub fn models_removed(damage: f64, capacity: f64) -> f64 {
    if capacity > 0.0 {
        damage / capacity
    } else {
        0.0
    }
}

/// Run the expected-value chain
pub fn resolve_chain(inputs: &ChainInputs) -> CombatResult {
    let expected_hits = inputs.attacks * inputs.hit_probability;
    let expected_wounds = expected_hits * inputs.wound_probability;
    let expected_unsaved_wounds = expected_wounds * inputs.save_fail_probability;
    let expected_damage =
        expected_unsaved_wounds * inputs.mean_damage * (1.0 - inputs.mitigation_probability);
    let expected_models_removed = models_removed(expected_damage, inputs.capacity);

    CombatResult {
        expected_hits,
        expected_wounds,
        expected_unsaved_wounds,
        expected_damage,
        expected_models_removed,
        hit_probability: inputs.hit_probability,
        wound_probability: inputs.wound_probability,
        save_fail_probability: inputs.save_fail_probability,
        kill_probability: expected_models_removed.min(1.0),
    }
}

/// Expected outcome of `attack` against `defense`, without modifiers
pub fn combat_result(attack: &AttackProfile, defense: &DefenseProfile) -> CombatResult {
    let inputs = ChainInputs::from_profiles(attack, defense);
    tracing::trace!(
        "Resolving {} vs {}: {:?}",
        attack.name,
        defense.name,
        inputs
    );
    resolve_chain(&inputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_scenario() {
        let attack = AttackProfile::new("Bolter", 2, 3, 4, -1, "1");
        let defense = DefenseProfile::new("Trooper", 4, 3, 1, 1);

        let result = combat_result(&attack, &defense);

        assert!((result.expected_hits - 1.333).abs() < 0.01);
        assert!((result.expected_wounds - 0.667).abs() < 0.01);
        assert!((result.save_fail_probability - 0.5).abs() < 0.01);
        assert!((result.expected_unsaved_wounds - 0.333).abs() < 0.01);
    }

    #[test]
    fn test_zero_capacity_removes_nothing() {
        let attack = AttackProfile::test_rifle();
        let defense = DefenseProfile::new("Ghost", 4, 3, 0, 1);

        let result = combat_result(&attack, &defense);

        assert!(result.expected_damage > 0.0);
        assert_eq!(result.expected_models_removed, 0.0);
        assert_eq!(result.kill_probability, 0.0);
    }

    #[test]
    fn test_kill_probability_is_clamped() {
        let attack = AttackProfile::new("Cannon", 20, 2, 10, -3, "d6");
        let defense = DefenseProfile::new("Grunt", 3, 5, 1, 10);

        let result = combat_result(&attack, &defense);

        assert!(result.expected_models_removed > 1.0);
        assert_eq!(result.kill_probability, 1.0);
    }

    #[test]
    fn test_mitigation_reduces_damage() {
        let attack = AttackProfile::test_lascannon();
        let plain = DefenseProfile::test_tank();
        let tough = DefenseProfile::test_tank().with_mitigation(5);

        let without = combat_result(&attack, &plain);
        let with = combat_result(&attack, &tough);

        assert!((with.expected_damage - without.expected_damage * 4.0 / 6.0).abs() < 1e-9);
        assert_eq!(with.expected_unsaved_wounds, without.expected_unsaved_wounds);
    }

    #[test]
    fn test_invalid_skill_produces_zeros() {
        let mut attack = AttackProfile::test_rifle();
        attack.skill = 1;
        let result = combat_result(&attack, &DefenseProfile::test_infantry());
        assert!(result.is_empty());
        assert_eq!(result.kill_efficiency(), 0.0);
    }
}
