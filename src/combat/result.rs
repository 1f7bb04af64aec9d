//! Expected outcome of one attack profile against one defense profile

use serde::{Deserialize, Serialize};

/// Closed-form expected values and stage probabilities
///
/// Every field is non-negative and finite; the probabilities lie in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CombatResult {
    pub expected_hits: f64,
    pub expected_wounds: f64,
    pub expected_unsaved_wounds: f64,
    pub expected_damage: f64,
    pub expected_models_removed: f64,
    pub hit_probability: f64,
    pub wound_probability: f64,
    pub save_fail_probability: f64,
    /// Linear clamp of expected models removed; see `combat::engine`
    pub kill_probability: f64,
}

impl CombatResult {
    /// Models removed per hit; 0 when nothing hits
    pub fn kill_efficiency(&self) -> f64 {
        if self.expected_hits > 0.0 {
            self.expected_models_removed / self.expected_hits
        } else {
            0.0
        }
    }

    /// Wounds per hit; 0 when nothing hits
    pub fn wounds_per_hit(&self) -> f64 {
        if self.expected_hits > 0.0 {
            self.expected_wounds / self.expected_hits
        } else {
            0.0
        }
    }

    pub fn damage_per_attack(&self, attacks: u32) -> f64 {
        if attacks > 0 {
            self.expected_damage / attacks as f64
        } else {
            0.0
        }
    }

    pub fn is_empty(&self) -> bool {
        self.expected_damage <= 0.0 && self.expected_hits <= 0.0
    }

    /// Approximate equality, field by field
    pub fn approx_eq(&self, other: &CombatResult, tolerance: f64) -> bool {
        let pairs = [
            (self.expected_hits, other.expected_hits),
            (self.expected_wounds, other.expected_wounds),
            (self.expected_unsaved_wounds, other.expected_unsaved_wounds),
            (self.expected_damage, other.expected_damage),
            (self.expected_models_removed, other.expected_models_removed),
            (self.hit_probability, other.hit_probability),
            (self.wound_probability, other.wound_probability),
            (self.save_fail_probability, other.save_fail_probability),
            (self.kill_probability, other.kill_probability),
        ];
        pairs.iter().all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratios_zero_without_hits() {
        let empty = CombatResult::default();
        assert_eq!(empty.kill_efficiency(), 0.0);
        assert_eq!(empty.wounds_per_hit(), 0.0);
        assert_eq!(empty.damage_per_attack(0), 0.0);
        assert!(empty.kill_efficiency().is_finite());
        assert!(empty.is_empty());
    }

    #[test]
    fn test_ratios() {
        let result = CombatResult {
            expected_hits: 4.0,
            expected_wounds: 2.0,
            expected_models_removed: 1.0,
            expected_damage: 3.0,
            ..CombatResult::default()
        };
        assert_eq!(result.wounds_per_hit(), 0.5);
        assert_eq!(result.kill_efficiency(), 0.25);
        assert_eq!(result.damage_per_attack(6), 0.5);
    }
}
