//! Attack profiles
//!
//! A profile is constructed once and never mutated. The `with_*` helpers
//! return adjusted copies.

use serde::{Deserialize, Serialize};

use crate::core::error::{OddsError, Result};
use crate::dice::DamageSpec;
use crate::profile::modifier::{ModifierSet, ModifierTag};

/// One weapon profile fired or swung by a unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackProfile {
    pub name: String,
    /// Number of attacks (dice rolled to hit)
    pub attacks: u32,
    /// Roll needed to hit, 2..=6
    pub skill: i32,
    /// Compared against the defender's resilience to find the wound roll
    pub power: i32,
    /// Non-positive modifier to the defender's save
    pub penetration: i32,
    /// Damage spec: `N`, `dN`, `dN+k`, `mdN`
    pub damage: String,
    #[serde(default)]
    pub modifiers: ModifierSet,
    /// Maximum range; `None` is a melee weapon
    #[serde(default)]
    pub range: Option<u32>,
}

impl AttackProfile {
    pub fn new(
        name: impl Into<String>,
        attacks: u32,
        skill: i32,
        power: i32,
        penetration: i32,
        damage: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            attacks,
            skill,
            power,
            penetration,
            damage: damage.into(),
            modifiers: ModifierSet::default(),
            range: None,
        }
    }

    /// Test profile: basic rifle, 2 attacks hitting on 3+
    pub fn test_rifle() -> Self {
        Self::new("Rifle", 2, 3, 4, 0, "1").with_range(24)
    }

    /// Test profile: heavy anti-armour gun
    pub fn test_lascannon() -> Self {
        Self::new("Lascannon", 1, 3, 12, -3, "d6+1").with_range(48)
    }

    /// Test profile: close combat blade
    pub fn test_chainsword() -> Self {
        Self::new("Chainsword", 4, 3, 4, -1, "1")
    }

    pub fn with_range(self, range: u32) -> Self {
        Self {
            range: Some(range),
            ..self
        }
    }

    pub fn with_attacks(self, attacks: u32) -> Self {
        Self { attacks, ..self }
    }

    pub fn with_modifier(self, tag: ModifierTag) -> Self {
        let mut modifiers = self.modifiers;
        modifiers.insert(tag);
        Self { modifiers, ..self }
    }

    pub fn with_modifiers<I: IntoIterator<Item = ModifierTag>>(self, tags: I) -> Self {
        let mut modifiers = self.modifiers;
        modifiers.extend(tags);
        Self { modifiers, ..self }
    }

    pub fn has_modifier(&self, tag: &ModifierTag) -> bool {
        self.modifiers.contains(tag)
    }

    pub fn damage_spec(&self) -> DamageSpec {
        DamageSpec::parse(&self.damage)
    }

    pub fn is_melee(&self) -> bool {
        self.range.is_none()
    }

    /// Is the target within half this weapon's range?
    ///
    /// Melee weapons and unknown target distances never qualify.
    pub fn within_half_range(&self, target_range: Option<u32>) -> bool {
        match (self.range, target_range) {
            (Some(max), Some(distance)) => distance as f64 <= max as f64 / 2.0,
            _ => false,
        }
    }

    pub fn is_valid_for_combat(&self) -> bool {
        self.attacks > 0 && (2..=6).contains(&self.skill)
    }

    /// Describe the first structural problem, if any
    pub fn validate(&self) -> Result<()> {
        if self.attacks == 0 {
            return Err(OddsError::InvalidAttack(format!(
                "{}: attack count must be positive",
                self.name
            )));
        }
        if !(2..=6).contains(&self.skill) {
            return Err(OddsError::InvalidAttack(format!(
                "{}: skill {} outside 2..=6",
                self.name, self.skill
            )));
        }
        Ok(())
    }
}
