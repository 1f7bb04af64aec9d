//! Damage specifications: fixed values and dice expressions
//!
//! Accepted forms: `N`, `dN`, `dN+k`, `mdN`, `mdN+k` (case-insensitive).
//! Anything else parses as a fixed 1; parsing never fails. Values beyond
//! the limits below count as unparseable.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Largest number of dice in one spec
pub const MAX_DICE_COUNT: u32 = 100;
/// Largest die size
pub const MAX_DICE_SIDES: u32 = 100;
/// Largest fixed value or flat bonus
pub const MAX_FLAT_DAMAGE: u32 = 1_000;

/// A parsed damage value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageSpec {
    Fixed(u32),
    Dice { count: u32, sides: u32, bonus: u32 },
}

impl DamageSpec {
    /// Parse a damage spec, falling back to `Fixed(1)`
    pub fn parse(text: &str) -> Self {
        Self::try_parse(text).unwrap_or(DamageSpec::Fixed(1))
    }

    /// Parse a damage spec, `None` when the text is not a damage value
    pub fn try_parse(text: &str) -> Option<Self> {
        let cleaned: String = text
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();

        if cleaned.is_empty() {
            return None;
        }

        let Some(d_pos) = cleaned.find('d') else {
            return cleaned
                .parse::<u32>()
                .ok()
                .filter(|&n| n <= MAX_FLAT_DAMAGE)
                .map(DamageSpec::Fixed);
        };

        let count = match &cleaned[..d_pos] {
            "" => 1,
            digits => digits.parse::<u32>().ok()?,
        };

        let rest = &cleaned[d_pos + 1..];
        let (sides, bonus) = match rest.split_once('+') {
            Some((sides, bonus)) => (sides.parse::<u32>().ok()?, bonus.parse::<u32>().ok()?),
            None => (rest.parse::<u32>().ok()?, 0),
        };

        if count == 0 || sides == 0 {
            return None;
        }
        if count > MAX_DICE_COUNT || sides > MAX_DICE_SIDES || bonus > MAX_FLAT_DAMAGE {
            return None;
        }

        Some(DamageSpec::Dice {
            count,
            sides,
            bonus,
        })
    }

    /// Expected damage of one roll
    pub fn mean(&self) -> f64 {
        match *self {
            DamageSpec::Fixed(n) => n as f64,
            DamageSpec::Dice {
                count,
                sides,
                bonus,
            } => count as f64 * (sides as f64 + 1.0) / 2.0 + bonus as f64,
        }
    }

    pub fn min(&self) -> u32 {
        match *self {
            DamageSpec::Fixed(n) => n,
            DamageSpec::Dice { count, bonus, .. } => count.saturating_add(bonus),
        }
    }

    pub fn max(&self) -> u32 {
        match *self {
            DamageSpec::Fixed(n) => n,
            DamageSpec::Dice {
                count,
                sides,
                bonus,
            } => count.saturating_mul(sides).saturating_add(bonus),
        }
    }

    /// Draw one damage value
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        match *self {
            DamageSpec::Fixed(n) => n,
            DamageSpec::Dice {
                count,
                sides,
                bonus,
            } => (0..count)
                .map(|_| rng.gen_range(1..=sides))
                .fold(bonus, u32::saturating_add),
        }
    }
}

impl Default for DamageSpec {
    fn default() -> Self {
        DamageSpec::Fixed(1)
    }
}

impl std::fmt::Display for DamageSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            DamageSpec::Fixed(n) => write!(f, "{}", n),
            DamageSpec::Dice {
                count,
                sides,
                bonus,
            } => {
                if count > 1 {
                    write!(f, "{}", count)?;
                }
                write!(f, "D{}", sides)?;
                if bonus > 0 {
                    write!(f, "+{}", bonus)?;
                }
                Ok(())
            }
        }
    }
}

/// Mean damage of a spec string
pub fn mean_damage(text: &str) -> f64 {
    DamageSpec::parse(text).mean()
}
