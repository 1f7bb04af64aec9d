//! Modifier tags: named weapon rules that alter the resolution chain
//!
//! The tag set is closed. `stage` and `Display` match every variant
//! exhaustively, so a new rule fails to compile until it has been placed in
//! a pipeline stage.

use std::fmt;
use std::str::FromStr;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::core::error::OddsError;

/// Unordered set of tags carried by an attack profile
pub type ModifierSet = AHashSet<ModifierTag>;

/// Pipeline stage a tag acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ModifierStage {
    AttackCount,
    Hit,
    Wound,
    Damage,
    Save,
    /// Rules with no effect on expected values
    Inert,
}

/// A weapon rule
///
/// Parameters are optional; a missing one falls back to the default in
/// `combat::constants`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierTag {
    /// Extra attacks when the target is within half range
    RapidFire(Option<u32>),
    /// Extra attacks scaled by the size of the target unit
    Blast,
    /// Flat extra attacks
    ExtraAttacks(Option<u32>),
    /// Hits automatically
    Torrent,
    /// +1 to hit
    Heavy,
    /// -1 to hit, target counts as in cover
    IndirectFire,
    /// Re-roll every failed hit
    ReRollHits,
    /// Re-roll hit rolls of 1
    ReRollHitOnes,
    /// Critical hits score extra hits
    SustainedHits(Option<u32>),
    /// Critical hits wound automatically
    LethalHits,
    /// +1 to wound
    Lance,
    /// Re-roll every failed wound
    TwinLinked,
    /// Re-roll wound rolls of 1
    ReRollWoundOnes,
    /// Critical wounds ignore saves
    DevastatingWounds,
    /// Critical wounds on `threshold`+ against targets with `keyword`, ignoring saves
    Anti {
        keyword: String,
        threshold: Option<i32>,
    },
    /// Extra damage when the target is within half range
    Melta(Option<u32>),
    /// Flat extra damage per unsaved wound
    BonusDamage(Option<u32>),
    /// Target gains no benefit from cover
    IgnoresCover,
    /// Worsens the target's save by an extra amount
    Penetrating(Option<u32>),
    Assault,
    Pistol,
    Precision,
    Hazardous,
}

impl ModifierTag {
    pub fn stage(&self) -> ModifierStage {
        use ModifierTag::*;
        match self {
            RapidFire(_) | Blast | ExtraAttacks(_) => ModifierStage::AttackCount,
            Torrent | Heavy | IndirectFire | ReRollHits | ReRollHitOnes | SustainedHits(_)
            | LethalHits => ModifierStage::Hit,
            Lance | TwinLinked | ReRollWoundOnes | DevastatingWounds | Anti { .. } => {
                ModifierStage::Wound
            }
            Melta(_) | BonusDamage(_) => ModifierStage::Damage,
            IgnoresCover | Penetrating(_) => ModifierStage::Save,
            Assault | Pistol | Precision | Hazardous => ModifierStage::Inert,
        }
    }

    /// Does this anti rule apply to a defender with these categories?
    pub fn matches_category(&self, categories: &[String]) -> bool {
        match self {
            ModifierTag::Anti { keyword, .. } => categories
                .iter()
                .any(|c| c.trim().eq_ignore_ascii_case(keyword.trim())),
            _ => false,
        }
    }
}

fn write_param(f: &mut fmt::Formatter<'_>, name: &str, param: &Option<u32>) -> fmt::Result {
    match param {
        Some(n) => write!(f, "{} {}", name, n),
        None => write!(f, "{}", name),
    }
}

impl fmt::Display for ModifierTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ModifierTag::*;
        match self {
            RapidFire(n) => write_param(f, "Rapid Fire", n),
            Blast => write!(f, "Blast"),
            ExtraAttacks(n) => write_param(f, "Extra Attacks", n),
            Torrent => write!(f, "Torrent"),
            Heavy => write!(f, "Heavy"),
            IndirectFire => write!(f, "Indirect Fire"),
            ReRollHits => write!(f, "Re-roll Hits"),
            ReRollHitOnes => write!(f, "Re-roll Hit Ones"),
            SustainedHits(n) => write_param(f, "Sustained Hits", n),
            LethalHits => write!(f, "Lethal Hits"),
            Lance => write!(f, "Lance"),
            TwinLinked => write!(f, "Twin-linked"),
            ReRollWoundOnes => write!(f, "Re-roll Wound Ones"),
            DevastatingWounds => write!(f, "Devastating Wounds"),
            Anti { keyword, threshold } => match threshold {
                Some(t) => write!(f, "Anti-{} {}+", keyword, t),
                None => write!(f, "Anti-{}", keyword),
            },
            Melta(n) => write_param(f, "Melta", n),
            BonusDamage(n) => write_param(f, "Bonus Damage", n),
            IgnoresCover => write!(f, "Ignores Cover"),
            Penetrating(n) => write_param(f, "Penetrating", n),
            Assault => write!(f, "Assault"),
            Pistol => write!(f, "Pistol"),
            Precision => write!(f, "Precision"),
            Hazardous => write!(f, "Hazardous"),
        }
    }
}

fn parse_anti(body: &str, original: &str) -> Result<ModifierTag, OddsError> {
    let mut words: Vec<&str> = body.split_whitespace().collect();

    let threshold = match words.last() {
        Some(last) if last.ends_with('+') => {
            let value = last
                .trim_end_matches('+')
                .parse::<i32>()
                .map_err(|_| OddsError::UnknownModifier(original.to_string()))?;
            words.pop();
            Some(value)
        }
        _ => None,
    };

    if words.is_empty() {
        return Err(OddsError::UnknownModifier(original.to_string()));
    }

    Ok(ModifierTag::Anti {
        keyword: words.join(" "),
        threshold,
    })
}

impl FromStr for ModifierTag {
    type Err = OddsError;

    /// Parse tabletop-style rule text such as "Sustained Hits 2",
    /// "Anti-Vehicle 4+" or "Twin-linked"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .to_lowercase()
            .replace(['-', '_'], " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .replace("re roll", "reroll");

        if let Some(body) = normalized.strip_prefix("anti ") {
            return parse_anti(body, s);
        }

        // Trailing integer is the parameter
        let (name, param) = match normalized.rsplit_once(' ') {
            Some((head, tail)) if tail.chars().all(|c| c.is_ascii_digit()) => {
                let value = tail
                    .parse::<u32>()
                    .map_err(|_| OddsError::UnknownModifier(s.to_string()))?;
                (head, Some(value))
            }
            _ => (normalized.as_str(), None),
        };

        let tag = match (name, param) {
            ("rapid fire", n) => ModifierTag::RapidFire(n),
            ("extra attacks", n) => ModifierTag::ExtraAttacks(n),
            ("sustained hits", n) => ModifierTag::SustainedHits(n),
            ("melta", n) => ModifierTag::Melta(n),
            ("bonus damage", n) => ModifierTag::BonusDamage(n),
            ("penetrating", n) => ModifierTag::Penetrating(n),
            ("blast", None) => ModifierTag::Blast,
            ("torrent", None) => ModifierTag::Torrent,
            ("heavy", None) => ModifierTag::Heavy,
            ("indirect fire", None) => ModifierTag::IndirectFire,
            ("reroll hits", None) => ModifierTag::ReRollHits,
            ("reroll hit ones", None) => ModifierTag::ReRollHitOnes,
            ("lethal hits", None) => ModifierTag::LethalHits,
            ("lance", None) => ModifierTag::Lance,
            ("twin linked", None) => ModifierTag::TwinLinked,
            ("reroll wound ones", None) => ModifierTag::ReRollWoundOnes,
            ("devastating wounds", None) => ModifierTag::DevastatingWounds,
            ("ignores cover", None) => ModifierTag::IgnoresCover,
            ("assault", None) => ModifierTag::Assault,
            ("pistol", None) => ModifierTag::Pistol,
            ("precision", None) => ModifierTag::Precision,
            ("hazardous", None) => ModifierTag::Hazardous,
            _ => return Err(OddsError::UnknownModifier(s.to_string())),
        };

        Ok(tag)
    }
}

/// Parse a list of rule texts into a set, failing on the first unknown one
pub fn parse_modifiers<'a, I>(texts: I) -> Result<ModifierSet, OddsError>
where
    I: IntoIterator<Item = &'a str>,
{
    texts.into_iter().map(str::parse).collect()
}
