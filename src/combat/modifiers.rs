//! Modifier (ability) processor
//!
//! Adjusts a deterministic `CombatResult` for the tags on an attack profile.
//! Stages run in a fixed order regardless of how the tags were inserted:
//!
//! 1. attack count (rapid fire, blast, extra attacks; cover folds in here)
//! 2. hit (torrent, hit modifiers, re-rolls, sustained hits, lethal hits)
//! 3. wound (lance, anti, re-rolls, critical wounds bypassing saves)
//! 4. damage (melta, bonus damage)
//! 5. save (ignores cover, penetrating)
//!
//! After stage 1, a change to one quantity propagates by scaling every
//! dependent quantity by the new/old ratio rather than re-running the whole
//! chain. Stacked tags therefore compound rounding the same way every time.
//! When the old value is zero there is nothing to scale and the stage
//! recomputes its dependents directly.

use crate::combat::constants::*;
use crate::combat::engine::{models_removed, resolve_chain, ChainInputs};
use crate::combat::CombatResult;
use crate::dice::{
    d6_success, hit_probability, reroll_all, reroll_ones, save_fail_probability,
    wound_roll_needed, CRITICAL_PROBABILITY,
};
use crate::profile::{AttackProfile, DefenseProfile, ModifierTag};

/// Working copy of the chain while stages adjust it
#[derive(Debug, Clone)]
struct Pipeline {
    attacks: f64,
    hit_p: f64,
    wound_p: f64,
    /// Save-fail chance for wounds that still get a save
    save_fail_p: f64,
    mitigation_p: f64,
    mean_damage: f64,
    capacity: f64,

    hits: f64,
    /// Hits that roll to wound (hits minus auto-wounding criticals)
    wound_rolls: f64,
    /// Wounds scored without a wound roll
    auto_wounds: f64,
    wounds: f64,
    /// Unsaved wounds that bypassed the save entirely
    bypassed: f64,
    unsaved: f64,
    damage: f64,
    models: f64,
    kill_p: f64,

    /// Wound probability reported instead of `wound_p`
    display_wound_p: Option<f64>,
}

fn ratio(new: f64, old: f64) -> Option<f64> {
    if old > 0.0 {
        Some(new / old)
    } else {
        None
    }
}

impl Pipeline {
    fn new(base: &CombatResult, inputs: &ChainInputs) -> Self {
        Self {
            attacks: inputs.attacks,
            hit_p: base.hit_probability,
            wound_p: base.wound_probability,
            save_fail_p: base.save_fail_probability,
            mitigation_p: inputs.mitigation_probability,
            mean_damage: inputs.mean_damage,
            capacity: inputs.capacity,
            hits: base.expected_hits,
            wound_rolls: base.expected_hits,
            auto_wounds: 0.0,
            wounds: base.expected_wounds,
            bypassed: 0.0,
            unsaved: base.expected_unsaved_wounds,
            damage: base.expected_damage,
            models: base.expected_models_removed,
            kill_p: base.kill_probability,
            display_wound_p: None,
        }
    }

    /// Re-run the whole chain from the current attack count and probabilities
    fn recompute_all(&mut self) {
        let result = resolve_chain(&ChainInputs {
            attacks: self.attacks,
            hit_probability: self.hit_p,
            wound_probability: self.wound_p,
            save_fail_probability: self.save_fail_p,
            mitigation_probability: self.mitigation_p,
            mean_damage: self.mean_damage,
            capacity: self.capacity,
        });
        self.hits = result.expected_hits;
        self.wound_rolls = result.expected_hits;
        self.auto_wounds = 0.0;
        self.wounds = result.expected_wounds;
        self.bypassed = 0.0;
        self.unsaved = result.expected_unsaved_wounds;
        self.damage = result.expected_damage;
        self.models = result.expected_models_removed;
        self.kill_p = result.kill_probability;
    }

    fn recompute_from_damage(&mut self) {
        self.models = models_removed(self.damage, self.capacity);
        self.kill_p = self.models.min(1.0);
    }

    fn recompute_from_unsaved(&mut self) {
        self.damage = self.unsaved * self.mean_damage * (1.0 - self.mitigation_p);
        self.recompute_from_damage();
    }

    fn recompute_from_wounds(&mut self) {
        self.bypassed = 0.0;
        self.unsaved = self.wounds * self.save_fail_p;
        self.recompute_from_unsaved();
    }

    fn recompute_from_hits(&mut self) {
        self.wound_rolls = self.hits;
        self.auto_wounds = 0.0;
        self.wounds = self.hits * self.wound_p;
        self.recompute_from_wounds();
    }

    fn scale_after_damage(&mut self, r: f64) {
        self.models *= r;
        self.kill_p = (self.kill_p * r).min(1.0);
    }

    fn scale_after_unsaved(&mut self, r: f64) {
        self.damage *= r;
        self.scale_after_damage(r);
    }

    fn scale_after_wounds(&mut self, r: f64) {
        self.bypassed *= r;
        self.unsaved *= r;
        self.scale_after_unsaved(r);
    }

    fn rescale_hits(&mut self, new_hits: f64) {
        match ratio(new_hits, self.hits) {
            Some(r) => {
                self.hits = new_hits;
                self.wound_rolls *= r;
                self.auto_wounds *= r;
                self.wounds *= r;
                self.scale_after_wounds(r);
            }
            None => {
                self.hits = new_hits;
                self.recompute_from_hits();
            }
        }
    }

    fn rescale_wounds(&mut self, new_wounds: f64) {
        match ratio(new_wounds, self.wounds) {
            Some(r) => {
                self.wounds = new_wounds;
                self.scale_after_wounds(r);
            }
            None => {
                self.wounds = new_wounds;
                self.recompute_from_wounds();
            }
        }
    }

    fn rescale_unsaved(&mut self, new_unsaved: f64) {
        match ratio(new_unsaved, self.unsaved) {
            Some(r) => {
                self.unsaved = new_unsaved;
                self.scale_after_unsaved(r);
            }
            None => {
                self.unsaved = new_unsaved;
                self.recompute_from_unsaved();
            }
        }
    }

    fn rescale_mean_damage(&mut self, new_mean: f64) {
        let old_mean = self.mean_damage;
        self.mean_damage = new_mean;
        match ratio(new_mean, old_mean) {
            Some(r) if self.damage > 0.0 => {
                self.damage *= r;
                self.scale_after_damage(r);
            }
            _ => self.recompute_from_unsaved(),
        }
    }

    /// Replace the hit probability and scale hits accordingly
    fn set_hit_probability(&mut self, new_p: f64) {
        let new_hits = match ratio(new_p, self.hit_p) {
            Some(r) => self.hits * r,
            None => self.attacks * new_p,
        };
        self.hit_p = new_p;
        self.rescale_hits(new_hits);
    }

    /// Replace the wound probability for hits that roll to wound
    fn set_wound_probability(&mut self, new_p: f64) {
        let rolled = match ratio(new_p, self.wound_p) {
            Some(r) => (self.wounds - self.auto_wounds) * r,
            None => self.wound_rolls * new_p,
        };
        self.wound_p = new_p;
        self.rescale_wounds(rolled + self.auto_wounds);
    }

    fn effective_save_fail(&self) -> f64 {
        if self.bypassed > 0.0 && self.wounds > 0.0 {
            (self.unsaved / self.wounds).clamp(0.0, 1.0)
        } else {
            self.save_fail_p
        }
    }

    fn into_result(self) -> CombatResult {
        let save_fail_probability = self.effective_save_fail();
        CombatResult {
            expected_hits: self.hits,
            expected_wounds: self.wounds,
            expected_unsaved_wounds: self.unsaved,
            expected_damage: self.damage,
            expected_models_removed: self.models,
            hit_probability: self.hit_p,
            wound_probability: self.display_wound_p.unwrap_or(self.wound_p).clamp(0.0, 1.0),
            save_fail_probability,
            kill_probability: self.kill_p.clamp(0.0, 1.0),
        }
    }
}

/// Situational inputs shared by every stage
struct Situation<'a> {
    attack: &'a AttackProfile,
    defense: &'a DefenseProfile,
    range: Option<u32>,
    categories: &'a [String],
    has_cover: bool,
}

impl Situation<'_> {
    fn cover_applies(&self) -> bool {
        self.has_cover || self.attack.has_modifier(&ModifierTag::IndirectFire)
    }
}

/// Largest parameter among the tags selected by `pick`
fn max_param<F>(attack: &AttackProfile, pick: F) -> Option<u32>
where
    F: Fn(&ModifierTag) -> Option<u32>,
{
    attack.modifiers.iter().filter_map(pick).max()
}

/// Blast bonus for a target unit of `model_count` models
pub fn blast_bonus(model_count: u32) -> u32 {
    if model_count <= BLAST_NO_BONUS_MAX_MODELS {
        0
    } else if model_count <= BLAST_SCALED_MAX_MODELS {
        model_count.saturating_sub(BLAST_SCALED_OFFSET)
    } else {
        BLAST_LARGE_UNIT_BONUS
    }
}

/// Attacks added by attack-count tags in this situation
///
/// Repeated rapid fire or extra attacks tags use their largest parameter.
pub fn bonus_attacks(attack: &AttackProfile, defense: &DefenseProfile, range: Option<u32>) -> u32 {
    let rapid_fire = if attack.within_half_range(range) {
        max_param(attack, |tag| match tag {
            ModifierTag::RapidFire(n) => Some(n.unwrap_or(DEFAULT_RAPID_FIRE)),
            _ => None,
        })
        .unwrap_or(0)
    } else {
        0
    };
    let extra = max_param(attack, |tag| match tag {
        ModifierTag::ExtraAttacks(n) => Some(n.unwrap_or(DEFAULT_EXTRA_ATTACKS)),
        _ => None,
    })
    .unwrap_or(0);
    let blast = if attack.has_modifier(&ModifierTag::Blast) {
        blast_bonus(defense.model_count)
    } else {
        0
    };
    rapid_fire + extra + blast
}

/// Flat damage added per unsaved wound in this situation
pub fn bonus_damage(attack: &AttackProfile, range: Option<u32>) -> u32 {
    let in_half_range = attack.within_half_range(range);
    let melta = if in_half_range {
        max_param(attack, |tag| match tag {
            ModifierTag::Melta(n) => Some(n.unwrap_or(DEFAULT_MELTA)),
            _ => None,
        })
        .unwrap_or(0)
    } else {
        0
    };
    let flat = max_param(attack, |tag| match tag {
        ModifierTag::BonusDamage(n) => Some(n.unwrap_or(DEFAULT_BONUS_DAMAGE)),
        _ => None,
    })
    .unwrap_or(0);
    melta + flat
}

/// Save target after cover
///
/// Cover improves the save by one, except for saves of 3+ or better against
/// zero penetration.
pub fn save_with_cover(save: i32, penetration: i32) -> i32 {
    if penetration == 0 && save <= COVER_MIN_SAVE_VS_ZERO_PEN {
        save
    } else {
        save - 1
    }
}

fn attack_count_stage(p: &mut Pipeline, s: &Situation) {
    let bonus = bonus_attacks(s.attack, s.defense, s.range);
    let cover = s.cover_applies();

    if bonus == 0 && !cover {
        return;
    }

    p.attacks = s.attack.attacks as f64 + bonus as f64;
    if cover {
        p.save_fail_p = save_fail_probability(
            save_with_cover(s.defense.save, s.attack.penetration),
            s.attack.penetration,
            s.defense.alt_save,
        );
    }
    tracing::debug!(
        "{}: attack stage, {} bonus attacks, cover {}",
        s.attack.name,
        bonus,
        cover
    );
    p.recompute_all();
}

/// Net hit modifier from heavy (+1) and indirect fire (-1), capped at one step
fn hit_modifier(attack: &AttackProfile) -> i32 {
    let net: i32 = attack
        .modifiers
        .iter()
        .map(|tag| match tag {
            ModifierTag::Heavy => 1,
            ModifierTag::IndirectFire => -1,
            _ => 0,
        })
        .sum();
    net.clamp(-MAX_HIT_MODIFIER, MAX_HIT_MODIFIER)
}

fn hit_stage(p: &mut Pipeline, s: &Situation) {
    let attack = s.attack;

    if attack.has_modifier(&ModifierTag::Torrent) {
        // No hit roll: nothing to re-roll and no critical hits
        p.hit_p = 1.0;
        p.recompute_all();
        tracing::debug!("{}: torrent, {} automatic hits", attack.name, p.hits);
        return;
    }

    let modifier = hit_modifier(attack);
    if modifier != 0 && (2..=6).contains(&attack.skill) {
        let skill = (attack.skill - modifier).clamp(2, 6);
        p.set_hit_probability(hit_probability(skill));
    }

    if attack.has_modifier(&ModifierTag::ReRollHits) {
        p.set_hit_probability(reroll_all(p.hit_p));
    } else if attack.has_modifier(&ModifierTag::ReRollHitOnes) {
        p.set_hit_probability(reroll_ones(p.hit_p));
    }

    let sustained = max_param(attack, |tag| match tag {
        ModifierTag::SustainedHits(n) => Some(n.unwrap_or(DEFAULT_SUSTAINED_HITS)),
        _ => None,
    });
    if let Some(extra) = sustained {
        if p.hit_p > 0.0 {
            let bonus = p.attacks * CRITICAL_PROBABILITY * extra as f64;
            tracing::debug!("{}: sustained hits +{:.3}", attack.name, bonus);
            p.rescale_hits(p.hits + bonus);
        }
    }

    if attack.has_modifier(&ModifierTag::LethalHits) && p.hits > 0.0 {
        let critical = (p.attacks * CRITICAL_PROBABILITY).min(p.hits);
        let normal = p.hits - critical;
        let wounds = normal * p.wound_p + critical;
        tracing::debug!("{}: lethal hits, {:.3} auto-wounds", attack.name, critical);
        p.rescale_wounds(wounds);
        p.wound_rolls = normal;
        p.auto_wounds = critical;
        p.display_wound_p = ratio(p.wounds, p.hits);
    }
}

fn wound_stage(p: &mut Pipeline, s: &Situation) {
    let attack = s.attack;
    let mut changed = false;

    if attack.has_modifier(&ModifierTag::Lance) {
        let needed = wound_roll_needed(attack.power, s.defense.resilience);
        if attack.power > 0 && s.defense.resilience > 0 {
            p.set_wound_probability(d6_success((needed - 1).max(2)));
            changed = true;
        }
    }

    // Best critical-wound chance among anti rules that match this target
    let anti_critical = attack
        .modifiers
        .iter()
        .filter(|tag| tag.matches_category(s.categories))
        .filter_map(|tag| match tag {
            ModifierTag::Anti { threshold, .. } => {
                Some(d6_success(threshold.unwrap_or(DEFAULT_ANTI_THRESHOLD).max(2)))
            }
            _ => None,
        })
        .fold(None, |best: Option<f64>, chance| {
            Some(best.map_or(chance, |b| b.max(chance)))
        });

    if let Some(critical) = anti_critical {
        if critical > p.wound_p {
            p.set_wound_probability(critical);
            changed = true;
        }
    }

    if attack.has_modifier(&ModifierTag::TwinLinked) {
        p.set_wound_probability(reroll_all(p.wound_p));
        changed = true;
    } else if attack.has_modifier(&ModifierTag::ReRollWoundOnes) {
        p.set_wound_probability(reroll_ones(p.wound_p));
        changed = true;
    }

    if changed && p.display_wound_p.is_some() {
        p.display_wound_p = ratio(p.wounds, p.hits);
    }

    let devastating = attack
        .has_modifier(&ModifierTag::DevastatingWounds)
        .then_some(CRITICAL_PROBABILITY);
    let bypass_chance = match (devastating, anti_critical) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    };

    if let Some(critical) = bypass_chance {
        if p.wounds > 0.0 {
            let rolled_wounds = p.wounds - p.auto_wounds;
            let critical_wounds = (p.wound_rolls * critical).min(rolled_wounds).max(0.0);
            let normal = p.wounds - critical_wounds;
            let unsaved = normal * p.save_fail_p + critical_wounds;
            tracing::debug!(
                "{}: {:.3} critical wounds bypass saves",
                attack.name,
                critical_wounds
            );
            p.rescale_unsaved(unsaved);
            p.bypassed = critical_wounds;
        }
    }
}

fn damage_stage(p: &mut Pipeline, s: &Situation) {
    let bonus = bonus_damage(s.attack, s.range);
    if bonus > 0 {
        tracing::debug!("{}: +{} damage per wound", s.attack.name, bonus);
        p.rescale_mean_damage(p.mean_damage + bonus as f64);
    }
}

fn save_stage(p: &mut Pipeline, s: &Situation) {
    let attack = s.attack;
    let extra = max_param(attack, |tag| match tag {
        ModifierTag::Penetrating(n) => Some(n.unwrap_or(DEFAULT_PENETRATING)),
        _ => None,
    })
    .unwrap_or(0);
    let ignores_cover = attack.has_modifier(&ModifierTag::IgnoresCover);

    if extra == 0 && !(ignores_cover && s.cover_applies()) {
        return;
    }

    let penetration = attack.penetration - extra as i32;
    let save = if s.cover_applies() && !ignores_cover {
        save_with_cover(s.defense.save, penetration)
    } else {
        s.defense.save
    };
    let new_fail = save_fail_probability(save, penetration, s.defense.alt_save);

    if (new_fail - p.save_fail_p).abs() > f64::EPSILON {
        let normal = p.wounds - p.bypassed;
        let unsaved = normal * new_fail + p.bypassed;
        tracing::debug!(
            "{}: save fail {:.3} -> {:.3}",
            attack.name,
            p.save_fail_p,
            new_fail
        );
        p.save_fail_p = new_fail;
        p.rescale_unsaved(unsaved);
    }
}

/// Adjust `base` for the tags on `attack`
///
/// `range` is the distance to the target (`None` when unknown or in melee),
/// `categories` are the defender's category keywords and `has_cover` says
/// whether the defender is in cover. With no tags, `base` comes back
/// unchanged.
pub fn apply_modifiers(
    base: &CombatResult,
    attack: &AttackProfile,
    defense: &DefenseProfile,
    range: Option<u32>,
    categories: &[String],
    has_cover: bool,
) -> CombatResult {
    if attack.modifiers.is_empty() {
        return *base;
    }

    let situation = Situation {
        attack,
        defense,
        range,
        categories,
        has_cover,
    };
    let inputs = ChainInputs::from_profiles(attack, defense);
    let mut pipeline = Pipeline::new(base, &inputs);

    attack_count_stage(&mut pipeline, &situation);
    hit_stage(&mut pipeline, &situation);
    wound_stage(&mut pipeline, &situation);
    damage_stage(&mut pipeline, &situation);
    save_stage(&mut pipeline, &situation);

    pipeline.into_result()
}
