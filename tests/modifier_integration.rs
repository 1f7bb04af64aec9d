//! Modifier processor integration tests
//!
//! Laws the processor must keep whatever the tag mix: identity for an
//! empty set, monotonicity of the additive rules, exact torrent hits and
//! bounded outputs.

use mathhammer::profile::parse_modifiers;
use mathhammer::{
    apply_modifiers, combat_result, AttackProfile, CombatResult, DefenseProfile, ModifierTag,
};
use proptest::prelude::*;

fn apply(attack: &AttackProfile, defense: &DefenseProfile) -> (CombatResult, CombatResult) {
    let base = combat_result(attack, defense);
    let modified = apply_modifiers(&base, attack, defense, None, &defense.categories, false);
    (base, modified)
}

#[test]
fn test_empty_set_is_identity_for_presets() {
    let attacks = [
        AttackProfile::test_rifle(),
        AttackProfile::test_lascannon(),
        AttackProfile::test_chainsword(),
    ];
    let defenses = [
        DefenseProfile::test_infantry(),
        DefenseProfile::test_tank(),
        DefenseProfile::test_elite(),
    ];
    for attack in &attacks {
        for defense in &defenses {
            let base = combat_result(attack, defense);
            for cover in [false, true] {
                let result =
                    apply_modifiers(&base, attack, defense, Some(10), &defense.categories, cover);
                assert!(result.approx_eq(&base, 1e-12));
            }
        }
    }
}

#[test]
fn test_torrent_is_exact() {
    let attack = AttackProfile::new("Heavy Flamer", 7, 5, 5, -1, "1")
        .with_modifier(ModifierTag::Torrent);
    let (_, result) = apply(&attack, &DefenseProfile::test_infantry());
    assert_eq!(result.hit_probability, 1.0);
    assert_eq!(result.expected_hits, 7.0);
}

#[test]
fn test_torrent_ignores_critical_hit_rules() {
    let torrent = AttackProfile::new("Flamer", 6, 4, 4, 0, "1").with_modifier(ModifierTag::Torrent);
    let with_crits = torrent
        .clone()
        .with_modifiers([ModifierTag::SustainedHits(Some(2)), ModifierTag::LethalHits]);
    let defense = DefenseProfile::test_infantry();

    let (_, plain) = apply(&torrent, &defense);
    let (_, boosted) = apply(&with_crits, &defense);

    assert!(boosted.approx_eq(&plain, 1e-12));
}

#[test]
fn test_lethal_and_sustained_stack_in_fixed_order() {
    let attack = AttackProfile::test_chainsword()
        .with_modifiers([ModifierTag::LethalHits, ModifierTag::SustainedHits(Some(1))]);
    let defense = DefenseProfile::test_infantry();
    let (base, result) = apply(&attack, &defense);

    // Sustained first: 4 attacks x 1/6 extra hits
    let hits = base.expected_hits + 4.0 / 6.0;
    assert!((result.expected_hits - hits).abs() < 1e-9);

    // Then lethal: criticals come out of the boosted hit pool
    let critical = 4.0 / 6.0;
    let wounds = (hits - critical) * 0.5 + critical;
    assert!((result.expected_wounds - wounds).abs() < 1e-9);
}

#[test]
fn test_blast_against_unit_sizes() {
    let attack = AttackProfile::new("Frag Missile", 4, 4, 4, 0, "1")
        .with_range(48)
        .with_modifier(ModifierTag::Blast);

    for (models, bonus) in [(5, 0.0), (8, 2.0), (10, 4.0), (15, 3.0)] {
        let defense = DefenseProfile::test_infantry().with_models(models);
        let (_, result) = apply(&attack, &defense);
        assert!(
            (result.expected_hits - (4.0 + bonus) * 0.5).abs() < 1e-9,
            "{} models",
            models
        );
    }
}

#[test]
fn test_stacked_rapid_fire_counts_once() {
    let attack = AttackProfile::test_rifle()
        .with_modifiers([ModifierTag::RapidFire(Some(1)), ModifierTag::RapidFire(Some(2))]);
    let defense = DefenseProfile::test_infantry();
    let base = combat_result(&attack, &defense);
    let result = apply_modifiers(&base, &attack, &defense, Some(12), &[], false);

    // 2 base attacks plus the larger rapid fire value
    assert!((result.expected_hits - 4.0 * 4.0 / 6.0).abs() < 1e-9);
}

#[test]
fn test_indirect_fire_penalizes_and_grants_cover() {
    let attack = AttackProfile::new("Mortar", 6, 4, 5, -1, "1")
        .with_range(48)
        .with_modifier(ModifierTag::IndirectFire);
    let defense = DefenseProfile::test_infantry();
    let (base, result) = apply(&attack, &defense);

    assert!((result.hit_probability - 2.0 / 6.0).abs() < 1e-12);
    assert!(result.save_fail_probability < base.save_fail_probability);

    let ignoring = attack.clone().with_modifier(ModifierTag::IgnoresCover);
    let (_, ignored) = apply(&ignoring, &defense);
    assert!((ignored.save_fail_probability - base.save_fail_probability).abs() < 1e-12);
}

#[test]
fn test_alternate_save_caps_penetrating() {
    let attack = AttackProfile::test_lascannon().with_modifier(ModifierTag::Penetrating(Some(3)));
    let defense = DefenseProfile::test_elite();
    let (base, result) = apply(&attack, &defense);

    // The 4+ alternate save was already the better one
    assert_eq!(result.save_fail_probability, base.save_fail_probability);
    assert!(result.approx_eq(&base, 1e-12));
}

#[test]
fn test_parsed_tags_match_constructed_tags() {
    let parsed = parse_modifiers(["Sustained Hits 2", "Anti-Vehicle 4+", "Twin-linked"]).unwrap();
    let built = AttackProfile::test_rifle().with_modifiers([
        ModifierTag::SustainedHits(Some(2)),
        ModifierTag::Anti {
            keyword: "vehicle".into(),
            threshold: Some(4),
        },
        ModifierTag::TwinLinked,
    ]);
    assert_eq!(parsed, built.modifiers);

    let tank = DefenseProfile::test_tank();
    let from_text = AttackProfile::test_rifle().with_modifiers(parsed);
    let (_, a) = apply(&from_text, &tank);
    let (_, b) = apply(&built, &tank);
    assert_eq!(a, b);
}

#[test]
fn test_damage_bonus_within_melta_range_only_scales_damage() {
    let attack = AttackProfile::new("Multi-melta", 2, 4, 9, -4, "d6")
        .with_range(18)
        .with_modifiers([ModifierTag::Melta(Some(2)), ModifierTag::BonusDamage(Some(1))]);
    let tank = DefenseProfile::test_tank();
    let base = combat_result(&attack, &tank);

    let close = apply_modifiers(&base, &attack, &tank, Some(9), &[], false);
    let far = apply_modifiers(&base, &attack, &tank, Some(10), &[], false);

    assert_eq!(close.expected_unsaved_wounds, base.expected_unsaved_wounds);
    assert!((close.expected_damage - base.expected_unsaved_wounds * 6.5).abs() < 1e-9);
    assert!((far.expected_damage - base.expected_unsaved_wounds * 4.5).abs() < 1e-9);
}

fn any_tag() -> impl Strategy<Value = ModifierTag> {
    prop_oneof![
        proptest::option::of(1u32..4).prop_map(ModifierTag::RapidFire),
        Just(ModifierTag::Blast),
        proptest::option::of(1u32..4).prop_map(ModifierTag::ExtraAttacks),
        Just(ModifierTag::Torrent),
        Just(ModifierTag::Heavy),
        Just(ModifierTag::IndirectFire),
        Just(ModifierTag::ReRollHits),
        Just(ModifierTag::ReRollHitOnes),
        proptest::option::of(1u32..4).prop_map(ModifierTag::SustainedHits),
        Just(ModifierTag::LethalHits),
        Just(ModifierTag::Lance),
        Just(ModifierTag::TwinLinked),
        Just(ModifierTag::ReRollWoundOnes),
        Just(ModifierTag::DevastatingWounds),
        (prop::sample::select(vec!["infantry", "vehicle"]), proptest::option::of(2i32..=6))
            .prop_map(|(k, t)| ModifierTag::Anti {
                keyword: k.to_string(),
                threshold: t
            }),
        proptest::option::of(1u32..4).prop_map(ModifierTag::Melta),
        proptest::option::of(1u32..3).prop_map(ModifierTag::BonusDamage),
        Just(ModifierTag::IgnoresCover),
        proptest::option::of(1u32..3).prop_map(ModifierTag::Penetrating),
        Just(ModifierTag::Assault),
        Just(ModifierTag::Pistol),
        Just(ModifierTag::Precision),
        Just(ModifierTag::Hazardous),
    ]
}

proptest! {
    #[test]
    fn prop_empty_set_is_identity(
        attacks in 0u32..40,
        skill in 0i32..8,
        power in 1i32..14,
        penetration in -4i32..=0,
        resilience in 1i32..14,
        save in 2i32..=6,
        range in proptest::option::of(0u32..48),
        cover in any::<bool>(),
    ) {
        let attack = AttackProfile::new("A", attacks, skill, power, penetration, "d6");
        let defense = DefenseProfile::new("D", resilience, save, 2, 5);
        let base = combat_result(&attack, &defense);
        let result = apply_modifiers(&base, &attack, &defense, range, &[], cover);
        prop_assert_eq!(result, base);
    }

    #[test]
    fn prop_lethal_hits_never_lower_wounds(
        attacks in 1u32..40,
        skill in 2i32..=6,
        power in 1i32..14,
        resilience in 1i32..14,
    ) {
        let plain = AttackProfile::new("A", attacks, skill, power, 0, "1");
        let lethal = plain.clone().with_modifier(ModifierTag::LethalHits);
        let defense = DefenseProfile::new("D", resilience, 4, 1, 10);

        let (base, _) = apply(&plain, &defense);
        let (_, result) = apply(&lethal, &defense);
        prop_assert!(result.expected_wounds >= base.expected_wounds - 1e-9);
    }

    #[test]
    fn prop_sustained_hits_never_lower_hits(
        attacks in 1u32..40,
        skill in 2i32..=6,
        extra in proptest::option::of(1u32..4),
    ) {
        let plain = AttackProfile::new("A", attacks, skill, 4, 0, "1");
        let sustained = plain.clone().with_modifier(ModifierTag::SustainedHits(extra));
        let defense = DefenseProfile::test_infantry();

        let (base, _) = apply(&plain, &defense);
        let (_, result) = apply(&sustained, &defense);
        prop_assert!(result.expected_hits >= base.expected_hits);
        prop_assert!(result.expected_wounds >= base.expected_wounds - 1e-9);
    }

    #[test]
    fn prop_any_tag_mix_stays_bounded(
        tags in proptest::collection::vec(any_tag(), 0..8),
        attacks in 0u32..30,
        skill in 1i32..8,
        range in proptest::option::of(0u32..36),
        cover in any::<bool>(),
        models in 1u32..25,
    ) {
        let attack = AttackProfile::new("A", attacks, skill, 5, -1, "d3")
            .with_range(24)
            .with_modifiers(tags);
        let defense = DefenseProfile::test_infantry().with_models(models);
        let base = combat_result(&attack, &defense);
        let r = apply_modifiers(&base, &attack, &defense, range, &defense.categories, cover);

        for v in [r.expected_hits, r.expected_wounds, r.expected_unsaved_wounds,
                  r.expected_damage, r.expected_models_removed] {
            prop_assert!(v.is_finite() && v >= 0.0, "value {}", v);
        }
        for p in [r.hit_probability, r.wound_probability, r.save_fail_probability, r.kill_probability] {
            prop_assert!((0.0..=1.0).contains(&p), "probability {}", p);
        }
        prop_assert!(r.expected_unsaved_wounds <= r.expected_wounds + 1e-9);
    }
}
