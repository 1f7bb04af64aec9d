//! Single-roll d6 success probabilities
//!
//! Pure functions. Out-of-domain inputs never fail: they resolve to a
//! boundary probability (0 or 1) because the legal domain is the closed
//! 2..=6 tabletop range.

/// Chance of rolling the maximum face on a d6
pub const CRITICAL_PROBABILITY: f64 = 1.0 / 6.0;

/// Probability that a d6 rolls `target` or higher
///
/// Targets at or below 1 always succeed, targets above 6 never do.
pub fn d6_success(target: i32) -> f64 {
    if target <= 1 {
        1.0
    } else if target >= 7 {
        0.0
    } else {
        (7 - target) as f64 / 6.0
    }
}

/// Probability of hitting with the given skill (needed roll)
///
/// Skill outside 2..=6 is illegal and yields 0.
pub fn hit_probability(skill: i32) -> f64 {
    if (2..=6).contains(&skill) {
        d6_success(skill)
    } else {
        0.0
    }
}

/// Roll needed to wound, from the power vs resilience comparison
///
/// | comparison                 | needed |
/// |----------------------------|--------|
/// | power >= 2 x resilience    | 2+     |
/// | power > resilience         | 3+     |
/// | power == resilience        | 4+     |
/// | 2 x power > resilience     | 5+     |
/// | otherwise                  | 6+     |
pub fn wound_roll_needed(power: i32, resilience: i32) -> i32 {
    if power >= 2 * resilience {
        2
    } else if power > resilience {
        3
    } else if power == resilience {
        4
    } else if 2 * power > resilience {
        5
    } else {
        6
    }
}

/// Probability of wounding; non-positive power or resilience yields 0
pub fn wound_probability(power: i32, resilience: i32) -> f64 {
    if power <= 0 || resilience <= 0 {
        return 0.0;
    }
    d6_success(wound_roll_needed(power, resilience))
}

/// Effective save target after penetration and the alternate save
///
/// Penetration is non-positive so `save - penetration` never improves the
/// save. The alternate save ignores penetration.
pub fn effective_save(save: i32, penetration: i32, alt_save: Option<i32>) -> i32 {
    let modified = save - penetration;
    modified.min(alt_save.unwrap_or(7))
}

/// Probability that a save fails
pub fn save_fail_probability(save: i32, penetration: i32, alt_save: Option<i32>) -> f64 {
    let effective = effective_save(save, penetration, alt_save);
    if effective > 6 {
        1.0
    } else if effective < 2 {
        0.0
    } else {
        (effective - 1) as f64 / 6.0
    }
}

/// Probability that a mitigation roll negates one point of damage
pub fn mitigation_pass_probability(target: Option<i32>) -> f64 {
    match target {
        Some(t) if (2..=6).contains(&t) => d6_success(t),
        _ => 0.0,
    }
}

/// Success chance when every failed roll is re-rolled
pub fn reroll_all(p: f64) -> f64 {
    p * (2.0 - p)
}

/// Success chance when natural 1s are re-rolled
pub fn reroll_ones(p: f64) -> f64 {
    (p + p * CRITICAL_PROBABILITY).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_hit_probability_table() {
        assert!((hit_probability(2) - 5.0 / 6.0).abs() < EPS);
        assert!((hit_probability(3) - 4.0 / 6.0).abs() < EPS);
        assert!((hit_probability(4) - 3.0 / 6.0).abs() < EPS);
        assert!((hit_probability(5) - 2.0 / 6.0).abs() < EPS);
        assert!((hit_probability(6) - 1.0 / 6.0).abs() < EPS);
    }

    #[test]
    fn test_hit_probability_out_of_range_is_zero() {
        for skill in [-3, 0, 1, 7, 12] {
            assert_eq!(hit_probability(skill), 0.0);
        }
    }

    #[test]
    fn test_wound_table_every_regime() {
        assert_eq!(wound_roll_needed(8, 4), 2);
        assert_eq!(wound_roll_needed(5, 4), 3);
        assert_eq!(wound_roll_needed(4, 4), 4);
        assert_eq!(wound_roll_needed(4, 5), 5);
        assert_eq!(wound_roll_needed(3, 6), 6);
        assert_eq!(wound_roll_needed(4, 8), 6);
    }

    #[test]
    fn test_wound_boundaries_are_exclusive_where_expected() {
        // 2 x power == resilience falls through to 6+
        assert_eq!(wound_roll_needed(3, 6), 6);
        // 2 x power just above resilience is 5+
        assert_eq!(wound_roll_needed(4, 7), 5);
        // power one below double is still 3+
        assert_eq!(wound_roll_needed(7, 4), 3);
    }

    #[test]
    fn test_wound_probability_degenerate_inputs() {
        assert_eq!(wound_probability(0, 4), 0.0);
        assert_eq!(wound_probability(4, 0), 0.0);
    }

    #[test]
    fn test_save_fail_table() {
        assert!((save_fail_probability(3, 0, None) - 2.0 / 6.0).abs() < EPS);
        assert!((save_fail_probability(3, -2, None) - 4.0 / 6.0).abs() < EPS);
        assert!((save_fail_probability(3, -4, Some(4)) - 3.0 / 6.0).abs() < EPS);
        assert!((save_fail_probability(2, 0, Some(4)) - 1.0 / 6.0).abs() < EPS);
        assert_eq!(save_fail_probability(6, -2, None), 1.0);
    }

    #[test]
    fn test_save_better_than_two_never_fails() {
        assert_eq!(save_fail_probability(1, 0, None), 0.0);
    }

    #[test]
    fn test_mitigation_probability() {
        assert_eq!(mitigation_pass_probability(None), 0.0);
        assert!((mitigation_pass_probability(Some(5)) - 2.0 / 6.0).abs() < EPS);
        assert_eq!(mitigation_pass_probability(Some(9)), 0.0);
    }

    #[test]
    fn test_rerolls() {
        assert!((reroll_all(0.5) - 0.75).abs() < EPS);
        assert!((reroll_ones(0.5) - 0.5 * 7.0 / 6.0).abs() < EPS);
        assert_eq!(reroll_ones(1.0), 1.0);
        assert_eq!(reroll_all(1.0), 1.0);
    }
}
