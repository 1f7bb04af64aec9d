pub mod damage;
pub mod probability;

pub use damage::{mean_damage, DamageSpec};
pub use probability::{
    d6_success, effective_save, hit_probability, mitigation_pass_probability, reroll_all,
    reroll_ones, save_fail_probability, wound_probability, wound_roll_needed,
    CRITICAL_PROBABILITY,
};
