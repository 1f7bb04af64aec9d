pub mod constants;
pub mod engine;
pub mod modifiers;
pub mod result;

pub use engine::{combat_result, resolve_chain, ChainInputs};
pub use modifiers::{apply_modifiers, bonus_attacks, bonus_damage};
pub use result::CombatResult;
