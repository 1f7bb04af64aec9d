pub mod attack;
pub mod defense;
pub mod modifier;

pub use attack::AttackProfile;
pub use defense::DefenseProfile;
pub use modifier::{parse_modifiers, ModifierSet, ModifierStage, ModifierTag};
