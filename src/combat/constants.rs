//! Modifier defaults and thresholds - all tunable values in one place
//!
//! A tag written without its parameter ("Sustained Hits") uses these.

// Attack-count stage
pub const DEFAULT_RAPID_FIRE: u32 = 1;
pub const DEFAULT_EXTRA_ATTACKS: u32 = 1;

// Blast scaling by target unit size
pub const BLAST_NO_BONUS_MAX_MODELS: u32 = 5;
pub const BLAST_SCALED_MAX_MODELS: u32 = 10;
pub const BLAST_SCALED_OFFSET: u32 = 6;
pub const BLAST_LARGE_UNIT_BONUS: u32 = 3;

// Hit stage
pub const DEFAULT_SUSTAINED_HITS: u32 = 1;
/// Net hit-roll modifiers never exceed one step either way
pub const MAX_HIT_MODIFIER: i32 = 1;

// Wound stage
pub const DEFAULT_ANTI_THRESHOLD: i32 = 4;

// Damage stage
pub const DEFAULT_MELTA: u32 = 2;
pub const DEFAULT_BONUS_DAMAGE: u32 = 1;

// Save stage
pub const DEFAULT_PENETRATING: u32 = 1;
/// Cover does not help saves this good or better against zero penetration
pub const COVER_MIN_SAVE_VS_ZERO_PEN: i32 = 3;
