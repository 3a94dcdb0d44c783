//! Combat system module
//!
//! Implements d20-style combat with:
//! - Injectable random sources
//! - Dice rolling (e.g., "2d6+3")
//! - Combatant records
//! - Attack resolution with to-hit, criticals, fumbles and damage

mod attack;
mod combatant;
mod dice;
mod random;

pub use attack::{apply_attack, resolve_attack, AttackReport, AttackRoll, CRIT_MULTIPLIER};
pub use combatant::{first_alive, prune_defeated, Combatant, Opponent, Protagonist};
pub use dice::{is_critical, is_fumble, parse_dice, roll, roll_d20, DiceError, DiceRoll};
pub use random::{RandomSource, RngSource, ScriptedRandom};
