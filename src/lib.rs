//! battlesim - round-based dice combat simulator
//!
//! One protagonist fights an ordered roster of opponents. Each round the
//! protagonist strikes the first opponent still standing, the fallen are
//! cleared away, and the survivors strike back, until one side is gone.

pub mod battle;
pub mod combat;
pub mod config;
pub mod roster;

pub use battle::{
    BattleConfig, BattleEngine, BattleError, BattleEvent, BattleOutcome, BattleState, ChannelSink,
    EventSink, RecordingSink, TracingSink,
};
pub use combat::{Combatant, DiceError, Opponent, Protagonist, RandomSource, RngSource, ScriptedRandom};
pub use config::{ConfigError, Settings};
pub use roster::{CombatantRecord, Roster, RosterError};
