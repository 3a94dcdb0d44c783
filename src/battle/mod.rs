//! Battle sessions
//!
//! - The round loop and its state machine
//! - Event sinks the loop reports through

mod engine;
mod events;

pub use engine::{
    BattleConfig, BattleEngine, BattleError, BattleOutcome, BattleState, DEFAULT_TURN_DELAY,
};
pub use events::{BattleEvent, ChannelSink, EventSink, RecordingSink, TracingSink};
