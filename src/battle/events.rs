//! Battle event sinks
//!
//! The engine reports through three one-way channels: free-form status
//! narration, the protagonist's death, and the end of a won battle. Hosts
//! decide what to do with them (log lines, UI updates, broadcasts).

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Receiver of battle narration
pub trait EventSink {
    /// Round start, attack narration, opponent defeated
    fn status(&mut self, narration: &str);

    /// Fired once when the battle ends in defeat
    fn protagonist_died(&mut self, summary: &str);

    /// Fired once when every opponent is down
    fn battle_ended(&mut self, summary: &str);
}

impl<T: EventSink + ?Sized> EventSink for &mut T {
    fn status(&mut self, narration: &str) {
        (**self).status(narration)
    }

    fn protagonist_died(&mut self, summary: &str) {
        (**self).protagonist_died(summary)
    }

    fn battle_ended(&mut self, summary: &str) {
        (**self).battle_ended(summary)
    }
}

impl<T: EventSink + ?Sized> EventSink for Box<T> {
    fn status(&mut self, narration: &str) {
        (**self).status(narration)
    }

    fn protagonist_died(&mut self, summary: &str) {
        (**self).protagonist_died(summary)
    }

    fn battle_ended(&mut self, summary: &str) {
        (**self).battle_ended(summary)
    }
}

/// One emitted event, tagged by channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "text", rename_all = "snake_case")]
pub enum BattleEvent {
    Status(String),
    ProtagonistDied(String),
    BattleEnded(String),
}

impl BattleEvent {
    pub fn text(&self) -> &str {
        match self {
            BattleEvent::Status(s) | BattleEvent::ProtagonistDied(s) | BattleEvent::BattleEnded(s) => {
                s.as_str()
            }
        }
    }

    /// Whether this event closes the battle
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BattleEvent::Status(_))
    }
}

/// Writes every event to the tracing subscriber
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn status(&mut self, narration: &str) {
        info!("{}", narration);
    }

    fn protagonist_died(&mut self, summary: &str) {
        warn!("{}", summary);
    }

    fn battle_ended(&mut self, summary: &str) {
        info!("{}", summary);
    }
}

/// Keeps every event in memory
///
/// Clones share the same log, so a host can hand one clone to the engine and
/// read the events back through another.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<BattleEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every event so far, in emission order
    pub fn events(&self) -> Vec<BattleEvent> {
        self.events.lock().clone()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                BattleEvent::Status(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn deaths(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                BattleEvent::ProtagonistDied(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn endings(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                BattleEvent::BattleEnded(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    fn push(&self, event: BattleEvent) {
        self.events.lock().push(event);
    }
}

impl EventSink for RecordingSink {
    fn status(&mut self, narration: &str) {
        self.push(BattleEvent::Status(narration.to_string()));
    }

    fn protagonist_died(&mut self, summary: &str) {
        self.push(BattleEvent::ProtagonistDied(summary.to_string()));
    }

    fn battle_ended(&mut self, summary: &str) {
        self.push(BattleEvent::BattleEnded(summary.to_string()));
    }
}

/// Forwards events over a tokio channel
///
/// Sends to a closed receiver are dropped; a host that stops listening does
/// not stop the battle.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<BattleEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver that drains it
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<BattleEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn new(tx: mpsc::UnboundedSender<BattleEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, event: BattleEvent) {
        let _ = self.tx.send(event);
    }
}

impl EventSink for ChannelSink {
    fn status(&mut self, narration: &str) {
        self.send(BattleEvent::Status(narration.to_string()));
    }

    fn protagonist_died(&mut self, summary: &str) {
        self.send(BattleEvent::ProtagonistDied(summary.to_string()));
    }

    fn battle_ended(&mut self, summary: &str) {
        self.send(BattleEvent::BattleEnded(summary.to_string()));
    }
}
