//! Battle loop
//!
//! Drives rounds between one protagonist and an ordered roster of opponents
//! until every opponent is down or the protagonist dies.
//!
//! Each round:
//! 1. the protagonist attacks the first opponent still standing
//! 2. defeated opponents are pruned (survivor order is kept)
//! 3. if none remain the battle is won
//! 4. every remaining opponent attacks the protagonist, in order, stopping as
//!    soon as the protagonist drops
//! 5. if the protagonist is down the battle is lost
//! 6. otherwise the loop pauses for the turn delay and starts the next round

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::events::EventSink;
use crate::combat::{
    apply_attack, first_alive, prune_defeated, DiceError, Opponent, Protagonist, RandomSource,
};

/// Default pause between rounds
pub const DEFAULT_TURN_DELAY: Duration = Duration::from_millis(1200);

/// Pacing for a battle run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BattleConfig {
    /// Pause between rounds (zero resolves the battle without sleeping)
    pub turn_delay: Duration,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            turn_delay: DEFAULT_TURN_DELAY,
        }
    }
}

impl BattleConfig {
    pub fn with_delay(turn_delay: Duration) -> Self {
        Self { turn_delay }
    }

    /// No pause between rounds
    pub fn immediate() -> Self {
        Self::with_delay(Duration::ZERO)
    }
}

/// Where a battle is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleState {
    NotStarted,
    RoundInProgress,
    Victory,
    Defeat,
    /// Stopped by the host between rounds
    Cancelled,
    /// Stopped by an error mid-round
    Aborted,
}

impl BattleState {
    /// Whether the battle can no longer change
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BattleState::NotStarted | BattleState::RoundInProgress)
    }
}

/// How a battle run finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BattleOutcome {
    Victory { rounds: u32 },
    Defeat { rounds: u32 },
    Cancelled { rounds: u32 },
}

impl BattleOutcome {
    pub fn rounds(&self) -> u32 {
        match *self {
            BattleOutcome::Victory { rounds }
            | BattleOutcome::Defeat { rounds }
            | BattleOutcome::Cancelled { rounds } => rounds,
        }
    }
}

/// Battle errors
#[derive(Debug, Error)]
pub enum BattleError {
    #[error("battle aborted: {0}")]
    Dice(#[from] DiceError),

    #[error("battle already finished ({0:?})")]
    AlreadyFinished(BattleState),
}

/// Result of waiting out the turn delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pause {
    Elapsed,
    Cancelled,
}

/// A single battle session
///
/// The engine owns the combatants, the event sink and the random source for
/// as long as the battle runs. Use [`BattleEngine::into_parts`] to get them
/// back afterwards.
pub struct BattleEngine<S, R> {
    id: Uuid,
    protagonist: Protagonist,
    opponents: Vec<Opponent>,
    sink: S,
    rng: R,
    round: u32,
    state: BattleState,
}

impl<S: EventSink, R: RandomSource> BattleEngine<S, R> {
    /// Create a battle that has not started yet
    pub fn new(protagonist: Protagonist, opponents: Vec<Opponent>, sink: S, rng: R) -> Self {
        Self {
            id: Uuid::new_v4(),
            protagonist,
            opponents,
            sink,
            rng,
            round: 0,
            state: BattleState::NotStarted,
        }
    }

    /// Session id, attached to every log line of this battle
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Rounds started so far
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn state(&self) -> BattleState {
        self.state
    }

    pub fn protagonist(&self) -> &Protagonist {
        &self.protagonist
    }

    /// Opponents still in the fight, in turn order
    pub fn opponents(&self) -> &[Opponent] {
        &self.opponents
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Hand back the combatants, sink and random source
    pub fn into_parts(self) -> (Protagonist, Vec<Opponent>, S, R) {
        (self.protagonist, self.opponents, self.sink, self.rng)
    }

    /// Run to a terminal state with no way to cancel
    pub async fn run(&mut self, config: &BattleConfig) -> Result<BattleOutcome, BattleError> {
        let (_never_cancel, cancel) = watch::channel(false);
        self.run_until_cancelled(config, cancel).await
    }

    /// Run to a terminal state, or until `cancel` turns `true`
    ///
    /// Cancellation is observed before the first round and during the pause
    /// between rounds. A cancelled battle emits nothing further and fires
    /// neither terminal sink.
    pub async fn run_until_cancelled(
        &mut self,
        config: &BattleConfig,
        cancel: watch::Receiver<bool>,
    ) -> Result<BattleOutcome, BattleError> {
        if self.state.is_terminal() {
            return Err(BattleError::AlreadyFinished(self.state));
        }

        let span = info_span!("battle", id = %self.id);
        self.drive(config, cancel).instrument(span).await
    }

    async fn drive(
        &mut self,
        config: &BattleConfig,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<BattleOutcome, BattleError> {
        if *cancel.borrow() {
            return Ok(self.cancel());
        }

        loop {
            if let Some(outcome) = self.step()? {
                return Ok(outcome);
            }

            if pause(config.turn_delay, &mut cancel).await == Pause::Cancelled {
                return Ok(self.cancel());
            }
        }
    }

    /// Play exactly one round
    ///
    /// Returns the outcome if the round ended the battle. A dice error aborts
    /// the battle: the state becomes [`BattleState::Aborted`] and no further
    /// rounds can run.
    pub fn step(&mut self) -> Result<Option<BattleOutcome>, BattleError> {
        match self.state {
            BattleState::NotStarted => self.begin(),
            BattleState::RoundInProgress => {}
            state => return Err(BattleError::AlreadyFinished(state)),
        }

        self.play_round().map_err(|e| {
            warn!(round = self.round, error = %e, "battle aborted");
            self.state = BattleState::Aborted;
            BattleError::from(e)
        })
    }

    fn begin(&mut self) {
        info!(
            protagonist = self.protagonist.id(),
            opponents = self.opponents.len(),
            "battle started"
        );
        self.state = BattleState::RoundInProgress;

        let names: Vec<&str> = self.opponents.iter().map(|o| o.name()).collect();
        self.sink.status(&format!(
            "Battle started: {} vs {}",
            self.protagonist.name(),
            names.join(", ")
        ));
    }

    fn play_round(&mut self) -> Result<Option<BattleOutcome>, DiceError> {
        self.round += 1;
        debug!(round = self.round, "round started");
        self.sink.status(&format!("=== Round {} ===", self.round));

        self.protagonist_phase()?;

        let pruned = prune_defeated(&mut self.opponents);
        if pruned > 0 {
            debug!(pruned, remaining = self.opponents.len(), "opponents pruned");
        }

        if self.opponents.is_empty() {
            self.state = BattleState::Victory;
            info!(rounds = self.round, "battle won");
            self.sink.battle_ended(&format!(
                "All enemies were defeated in round {}. Victory!",
                self.round
            ));
            return Ok(Some(BattleOutcome::Victory { rounds: self.round }));
        }

        self.opponent_phase()?;

        if self.protagonist.is_dead() {
            self.state = BattleState::Defeat;
            info!(rounds = self.round, "battle lost");
            self.sink.protagonist_died(&format!(
                "{} died in round {}.",
                self.protagonist.name(),
                self.round
            ));
            return Ok(Some(BattleOutcome::Defeat { rounds: self.round }));
        }

        Ok(None)
    }

    fn protagonist_phase(&mut self) -> Result<(), DiceError> {
        let Some(target) = first_alive(&mut self.opponents) else {
            return Ok(());
        };

        if self.protagonist.is_dead() {
            self.sink.status(&format!(
                "{} is dead and cannot attack.",
                self.protagonist.name()
            ));
            return Ok(());
        }

        let report = apply_attack(&mut self.rng, &self.protagonist, target)?;
        self.sink.status(&report.to_string());
        if report.defeated_defender() {
            self.sink.status(&format!("{} was defeated!", report.defender));
        }

        Ok(())
    }

    fn opponent_phase(&mut self) -> Result<(), DiceError> {
        for (turn, opponent) in self.opponents.iter().enumerate() {
            let report = apply_attack(&mut self.rng, opponent, &mut self.protagonist)?;
            self.sink.status(&report.to_string());

            if self.protagonist.is_dead() {
                debug!(
                    skipped = self.opponents.len() - turn - 1,
                    "protagonist down, remaining opponents skip their turn"
                );
                break;
            }
        }

        Ok(())
    }

    fn cancel(&mut self) -> BattleOutcome {
        self.state = BattleState::Cancelled;
        info!(rounds = self.round, "battle cancelled");
        BattleOutcome::Cancelled { rounds: self.round }
    }
}

/// Wait out the turn delay unless the battle is cancelled first
///
/// A dropped sender can never cancel, so the delay then runs to completion.
async fn pause(delay: Duration, cancel: &mut watch::Receiver<bool>) -> Pause {
    if delay.is_zero() {
        tokio::task::yield_now().await;
    } else {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => break,
                changed = cancel.changed() => {
                    if changed.is_err() {
                        (&mut sleep).await;
                        break;
                    }
                    if *cancel.borrow() {
                        return Pause::Cancelled;
                    }
                }
            }
        }
    }

    if *cancel.borrow() {
        Pause::Cancelled
    } else {
        Pause::Elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::events::RecordingSink;
    use crate::combat::{Combatant, ScriptedRandom};

    fn hero() -> Combatant {
        Combatant::new("hero1", "Adventurer", 12, 3, 12, "1d6+1")
    }

    fn goblin() -> Combatant {
        Combatant::new("gob1", "Goblin", 6, 2, 10, "1d4")
    }

    fn rat() -> Combatant {
        Combatant::new("rat1", "Giant Rat", 4, 1, 9, "1d3")
    }

    #[test]
    fn test_state_terminal() {
        assert!(!BattleState::NotStarted.is_terminal());
        assert!(!BattleState::RoundInProgress.is_terminal());
        assert!(BattleState::Victory.is_terminal());
        assert!(BattleState::Defeat.is_terminal());
        assert!(BattleState::Cancelled.is_terminal());
        assert!(BattleState::Aborted.is_terminal());
    }

    #[test]
    fn test_step_single_round_victory() {
        let sink = RecordingSink::new();
        let mut engine = BattleEngine::new(
            hero(),
            vec![goblin()],
            sink.clone(),
            ScriptedRandom::always_max(),
        );
        assert_eq!(engine.state(), BattleState::NotStarted);

        let outcome = engine.step().unwrap();
        assert_eq!(outcome, Some(BattleOutcome::Victory { rounds: 1 }));
        assert_eq!(engine.state(), BattleState::Victory);
        assert!(engine.opponents().is_empty());
        assert_eq!(engine.protagonist().hp(), 12);

        assert_eq!(
            sink.statuses(),
            vec![
                "Battle started: Adventurer vs Goblin",
                "=== Round 1 ===",
                "Adventurer landed a critical hit on Goblin for 14 damage. (0/6 HP)",
                "Goblin was defeated!",
            ]
        );
        assert_eq!(sink.endings(), vec!["All enemies were defeated in round 1. Victory!"]);
        assert!(sink.deaths().is_empty());
    }

    #[test]
    fn test_step_after_finish_is_rejected() {
        let mut engine = BattleEngine::new(
            hero(),
            vec![goblin()],
            RecordingSink::new(),
            ScriptedRandom::always_max(),
        );
        engine.step().unwrap();
        assert!(matches!(
            engine.step(),
            Err(BattleError::AlreadyFinished(BattleState::Victory))
        ));
    }

    #[test]
    fn test_round_with_survivors_continues() {
        // Hero: d20 2 misses. Goblin: d20 2 misses. Rat: d20 2 misses.
        let sink = RecordingSink::new();
        let mut engine = BattleEngine::new(
            hero(),
            vec![goblin(), rat()],
            sink.clone(),
            ScriptedRandom::new([2, 2, 2]),
        );

        assert_eq!(engine.step().unwrap(), None);
        assert_eq!(engine.state(), BattleState::RoundInProgress);
        assert_eq!(engine.round(), 1);
        assert_eq!(
            sink.statuses()[2..],
            [
                "Adventurer attacked Goblin and missed.",
                "Goblin attacked Adventurer and missed.",
                "Giant Rat attacked Adventurer and missed.",
            ]
        );
    }

    #[test]
    fn test_pruned_opponent_does_not_act() {
        // Hero kills the goblin with a crit; the rat then misses
        let sink = RecordingSink::new();
        let mut engine = BattleEngine::new(
            hero(),
            vec![goblin(), rat()],
            sink.clone(),
            ScriptedRandom::new([20, 6, 2]),
        );

        assert_eq!(engine.step().unwrap(), None);
        let ids: Vec<&str> = engine.opponents().iter().map(|o| o.id()).collect();
        assert_eq!(ids, vec!["rat1"]);
        assert!(engine.opponents().iter().all(|o| !o.is_dead()));
        assert!(sink
            .statuses()
            .iter()
            .all(|s| !s.starts_with("Goblin attacked")));
    }

    #[test]
    fn test_dead_opponents_are_never_targeted() {
        let sink = RecordingSink::new();
        let mut engine = BattleEngine::new(
            hero(),
            vec![goblin().with_hp(0), rat()],
            sink.clone(),
            ScriptedRandom::new([2, 2]),
        );

        engine.step().unwrap();
        assert_eq!(sink.statuses()[2], "Adventurer attacked Giant Rat and missed.");
        assert_eq!(engine.opponents().len(), 1);
    }

    #[test]
    fn test_incapacitated_protagonist() {
        let sink = RecordingSink::new();
        let mut engine = BattleEngine::new(
            hero().with_hp(0),
            vec![goblin()],
            sink.clone(),
            ScriptedRandom::always_min(),
        );

        let outcome = engine.step().unwrap();
        assert_eq!(outcome, Some(BattleOutcome::Defeat { rounds: 1 }));
        assert_eq!(sink.statuses()[2], "Adventurer is dead and cannot attack.");
        assert_eq!(engine.opponents()[0].hp(), 6);
        assert_eq!(sink.deaths(), vec!["Adventurer died in round 1."]);
    }

    #[test]
    fn test_empty_roster_wins_immediately() {
        let sink = RecordingSink::new();
        let mut engine = BattleEngine::new(hero(), vec![], sink.clone(), ScriptedRandom::always_min());

        assert_eq!(engine.step().unwrap(), Some(BattleOutcome::Victory { rounds: 1 }));
        assert_eq!(sink.statuses(), vec!["Battle started: Adventurer vs ", "=== Round 1 ==="]);
        assert_eq!(sink.endings().len(), 1);
    }

    #[test]
    fn test_dice_error_aborts() {
        let broken = Combatant::new("hero1", "Adventurer", 12, 3, 12, "one d six");
        let sink = RecordingSink::new();
        let mut engine = BattleEngine::new(broken, vec![goblin()], sink.clone(), ScriptedRandom::always_max());

        let err = engine.step().unwrap_err();
        assert!(matches!(
            err,
            BattleError::Dice(DiceError::MalformedExpression(ref s)) if s == "one d six"
        ));
        assert_eq!(engine.state(), BattleState::Aborted);
        assert!(sink.endings().is_empty());
        assert!(sink.deaths().is_empty());
        assert!(matches!(
            engine.step(),
            Err(BattleError::AlreadyFinished(BattleState::Aborted))
        ));
    }

    #[tokio::test]
    async fn test_run_to_completion() {
        let sink = RecordingSink::new();
        let mut engine = BattleEngine::new(
            hero(),
            vec![goblin(), rat()],
            sink.clone(),
            ScriptedRandom::always_max(),
        );

        let outcome = engine.run(&BattleConfig::immediate()).await.unwrap();
        assert_eq!(outcome, BattleOutcome::Victory { rounds: 2 });
        assert_eq!(sink.endings().len(), 1);

        let (hero, opponents, _, _) = engine.into_parts();
        assert!(opponents.is_empty());
        // The rat crits once in round 1: 1d3 max 3, doubled
        assert_eq!(hero.hp(), 6);
    }

    #[tokio::test]
    async fn test_run_finished_engine() {
        let mut engine = BattleEngine::new(
            hero(),
            vec![goblin()],
            RecordingSink::new(),
            ScriptedRandom::always_max(),
        );
        engine.run(&BattleConfig::immediate()).await.unwrap();
        assert!(matches!(
            engine.run(&BattleConfig::immediate()).await,
            Err(BattleError::AlreadyFinished(BattleState::Victory))
        ));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let sink = RecordingSink::new();
        let mut engine = BattleEngine::new(
            hero(),
            vec![goblin()],
            sink.clone(),
            ScriptedRandom::always_max(),
        );
        let (_tx, rx) = watch::channel(true);

        let outcome = engine
            .run_until_cancelled(&BattleConfig::immediate(), rx)
            .await
            .unwrap();
        assert_eq!(outcome, BattleOutcome::Cancelled { rounds: 0 });
        assert_eq!(engine.state(), BattleState::Cancelled);
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_pause_elapses_without_cancel() {
        let (_tx, mut rx) = watch::channel(false);
        assert_eq!(pause(Duration::from_millis(5), &mut rx).await, Pause::Elapsed);
        assert_eq!(pause(Duration::ZERO, &mut rx).await, Pause::Elapsed);
    }

    #[tokio::test]
    async fn test_pause_survives_dropped_sender() {
        let (tx, mut rx) = watch::channel(false);
        drop(tx);
        assert_eq!(pause(Duration::from_millis(5), &mut rx).await, Pause::Elapsed);
    }

    #[tokio::test]
    async fn test_pause_interrupted() {
        let (tx, mut rx) = watch::channel(false);
        let waiter = tokio::spawn(async move { pause(Duration::from_secs(600), &mut rx).await });
        tx.send(true).unwrap();
        assert_eq!(waiter.await.unwrap(), Pause::Cancelled);
    }
}
