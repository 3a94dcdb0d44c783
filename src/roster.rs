//! Combatant rosters
//!
//! Hosts describe combatants as plain records (from a config file, the
//! environment or code). Records are validated once, here, before a battle
//! is built from them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::combat::{parse_dice, Combatant, DiceError, Opponent, Protagonist};

/// Roster validation errors
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("combatant '{id}' has invalid damage dice: {source}")]
    InvalidDice {
        id: String,
        #[source]
        source: DiceError,
    },

    #[error("combatant '{id}' has invalid hit points ({hp}/{max_hp})")]
    InvalidHitPoints { id: String, hp: i32, max_hp: i32 },

    #[error("roster has no opponents")]
    NoOpponents,
}

/// A combatant as written in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatantRecord {
    pub id: String,
    pub name: String,
    /// Starting hit points (defaults to `max_hp`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hp: Option<i32>,
    pub max_hp: i32,
    pub attack_bonus: i32,
    pub armor_class: i32,
    pub damage_dice: String,
}

impl CombatantRecord {
    pub fn new(
        id: &str,
        name: &str,
        max_hp: i32,
        attack_bonus: i32,
        armor_class: i32,
        damage_dice: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            hp: None,
            max_hp,
            attack_bonus,
            armor_class,
            damage_dice: damage_dice.to_string(),
        }
    }
}

impl TryFrom<CombatantRecord> for Combatant {
    type Error = RosterError;

    fn try_from(record: CombatantRecord) -> Result<Self, Self::Error> {
        let hp = record.hp.unwrap_or(record.max_hp);
        if record.max_hp <= 0 || hp < 0 || hp > record.max_hp {
            return Err(RosterError::InvalidHitPoints {
                id: record.id,
                hp,
                max_hp: record.max_hp,
            });
        }

        if let Err(source) = parse_dice(&record.damage_dice) {
            return Err(RosterError::InvalidDice {
                id: record.id,
                source,
            });
        }

        Ok(Combatant::new(
            record.id,
            record.name,
            record.max_hp,
            record.attack_bonus,
            record.armor_class,
            record.damage_dice,
        )
        .with_hp(hp))
    }
}

/// One protagonist and the opponents it faces, in turn order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub hero: CombatantRecord,
    pub enemies: Vec<CombatantRecord>,
}

impl Default for Roster {
    fn default() -> Self {
        Self::demo()
    }
}

impl Roster {
    /// Adventurer against a goblin and a giant rat
    pub fn demo() -> Self {
        Self {
            hero: CombatantRecord::new("hero1", "Adventurer", 12, 3, 12, "1d6+1"),
            enemies: vec![
                CombatantRecord::new("gob1", "Goblin", 6, 2, 10, "1d4"),
                CombatantRecord::new("rat1", "Giant Rat", 4, 1, 9, "1d3"),
            ],
        }
    }

    /// Validate every record and build the battle's combatants
    pub fn into_combatants(self) -> Result<(Protagonist, Vec<Opponent>), RosterError> {
        if self.enemies.is_empty() {
            return Err(RosterError::NoOpponents);
        }

        let hero = Combatant::try_from(self.hero)?;
        let enemies = self
            .enemies
            .into_iter()
            .map(Combatant::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((hero, enemies))
    }
}
