//! Attack resolution
//!
//! A d20 check against armor class, then a damage roll on a hit. Natural 20
//! always hits and doubles damage; natural 1 always misses. Both overrides
//! are decided before the arithmetic comparison.

use std::fmt;

use tracing::debug;

use super::combatant::Combatant;
use super::dice::{self, is_critical, is_fumble, roll_d20, DiceError};
use super::random::RandomSource;

/// Damage multiplier on a critical hit
pub const CRIT_MULTIPLIER: i32 = 2;

/// Result of an attack roll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackRoll {
    /// The d20 roll
    pub roll: i32,
    /// Total attack value (roll + bonus)
    pub attack_total: i32,
    /// Target's AC
    pub target_ac: i32,
    /// Whether the attack hit
    pub hit: bool,
    /// Whether it was a critical hit
    pub critical: bool,
    /// Whether it was a fumble
    pub fumble: bool,
}

impl AttackRoll {
    /// Evaluate a d20 roll against a target's armor class
    pub fn new(roll: i32, attack_bonus: i32, target_ac: i32) -> Self {
        let critical = is_critical(roll);
        let fumble = is_fumble(roll);
        let attack_total = roll + attack_bonus;

        let hit = if critical {
            true
        } else if fumble {
            false
        } else {
            attack_total >= target_ac
        };

        Self {
            roll,
            attack_total,
            target_ac,
            hit,
            critical,
            fumble,
        }
    }

    /// Damage multiplier for this roll (1, or 2 on a critical)
    pub fn crit_multiplier(&self) -> i32 {
        if self.critical {
            CRIT_MULTIPLIER
        } else {
            1
        }
    }
}

/// Roll a d20 for an attacker against a target's armor class
pub fn resolve_attack<R: RandomSource + ?Sized>(
    rng: &mut R,
    attack_bonus: i32,
    target_ac: i32,
) -> AttackRoll {
    AttackRoll::new(roll_d20(rng), attack_bonus, target_ac)
}

/// What happened when one combatant attacked another
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackReport {
    pub attacker: String,
    pub defender: String,
    pub check: AttackRoll,
    /// Damage dealt, `None` on a miss
    pub damage: Option<i32>,
    pub defender_hp: i32,
    pub defender_max_hp: i32,
}

impl AttackReport {
    pub fn hit(&self) -> bool {
        self.damage.is_some()
    }

    /// Whether this attack brought the defender to zero hit points
    pub fn defeated_defender(&self) -> bool {
        self.hit() && self.defender_hp == 0
    }
}

impl fmt::Display for AttackReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.damage {
            None => write!(f, "{} attacked {} and missed.", self.attacker, self.defender),
            Some(damage) => {
                let verb = if self.check.critical {
                    "landed a critical hit on"
                } else {
                    "hit"
                };
                write!(
                    f,
                    "{} {} {} for {} damage. ({}/{} HP)",
                    self.attacker, verb, self.defender, damage, self.defender_hp, self.defender_max_hp
                )
            }
        }
    }
}

/// Resolve one attack and apply its damage to the defender
///
/// The check is made against the defender's own armor class. On a hit the
/// attacker's damage dice are rolled, multiplied on a critical, and
/// subtracted from the defender's hit points (never below zero).
pub fn apply_attack<R: RandomSource + ?Sized>(
    rng: &mut R,
    attacker: &Combatant,
    defender: &mut Combatant,
) -> Result<AttackReport, DiceError> {
    let check = resolve_attack(rng, attacker.attack_bonus(), defender.armor_class());
    debug!(
        attacker = attacker.id(),
        defender = defender.id(),
        roll = check.roll,
        total = check.attack_total,
        ac = check.target_ac,
        hit = check.hit,
        "attack check"
    );

    let damage = if check.hit {
        let raw = dice::roll(attacker.damage_dice(), rng)?;
        let damage = raw.saturating_mul(check.crit_multiplier()).max(0);
        defender.take_damage(damage);
        Some(damage)
    } else {
        None
    };

    Ok(AttackReport {
        attacker: attacker.name().to_string(),
        defender: defender.name().to_string(),
        check,
        damage,
        defender_hp: defender.hp(),
        defender_max_hp: defender.max_hp(),
    })
}
