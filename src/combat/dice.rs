//! Dice rolling system
//!
//! Parses and rolls dice notation like "2d6+3", "1d20", "4d6 - 2"

use regex::Regex;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

use super::random::RandomSource;

static DICE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)d(\d+)\s*([+-]\s*\d+)?\s*$").unwrap());

/// Dice notation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    #[error("malformed dice expression: '{0}'")]
    MalformedExpression(String),
}

/// A parsed dice roll specification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceRoll {
    /// Number of dice to roll
    pub count: u32,
    /// Number of sides per die
    pub sides: u32,
    /// Modifier to add/subtract
    pub modifier: i32,
}

impl DiceRoll {
    /// Create a new dice roll
    pub fn new(count: u32, sides: u32, modifier: i32) -> Self {
        Self {
            count,
            sides,
            modifier,
        }
    }

    /// Roll the dice and return the total
    pub fn roll<R: RandomSource + ?Sized>(&self, rng: &mut R) -> i32 {
        let sides = self.die_max();
        let mut total: i64 = 0;

        for _ in 0..self.count {
            total += i64::from(rng.range_inclusive(1, sides));
        }

        saturate(total + i64::from(self.modifier))
    }

    /// Get the minimum possible result
    pub fn min(&self) -> i32 {
        saturate(i64::from(self.count) + i64::from(self.modifier))
    }

    /// Get the maximum possible result
    pub fn max(&self) -> i32 {
        saturate(i64::from(self.count) * i64::from(self.die_max()) + i64::from(self.modifier))
    }

    /// Highest face a single die can show
    fn die_max(&self) -> i32 {
        i32::try_from(self.sides).unwrap_or(i32::MAX)
    }
}

fn saturate(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

impl FromStr for DiceRoll {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_dice(s)
    }
}

impl std::fmt::Display for DiceRoll {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.modifier > 0 {
            write!(f, "{}d{}+{}", self.count, self.sides, self.modifier)
        } else if self.modifier < 0 {
            write!(f, "{}d{}{}", self.count, self.sides, self.modifier)
        } else {
            write!(f, "{}d{}", self.count, self.sides)
        }
    }
}

/// Parse a dice notation string like "2d6+3"
pub fn parse_dice(notation: &str) -> Result<DiceRoll, DiceError> {
    let malformed = || DiceError::MalformedExpression(notation.to_string());

    let caps = DICE_REGEX.captures(notation).ok_or_else(malformed)?;

    let count: u32 = caps[1].parse().map_err(|_| malformed())?;
    let sides: u32 = caps[2].parse().map_err(|_| malformed())?;
    if sides == 0 || i32::try_from(sides).is_err() {
        return Err(malformed());
    }

    let modifier: i32 = match caps.get(3) {
        Some(m) => {
            let compact: String = m.as_str().chars().filter(|c| !c.is_whitespace()).collect();
            compact.parse().map_err(|_| malformed())?
        }
        None => 0,
    };

    Ok(DiceRoll {
        count,
        sides,
        modifier,
    })
}

/// Parse and roll a dice expression in one step
pub fn roll<R: RandomSource + ?Sized>(expression: &str, rng: &mut R) -> Result<i32, DiceError> {
    Ok(parse_dice(expression)?.roll(rng))
}

/// Roll a single d20
pub fn roll_d20<R: RandomSource + ?Sized>(rng: &mut R) -> i32 {
    rng.range_inclusive(1, 20)
}

/// Check if a d20 roll is a natural 20 (critical hit)
pub fn is_critical(roll: i32) -> bool {
    roll == 20
}

/// Check if a d20 roll is a natural 1 (critical fail)
pub fn is_fumble(roll: i32) -> bool {
    roll == 1
}
