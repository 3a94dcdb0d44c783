//! Combatant records
//!
//! The protagonist and every opponent share one shape. Only hit points change
//! during a battle; everything else is fixed at construction.

use serde::Serialize;

/// A participant in a battle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Combatant {
    id: String,
    name: String,
    hp: i32,
    max_hp: i32,
    attack_bonus: i32,
    armor_class: i32,
    damage_dice: String,
}

/// The single hero of a battle
pub type Protagonist = Combatant;

/// One member of the opposing roster
pub type Opponent = Combatant;

impl Combatant {
    /// Create a combatant at full health
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        max_hp: i32,
        attack_bonus: i32,
        armor_class: i32,
        damage_dice: impl Into<String>,
    ) -> Self {
        let max_hp = max_hp.max(0);
        Self {
            id: id.into(),
            name: name.into(),
            hp: max_hp,
            max_hp,
            attack_bonus,
            armor_class,
            damage_dice: damage_dice.into(),
        }
    }

    /// Start the battle at `hp` instead of full health (clamped to `[0, max_hp]`)
    pub fn with_hp(mut self, hp: i32) -> Self {
        self.hp = hp.clamp(0, self.max_hp);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hp(&self) -> i32 {
        self.hp
    }

    pub fn max_hp(&self) -> i32 {
        self.max_hp
    }

    pub fn attack_bonus(&self) -> i32 {
        self.attack_bonus
    }

    pub fn armor_class(&self) -> i32 {
        self.armor_class
    }

    /// Damage expression rolled when this combatant lands a hit
    pub fn damage_dice(&self) -> &str {
        &self.damage_dice
    }

    /// Check if the combatant still stands
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Check if the combatant is down
    pub fn is_dead(&self) -> bool {
        !self.is_alive()
    }

    /// Take damage, never dropping below zero (returns damage actually applied)
    pub(crate) fn take_damage(&mut self, amount: i32) -> i32 {
        let amount = amount.max(0);
        let applied = amount.min(self.hp);
        self.hp -= applied;
        applied
    }
}

impl std::fmt::Display for Combatant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}/{} HP)", self.name, self.hp, self.max_hp)
    }
}

/// Drop every defeated opponent, keeping survivors in their original order
pub fn prune_defeated(opponents: &mut Vec<Opponent>) -> usize {
    let before = opponents.len();
    opponents.retain(Combatant::is_alive);
    before - opponents.len()
}

/// First opponent in turn order that is still standing
pub fn first_alive(opponents: &mut [Opponent]) -> Option<&mut Opponent> {
    opponents.iter_mut().find(|o| o.is_alive())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goblin(id: &str) -> Combatant {
        Combatant::new(id, id, 6, 2, 10, "1d4")
    }

    #[test]
    fn test_new_is_full_health() {
        let c = Combatant::new("hero1", "Adventurer", 12, 3, 12, "1d6+1");
        assert_eq!(c.hp(), 12);
        assert_eq!(c.max_hp(), 12);
        assert_eq!(c.attack_bonus(), 3);
        assert_eq!(c.armor_class(), 12);
        assert_eq!(c.damage_dice(), "1d6+1");
        assert!(c.is_alive());
        assert_eq!(c.to_string(), "Adventurer (12/12 HP)");
    }

    #[test]
    fn test_with_hp_clamps() {
        assert_eq!(goblin("g").with_hp(3).hp(), 3);
        assert_eq!(goblin("g").with_hp(-4).hp(), 0);
        assert_eq!(goblin("g").with_hp(50).hp(), 6);
    }

    #[test]
    fn test_take_damage_clamps_at_zero() {
        let mut c = goblin("g");
        assert_eq!(c.take_damage(4), 4);
        assert_eq!(c.hp(), 2);
        assert_eq!(c.take_damage(10), 2);
        assert_eq!(c.hp(), 0);
        assert!(c.is_dead());
        assert_eq!(c.take_damage(3), 0);
        assert_eq!(c.hp(), 0);
    }

    #[test]
    fn test_negative_damage_does_not_heal() {
        let mut c = goblin("g").with_hp(2);
        assert_eq!(c.take_damage(-5), 0);
        assert_eq!(c.hp(), 2);
    }

    #[test]
    fn test_prune_preserves_order() {
        let mut opponents = vec![
            goblin("a").with_hp(0),
            goblin("b"),
            goblin("c").with_hp(0),
            goblin("d"),
        ];
        assert_eq!(prune_defeated(&mut opponents), 2);
        let ids: Vec<&str> = opponents.iter().map(|o| o.id()).collect();
        assert_eq!(ids, vec!["b", "d"]);
    }

    #[test]
    fn test_prune_single_survivor() {
        let mut opponents = vec![goblin("a").with_hp(0), goblin("b"), goblin("c").with_hp(0)];
        prune_defeated(&mut opponents);
        assert_eq!(opponents.len(), 1);
        assert_eq!(opponents[0].id(), "b");
    }

    #[test]
    fn test_first_alive_skips_dead() {
        let mut opponents = vec![goblin("a").with_hp(0), goblin("b"), goblin("c")];
        assert_eq!(first_alive(&mut opponents).map(|o| o.id().to_string()), Some("b".into()));

        let mut all_dead = vec![goblin("a").with_hp(0)];
        assert!(first_alive(&mut all_dead).is_none());
        assert!(first_alive(&mut []).is_none());
    }
}
