//! Common test utilities - stock combatants

#![allow(dead_code)]

use battlesim::Combatant;

pub fn adventurer() -> Combatant {
    Combatant::new("hero1", "Adventurer", 12, 3, 12, "1d6+1")
}

pub fn goblin() -> Combatant {
    Combatant::new("gob1", "Goblin", 6, 2, 10, "1d4")
}

pub fn giant_rat() -> Combatant {
    Combatant::new("rat1", "Giant Rat", 4, 1, 9, "1d3")
}

pub fn named(id: &str, name: &str) -> Combatant {
    Combatant::new(id, name, 5, 2, 10, "1d4")
}
