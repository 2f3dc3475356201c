//! Creature species available to a dungeon.
use std::collections::BTreeMap;
use std::sync::Arc;

use keeper_core::{CreatureDefinition, MoodModifier, RoomAffinity, RoomKind};

/// Named [`CreatureDefinition`]s shared by every creature of a class.
#[derive(Debug, Clone, Default)]
pub struct SpeciesCatalog {
    species: BTreeMap<String, Arc<CreatureDefinition>>,
}

impl SpeciesCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kobold workers, Trolls, thieving Goblins and Dark Elves that despise Trolls.
    pub fn standard() -> Self {
        let mut catalog = Self::new();
        catalog.insert(CreatureDefinition::worker("Kobold"));
        catalog.insert(CreatureDefinition::fighter("Troll").with_hp(150.0).with_fee(80));
        catalog.insert(
            CreatureDefinition::fighter("Goblin")
                .with_hp(70.0)
                .with_fee(30)
                .with_steals_gold(true),
        );
        catalog.insert(
            CreatureDefinition::fighter("DarkElf")
                .with_room_affinities(vec![
                    RoomAffinity::new(RoomKind::Library, 20, 1.0),
                    RoomAffinity::new(RoomKind::TrainingHall, 5, 0.5),
                    RoomAffinity::new(RoomKind::Hatchery, 0, 0.0),
                ])
                .with_natural_enemies(vec!["Troll".to_string()])
                .with_mood_modifiers(vec![
                    MoodModifier::Hunger {
                        start: 70.0,
                        modifier: -100,
                    },
                    MoodModifier::HpLoss { modifier: -100 },
                    MoodModifier::Fee { modifier: -150 },
                    MoodModifier::Creature {
                        class: "Troll".to_string(),
                        modifier: -40,
                    },
                ]),
        );
        catalog
    }

    pub fn insert(&mut self, definition: CreatureDefinition) -> Arc<CreatureDefinition> {
        let definition = Arc::new(definition);
        self.species
            .insert(definition.class_name.clone(), Arc::clone(&definition));
        definition
    }

    pub fn get(&self, class_name: &str) -> Option<Arc<CreatureDefinition>> {
        self.species.get(class_name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.species.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_has_one_worker() {
        let catalog = SpeciesCatalog::standard();
        let workers: Vec<&str> = catalog
            .names()
            .filter(|name| catalog.get(name).is_some_and(|d| d.is_worker))
            .collect();
        assert_eq!(workers, vec!["Kobold"]);
        assert!(catalog.get("Goblin").is_some_and(|d| d.steals_gold));
        assert!(catalog
            .get("DarkElf")
            .is_some_and(|d| d.is_natural_enemy("Troll")));
        assert!(catalog.get("Dragon").is_none());
    }
}
