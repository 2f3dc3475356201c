use super::kind::ActionKind;
use crate::listener::LifecycleEvent;
use crate::types::{ActionId, EntityId, Position};
use crate::world::Attackable;

/// Opponent selection of a fight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FightTarget {
    /// Closest reachable enemy.
    Any,
    /// One creature, typically an allied natural enemy.
    Specific(EntityId),
    /// The specific opponent became invalid.
    Lost,
}

/// Action payloads: each variant carries only what its handler needs.
///
/// References to other entities are `Option`s so lifecycle notifications can
/// null them; handlers treat a `None` as "target gone" and pop.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Action {
    Idle,
    WalkToTile,
    Fight {
        target: FightTarget,
        ko: bool,
    },
    FightArena {
        opponent: Option<EntityId>,
    },
    AttackObject {
        target: Attackable,
        target_tile: Position,
        ko: bool,
    },
    Flee,
    SearchTileToDig {
        forced: bool,
    },
    DigTile {
        tile: Position,
        /// Floor tile the worker digs from.
        from: Position,
    },
    SearchGroundTileToClaim {
        forced: bool,
    },
    ClaimGroundTile {
        tile: Position,
    },
    SearchWallTileToClaim {
        forced: bool,
    },
    ClaimWallTile {
        tile: Position,
        from: Position,
    },
    SearchEntityToCarry {
        forced: bool,
    },
    GrabEntity {
        entity: Option<EntityId>,
    },
    CarryEntity {
        entity: Option<EntityId>,
        building: Option<EntityId>,
        /// Reserved by the destination when the carry starts.
        drop_tile: Option<Position>,
    },
    FindHome {
        forced: bool,
    },
    Sleep,
    Job {
        forced: bool,
    },
    SearchJob {
        forced: bool,
    },
    UseRoom {
        room: Option<EntityId>,
        forced: bool,
        fee_tried: bool,
    },
    Eat {
        forced: bool,
    },
    SearchFood {
        forced: bool,
    },
    EatChicken {
        chicken: Option<EntityId>,
    },
    UseHatchery {
        hatchery: Option<EntityId>,
        forced: bool,
    },
    GetFee,
    LeaveDungeon,
    StealFreeGold,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Idle => ActionKind::Idle,
            Self::WalkToTile => ActionKind::WalkToTile,
            Self::Fight { .. } => ActionKind::Fight,
            Self::FightArena { .. } => ActionKind::FightArena,
            Self::AttackObject { .. } => ActionKind::AttackObject,
            Self::Flee => ActionKind::Flee,
            Self::SearchTileToDig { .. } => ActionKind::SearchTileToDig,
            Self::DigTile { .. } => ActionKind::DigTile,
            Self::SearchGroundTileToClaim { .. } => ActionKind::SearchGroundTileToClaim,
            Self::ClaimGroundTile { .. } => ActionKind::ClaimGroundTile,
            Self::SearchWallTileToClaim { .. } => ActionKind::SearchWallTileToClaim,
            Self::ClaimWallTile { .. } => ActionKind::ClaimWallTile,
            Self::SearchEntityToCarry { .. } => ActionKind::SearchEntityToCarry,
            Self::GrabEntity { .. } => ActionKind::GrabEntity,
            Self::CarryEntity { .. } => ActionKind::CarryEntity,
            Self::FindHome { .. } => ActionKind::FindHome,
            Self::Sleep => ActionKind::Sleep,
            Self::Job { .. } => ActionKind::Job,
            Self::SearchJob { .. } => ActionKind::SearchJob,
            Self::UseRoom { .. } => ActionKind::UseRoom,
            Self::Eat { .. } => ActionKind::Eat,
            Self::SearchFood { .. } => ActionKind::SearchFood,
            Self::EatChicken { .. } => ActionKind::EatChicken,
            Self::UseHatchery { .. } => ActionKind::UseHatchery,
            Self::GetFee => ActionKind::GetFee,
            Self::LeaveDungeon => ActionKind::LeaveDungeon,
            Self::StealFreeGold => ActionKind::StealFreeGold,
        }
    }

    /// Entities this action observes while it is alive.
    pub fn observed_entities(&self) -> Vec<EntityId> {
        match self {
            Self::Fight {
                target: FightTarget::Specific(id),
                ..
            } => vec![*id],
            Self::FightArena { opponent: Some(id) } => vec![*id],
            Self::GrabEntity { entity: Some(id) } => vec![*id],
            Self::CarryEntity {
                entity, building, ..
            } => entity.iter().chain(building.iter()).copied().collect(),
            Self::UseRoom { room: Some(id), .. } => vec![*id],
            Self::EatChicken { chicken: Some(id) } => vec![*id],
            Self::UseHatchery {
                hatchery: Some(id), ..
            } => vec![*id],
            _ => Vec::new(),
        }
    }

    /// Reacts to `entity` becoming invalid. Returns whether to keep listening.
    ///
    /// Every reference to `entity` is nulled out before returning `false`, so
    /// the handler never looks the entity up again.
    pub fn on_lifecycle(&mut self, entity: EntityId, event: LifecycleEvent) -> bool {
        if event == LifecycleEvent::Dropped {
            return true;
        }
        let picked_up = event == LifecycleEvent::PickedUp;
        match self {
            Self::Fight { target, .. } => {
                if *target == FightTarget::Specific(entity) {
                    *target = FightTarget::Lost;
                    return false;
                }
                true
            }
            Self::FightArena { opponent } => clear_if(opponent, entity),
            Self::GrabEntity { entity: grabbed } => clear_if(grabbed, entity),
            Self::EatChicken { chicken } => clear_if(chicken, entity),
            Self::CarryEntity {
                entity: carried,
                building,
                ..
            } => {
                if *carried == Some(entity) {
                    // The carrier itself fires PickedUp on its cargo.
                    if picked_up {
                        return true;
                    }
                    *carried = None;
                    return false;
                }
                if !picked_up && *building == Some(entity) {
                    *building = None;
                    return false;
                }
                true
            }
            Self::UseRoom { room, .. } if !picked_up => clear_if(room, entity),
            Self::UseHatchery { hatchery, .. } if !picked_up => clear_if(hatchery, entity),
            _ => true,
        }
    }
}

fn clear_if(slot: &mut Option<EntityId>, entity: EntityId) -> bool {
    if *slot == Some(entity) {
        *slot = None;
        false
    } else {
        true
    }
}

/// One entry of a creature's action stack.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionRecord {
    pub id: ActionId,
    pub action: Action,
    /// Ticks this record has spent on the stack, active or not.
    pub turns: u32,
}

impl ActionRecord {
    pub fn new(id: ActionId, action: Action) -> Self {
        Self {
            id,
            action,
            turns: 0,
        }
    }

    pub fn kind(&self) -> ActionKind {
        self.action.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dead_chicken_is_nulled_and_listener_dropped() {
        let mut action = Action::EatChicken {
            chicken: Some(EntityId(4)),
        };
        assert!(action.on_lifecycle(EntityId(5), LifecycleEvent::Dead));
        assert!(!action.on_lifecycle(EntityId(4), LifecycleEvent::Dead));
        assert_eq!(action, Action::EatChicken { chicken: None });
    }

    #[test]
    fn specific_fight_target_becomes_lost() {
        let mut action = Action::Fight {
            target: FightTarget::Specific(EntityId(2)),
            ko: false,
        };
        assert!(!action.on_lifecycle(EntityId(2), LifecycleEvent::RemovedFromMap));
        assert!(matches!(
            action,
            Action::Fight {
                target: FightTarget::Lost,
                ..
            }
        ));
    }

    #[test]
    fn carry_survives_its_own_pickup_but_not_building_loss() {
        let mut action = Action::CarryEntity {
            entity: Some(EntityId(7)),
            building: Some(EntityId(8)),
            drop_tile: None,
        };
        assert!(action.on_lifecycle(EntityId(7), LifecycleEvent::PickedUp));
        assert!(!action.on_lifecycle(EntityId(8), LifecycleEvent::Dead));
        assert_eq!(action.observed_entities(), vec![EntityId(7)]);
    }

    #[test]
    fn room_is_not_lost_on_pickup_events() {
        let mut action = Action::UseRoom {
            room: Some(EntityId(3)),
            forced: false,
            fee_tried: false,
        };
        assert!(action.on_lifecycle(EntityId(3), LifecycleEvent::PickedUp));
        assert!(!action.on_lifecycle(EntityId(3), LifecycleEvent::Dead));
    }
}
