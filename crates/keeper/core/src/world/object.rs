use crate::types::{EntityId, Position, SeatId};

/// Carry priority of an entity; a higher variant is picked up first.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum EntityCarryType {
    NotCarryable,
    Corpse,
    CraftedTrap,
    ResearchScroll,
    Gold,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ObjectKind {
    TreasuryGold { amount: u32 },
    /// A chicken, optionally bound to the hatchery that spawned it.
    Chicken { hatchery: Option<EntityId> },
    Corpse,
    ResearchScroll { points: u32 },
    CraftedTrap,
}

impl ObjectKind {
    pub fn carry_type(&self) -> EntityCarryType {
        match self {
            Self::TreasuryGold { .. } => EntityCarryType::Gold,
            Self::Chicken { .. } => EntityCarryType::NotCarryable,
            Self::Corpse => EntityCarryType::Corpse,
            Self::ResearchScroll { .. } => EntityCarryType::ResearchScroll,
            Self::CraftedTrap => EntityCarryType::CraftedTrap,
        }
    }
}

/// Non-creature entity lying on (or carried across) the map.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MapObject {
    pub id: EntityId,
    pub kind: ObjectKind,
    pub position: Position,
    pub seat: Option<SeatId>,
    /// Reserved by a creature on its way to grab, carry or eat it.
    pub carry_lock: bool,
    pub carried_by: Option<EntityId>,
    /// False while carried: the object occupies no tile.
    pub on_map: bool,
}

impl MapObject {
    pub fn new(id: EntityId, kind: ObjectKind, position: Position) -> Self {
        Self {
            id,
            kind,
            position,
            seat: None,
            carry_lock: false,
            carried_by: None,
            on_map: true,
        }
    }

    pub fn carry_type(&self) -> EntityCarryType {
        self.kind.carry_type()
    }

    /// Free for a new carrier to reserve.
    pub fn is_available_to_carry(&self) -> bool {
        self.on_map && !self.carry_lock && self.carry_type() != EntityCarryType::NotCarryable
    }

    pub fn gold(&self) -> u32 {
        match self.kind {
            ObjectKind::TreasuryGold { amount } => amount,
            _ => 0,
        }
    }
}
