use bitflags::bitflags;

use crate::types::{EntityId, SeatId};

bitflags! {
    /// Set of seats, one bit per [`SeatId`].
    ///
    /// Used for the per-seat "marked for digging" state of a tile, where
    /// several keepers can mark the same wall independently.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct SeatMask: u32 {
        const _ = !0;
    }
}

impl SeatMask {
    #[inline]
    pub fn seat(seat: SeatId) -> Self {
        Self::from_bits_retain(1u32 << u32::from(seat.0.min(SeatId::MAX)))
    }

    #[inline]
    pub fn has_seat(self, seat: SeatId) -> bool {
        self.contains(Self::seat(seat))
    }
}

/// Material of a tile. Walls have `fullness > 0`, floors have `fullness == 0`.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TileKind {
    Dirt,
    Gold,
    Gem,
    Rock,
    Water,
    Lava,
}

/// One grid cell: material, dig state, claim state and worker locks.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tile {
    pub kind: TileKind,
    /// Remaining rock; `0.0` means the tile is an open floor.
    pub fullness: f64,
    pub seat: Option<SeatId>,
    /// Claim progress of `seat`, in `[0, 1]`.
    pub claimed_percentage: f64,
    pub marked_for_digging: SeatMask,
    /// Live DigTile actions targeting this tile.
    pub workers_digging: u32,
    /// Live ClaimGroundTile/ClaimWallTile actions targeting this tile.
    pub workers_claiming: u32,
    /// Building covering this tile, if any.
    pub building: Option<EntityId>,
}

impl Tile {
    pub const FULL: f64 = 100.0;

    pub fn new(kind: TileKind, fullness: f64) -> Self {
        Self {
            kind,
            fullness,
            seat: None,
            claimed_percentage: 0.0,
            marked_for_digging: SeatMask::empty(),
            workers_digging: 0,
            workers_claiming: 0,
            building: None,
        }
    }

    pub fn floor(kind: TileKind) -> Self {
        Self::new(kind, 0.0)
    }

    pub fn wall(kind: TileKind) -> Self {
        Self::new(kind, Self::FULL)
    }

    /// A floor fully claimed by `seat`.
    pub fn claimed(seat: SeatId) -> Self {
        let mut tile = Self::floor(TileKind::Dirt);
        tile.seat = Some(seat);
        tile.claimed_percentage = 1.0;
        tile
    }

    #[inline]
    pub fn is_floor(&self) -> bool {
        self.fullness <= 0.0
    }

    #[inline]
    pub fn is_wall(&self) -> bool {
        !self.is_floor()
    }

    pub fn is_claimed_for_seat(&self, seat: SeatId) -> bool {
        self.seat == Some(seat) && self.claimed_percentage >= 1.0
    }

    pub fn is_claimed(&self) -> bool {
        self.seat.is_some() && self.claimed_percentage >= 1.0
    }

    pub fn is_marked_for_digging(&self, seat: SeatId) -> bool {
        self.marked_for_digging.has_seat(seat)
    }

    pub fn set_marked_for_digging(&mut self, seat: SeatId, marked: bool) {
        self.marked_for_digging.set(SeatMask::seat(seat), marked);
    }

    pub fn is_locked(&self) -> bool {
        self.workers_digging > 0 || self.workers_claiming > 0
    }

    /// Open dirt-like floor that `seat` does not fully own yet.
    pub fn is_ground_claimable(&self, seat: SeatId) -> bool {
        self.is_floor()
            && matches!(self.kind, TileKind::Dirt | TileKind::Gold | TileKind::Gem)
            && !self.is_claimed_for_seat(seat)
    }

    /// Wall that can still be dug and is not protected by another seat's claim.
    pub fn is_diggable(&self, seat: SeatId) -> bool {
        if self.is_floor() || self.kind == TileKind::Rock {
            return false;
        }
        match self.seat {
            Some(owner) if owner != seat => !self.is_claimed(),
            _ => true,
        }
    }

    /// Dirt wall not yet fully claimed by `seat` and not queued for digging by it.
    ///
    /// The neighbour requirement is checked by [`TileMap::is_wall_claimable`](super::TileMap::is_wall_claimable).
    pub fn is_wall_claimable_alone(&self, seat: SeatId) -> bool {
        self.is_wall()
            && self.kind == TileKind::Dirt
            && !self.is_claimed_for_seat(seat)
            && !self.is_marked_for_digging(seat)
    }

    /// Removes up to `rate` fullness and returns the amount actually removed.
    pub fn dig_out(&mut self, rate: f64) -> f64 {
        if self.is_floor() || rate <= 0.0 {
            return 0.0;
        }
        let amount = rate.min(self.fullness);
        self.fullness -= amount;
        if self.fullness <= 0.0 {
            self.fullness = 0.0;
            self.marked_for_digging = SeatMask::empty();
            if !self.is_claimed() {
                self.seat = None;
                self.claimed_percentage = 0.0;
            }
            if matches!(self.kind, TileKind::Gold | TileKind::Gem) {
                self.kind = TileKind::Dirt;
            }
        }
        amount
    }

    /// Moves the claim state toward `seat` by `rate` and returns the amount applied.
    ///
    /// A tile owned by another seat is first unclaimed down to zero, then
    /// switches to `seat` and starts filling up.
    pub fn claim_for_seat(&mut self, seat: SeatId, rate: f64) -> f64 {
        if rate <= 0.0 {
            return 0.0;
        }
        match self.seat {
            Some(owner) if owner != seat => {
                let amount = rate.min(self.claimed_percentage);
                self.claimed_percentage -= amount;
                if self.claimed_percentage <= 0.0 {
                    self.claimed_percentage = 0.0;
                    self.seat = Some(seat);
                }
                amount
            }
            _ => {
                self.seat = Some(seat);
                let amount = rate.min(1.0 - self.claimed_percentage).max(0.0);
                self.claimed_percentage += amount;
                if self.claimed_percentage >= 1.0 {
                    self.claimed_percentage = 1.0;
                }
                amount
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dig_out_clamps_at_zero_and_turns_gold_to_dirt() {
        let mut tile = Tile::new(TileKind::Gold, 1.5);
        tile.set_marked_for_digging(SeatId(1), true);
        assert_eq!(tile.dig_out(1.0), 1.0);
        assert_eq!(tile.dig_out(1.0), 0.5);
        assert!(tile.is_floor());
        assert_eq!(tile.kind, TileKind::Dirt);
        assert!(!tile.is_marked_for_digging(SeatId(1)));
        assert_eq!(tile.dig_out(1.0), 0.0);
    }

    #[test]
    fn claim_reverses_enemy_ownership_first() {
        let mut tile = Tile::claimed(SeatId(2));
        assert!(tile.is_ground_claimable(SeatId(1)));
        tile.claim_for_seat(SeatId(1), 0.6);
        assert_eq!(tile.seat, Some(SeatId(2)));
        tile.claim_for_seat(SeatId(1), 0.6);
        assert_eq!(tile.seat, Some(SeatId(1)));
        assert_eq!(tile.claimed_percentage, 0.0);
        tile.claim_for_seat(SeatId(1), 2.0);
        assert!(tile.is_claimed_for_seat(SeatId(1)));
        assert!(!tile.is_ground_claimable(SeatId(1)));
    }

    #[test]
    fn rock_and_enemy_claimed_walls_are_not_diggable() {
        assert!(!Tile::wall(TileKind::Rock).is_diggable(SeatId(1)));
        let mut wall = Tile::wall(TileKind::Dirt);
        assert!(wall.is_diggable(SeatId(1)));
        wall.claim_for_seat(SeatId(2), 1.0);
        assert!(!wall.is_diggable(SeatId(1)));
        assert!(wall.is_diggable(SeatId(2)));
    }

    #[test]
    fn seat_mask_tracks_each_seat() {
        let mut mask = SeatMask::empty();
        mask |= SeatMask::seat(SeatId(0));
        mask |= SeatMask::seat(SeatId(5));
        assert!(mask.has_seat(SeatId(5)));
        assert!(!mask.has_seat(SeatId(4)));
    }
}
