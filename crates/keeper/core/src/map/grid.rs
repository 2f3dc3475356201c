use arrayvec::ArrayVec;

use super::tile::{Tile, TileKind};
use crate::env::MovementProfile;
use crate::types::{Position, SeatId};

/// Rectangular tile grid stored row-major.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileMap {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

impl TileMap {
    /// Creates a map filled with copies of `fill`.
    pub fn new(width: u32, height: u32, fill: Tile) -> Self {
        let len = (width as usize) * (height as usize);
        Self {
            width,
            height,
            tiles: vec![fill; len],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn contains(&self, position: Position) -> bool {
        position.x >= 0
            && position.y >= 0
            && (position.x as u32) < self.width
            && (position.y as u32) < self.height
    }

    #[inline]
    fn index(&self, position: Position) -> Option<usize> {
        if !self.contains(position) {
            return None;
        }
        Some(position.y as usize * self.width as usize + position.x as usize)
    }

    pub fn tile(&self, position: Position) -> Option<&Tile> {
        self.index(position).map(|idx| &self.tiles[idx])
    }

    pub fn tile_mut(&mut self, position: Position) -> Option<&mut Tile> {
        self.index(position).map(move |idx| &mut self.tiles[idx])
    }

    /// Replaces the tile at `position`. Returns false when out of bounds.
    pub fn set_tile(&mut self, position: Position, tile: Tile) -> bool {
        match self.tile_mut(position) {
            Some(slot) => {
                *slot = tile;
                true
            }
            None => false,
        }
    }

    /// In-bounds orthogonal neighbours in N, E, S, W order.
    pub fn neighbors(&self, position: Position) -> ArrayVec<Position, 4> {
        const OFFSETS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];
        OFFSETS
            .iter()
            .map(|&(dx, dy)| position.offset(dx, dy))
            .filter(|p| self.contains(*p))
            .collect()
    }

    /// Tiles whose squared distance to `center` is within `radius^2`.
    ///
    /// Ordered by ascending squared distance, ties broken row-major, so the
    /// first element is always `center` itself.
    pub fn tiles_within(&self, center: Position, radius: u32) -> Vec<Position> {
        let r = radius as i32;
        let r_sq = i64::from(r) * i64::from(r);
        let mut out = Vec::new();
        for y in (center.y - r)..=(center.y + r) {
            for x in (center.x - r)..=(center.x + r) {
                let p = Position::new(x, y);
                if self.contains(p) && center.distance_sq(p) <= r_sq {
                    out.push(p);
                }
            }
        }
        out.sort_by_key(|p| (center.distance_sq(*p), p.y, p.x));
        out
    }

    /// Bresenham line of sight; every tile strictly between the ends must be a floor.
    pub fn line_of_sight(&self, from: Position, to: Position) -> bool {
        let dx = (to.x - from.x).abs();
        let dy = -(to.y - from.y).abs();
        let sx = if from.x < to.x { 1 } else { -1 };
        let sy = if from.y < to.y { 1 } else { -1 };
        let mut err = dx + dy;
        let mut current = from;
        loop {
            if current == to {
                return true;
            }
            if current != from {
                match self.tile(current) {
                    Some(tile) if tile.is_floor() => {}
                    _ => return false,
                }
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                current.x += sx;
            }
            if e2 <= dx {
                err += dx;
                current.y += sy;
            }
        }
    }

    /// Whether a creature moving with `profile` can stand on `position`.
    pub fn is_passable(&self, position: Position, profile: MovementProfile) -> bool {
        let Some(tile) = self.tile(position) else {
            return false;
        };
        if tile.is_wall() {
            return false;
        }
        match tile.kind {
            TileKind::Water => profile.water,
            TileKind::Lava => profile.lava,
            _ => profile.ground,
        }
    }

    /// Dirt wall next to a floor `seat` has fully claimed.
    pub fn is_wall_claimable(&self, position: Position, seat: SeatId) -> bool {
        let Some(tile) = self.tile(position) else {
            return false;
        };
        if !tile.is_wall_claimable_alone(seat) {
            return false;
        }
        self.neighbors(position).iter().any(|n| {
            self.tile(*n)
                .is_some_and(|t| t.is_floor() && t.is_claimed_for_seat(seat))
        })
    }

    /// Every position of the map, row-major.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.height as i32)
            .flat_map(move |y| (0..self.width as i32).map(move |x| Position::new(x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_map() -> TileMap {
        TileMap::new(8, 8, Tile::floor(TileKind::Dirt))
    }

    #[test]
    fn neighbors_are_in_fixed_order_and_clipped() {
        let map = open_map();
        let n = map.neighbors(Position::new(3, 3));
        assert_eq!(
            n.as_slice(),
            &[
                Position::new(3, 2),
                Position::new(4, 3),
                Position::new(3, 4),
                Position::new(2, 3)
            ]
        );
        assert_eq!(map.neighbors(Position::ORIGIN).len(), 2);
    }

    #[test]
    fn tiles_within_starts_at_center_and_is_sorted() {
        let map = open_map();
        let tiles = map.tiles_within(Position::new(4, 4), 2);
        assert_eq!(tiles[0], Position::new(4, 4));
        let dists: Vec<_> = tiles
            .iter()
            .map(|p| Position::new(4, 4).distance_sq(*p))
            .collect();
        assert!(dists.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(tiles.len(), 13);
    }

    #[test]
    fn walls_block_sight_but_are_visible() {
        let mut map = open_map();
        map.set_tile(Position::new(3, 1), Tile::wall(TileKind::Dirt));
        assert!(map.line_of_sight(Position::new(1, 1), Position::new(3, 1)));
        assert!(!map.line_of_sight(Position::new(1, 1), Position::new(5, 1)));
    }

    #[test]
    fn wall_claimable_requires_claimed_neighbor() {
        let mut map = open_map();
        let wall = Position::new(2, 2);
        map.set_tile(wall, Tile::wall(TileKind::Dirt));
        assert!(!map.is_wall_claimable(wall, SeatId(1)));
        map.set_tile(Position::new(2, 3), Tile::claimed(SeatId(1)));
        assert!(map.is_wall_claimable(wall, SeatId(1)));
    }
}
