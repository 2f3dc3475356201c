//! Pathfinding service consumed by the handlers.
//!
//! Handlers treat pathfinding as a black box: they only ask whether a path
//! exists, for the path itself, for the best of several candidates, and for a
//! path to a tile from which a target can be attacked.
use std::collections::{HashMap, VecDeque};

use crate::map::TileMap;
use crate::types::Position;

/// Terrain a creature is able to walk on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MovementProfile {
    pub ground: bool,
    pub water: bool,
    pub lava: bool,
}

impl MovementProfile {
    pub const GROUND: Self = Self {
        ground: true,
        water: false,
        lava: false,
    };

    pub fn from_speeds(ground: f64, water: f64, lava: f64) -> Self {
        Self {
            ground: ground > 0.0,
            water: water > 0.0,
            lava: lava > 0.0,
        }
    }
}

impl Default for MovementProfile {
    fn default() -> Self {
        Self::GROUND
    }
}

/// Path queries over a [`TileMap`].
///
/// Returned paths exclude the start tile and include the destination; an
/// empty path means the creature already stands where it needs to be.
pub trait Pathfinder: Send + Sync {
    /// Shortest path from `from` to `to`, or `None` if unreachable.
    fn path(
        &self,
        map: &TileMap,
        profile: MovementProfile,
        from: Position,
        to: Position,
    ) -> Option<Vec<Position>>;

    fn path_exists(
        &self,
        map: &TileMap,
        profile: MovementProfile,
        from: Position,
        to: Position,
    ) -> bool {
        self.path(map, profile, from, to).is_some()
    }

    /// Shortest path to any of `candidates` and the index of the chosen one.
    ///
    /// On equal length the candidate listed first wins.
    fn find_best_path(
        &self,
        map: &TileMap,
        profile: MovementProfile,
        from: Position,
        candidates: &[Position],
    ) -> Option<(Vec<Position>, usize)>;

    /// Path to the closest tile from which one of `targets` is within `range`.
    ///
    /// Returns `Some(vec![])` when `from` is already in range.
    fn path_to_best_fighting_position(
        &self,
        map: &TileMap,
        profile: MovementProfile,
        from: Position,
        targets: &[Position],
        range: f64,
    ) -> Option<Vec<Position>>;
}

/// Breadth-first search on the 4-connected grid.
#[derive(Clone, Copy, Debug, Default)]
pub struct GridPathfinder;

impl GridPathfinder {
    pub fn new() -> Self {
        Self
    }

    /// Expands from `from` until `goal` accepts a tile, returning that tile's path.
    fn search<F>(
        map: &TileMap,
        profile: MovementProfile,
        from: Position,
        mut goal: F,
    ) -> Option<Vec<Position>>
    where
        F: FnMut(Position) -> bool,
    {
        if goal(from) {
            return Some(Vec::new());
        }
        let mut parents: HashMap<Position, Position> = HashMap::new();
        let mut queue = VecDeque::from([from]);
        parents.insert(from, from);

        while let Some(current) = queue.pop_front() {
            for next in map.neighbors(current) {
                if parents.contains_key(&next) || !map.is_passable(next, profile) {
                    continue;
                }
                parents.insert(next, current);
                if goal(next) {
                    return Some(Self::unwind(&parents, from, next));
                }
                queue.push_back(next);
            }
        }
        None
    }

    fn unwind(
        parents: &HashMap<Position, Position>,
        from: Position,
        to: Position,
    ) -> Vec<Position> {
        let mut path = vec![to];
        let mut current = to;
        while let Some(&parent) = parents.get(&current) {
            if parent == from {
                break;
            }
            path.push(parent);
            current = parent;
        }
        path.reverse();
        path
    }

    /// BFS distances from `from` to every reachable tile.
    fn distances(
        map: &TileMap,
        profile: MovementProfile,
        from: Position,
    ) -> HashMap<Position, usize> {
        let mut dist = HashMap::from([(from, 0usize)]);
        let mut queue = VecDeque::from([from]);
        while let Some(current) = queue.pop_front() {
            let d = dist[&current];
            for next in map.neighbors(current) {
                if dist.contains_key(&next) || !map.is_passable(next, profile) {
                    continue;
                }
                dist.insert(next, d + 1);
                queue.push_back(next);
            }
        }
        dist
    }
}

impl Pathfinder for GridPathfinder {
    fn path(
        &self,
        map: &TileMap,
        profile: MovementProfile,
        from: Position,
        to: Position,
    ) -> Option<Vec<Position>> {
        if from != to && !map.is_passable(to, profile) {
            return None;
        }
        Self::search(map, profile, from, |p| p == to)
    }

    fn find_best_path(
        &self,
        map: &TileMap,
        profile: MovementProfile,
        from: Position,
        candidates: &[Position],
    ) -> Option<(Vec<Position>, usize)> {
        if candidates.is_empty() {
            return None;
        }
        let dist = Self::distances(map, profile, from);
        let mut best: Option<(usize, usize)> = None;
        for (idx, candidate) in candidates.iter().enumerate() {
            let Some(&d) = dist.get(candidate) else {
                continue;
            };
            if best.is_some_and(|(_, best_d)| best_d <= d) {
                continue;
            }
            best = Some((idx, d));
        }
        let (idx, _) = best?;
        let path = self.path(map, profile, from, candidates[idx])?;
        Some((path, idx))
    }

    fn path_to_best_fighting_position(
        &self,
        map: &TileMap,
        profile: MovementProfile,
        from: Position,
        targets: &[Position],
        range: f64,
    ) -> Option<Vec<Position>> {
        if targets.is_empty() {
            return None;
        }
        let range_sq = range.max(1.0).powi(2);
        Self::search(map, profile, from, |p| {
            targets.iter().any(|t| p.distance_sq(*t) as f64 <= range_sq)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{Tile, TileKind};

    fn corridor() -> TileMap {
        // 5x3 with a wall column at x=2 except the bottom row.
        let mut map = TileMap::new(5, 3, Tile::floor(TileKind::Dirt));
        map.set_tile(Position::new(2, 0), Tile::wall(TileKind::Rock));
        map.set_tile(Position::new(2, 1), Tile::wall(TileKind::Rock));
        map
    }

    #[test]
    fn path_excludes_start_and_includes_goal() {
        let map = corridor();
        let path = GridPathfinder
            .path(&map, MovementProfile::GROUND, Position::new(0, 0), Position::new(4, 0))
            .expect("reachable");
        assert_ne!(path.first(), Some(&Position::new(0, 0)));
        assert_eq!(path.last(), Some(&Position::new(4, 0)));
        assert_eq!(path.len(), 8);
        assert_eq!(
            GridPathfinder.path(
                &map,
                MovementProfile::GROUND,
                Position::new(1, 1),
                Position::new(1, 1)
            ),
            Some(Vec::new())
        );
    }

    #[test]
    fn walls_are_unreachable() {
        let map = corridor();
        assert!(!GridPathfinder.path_exists(
            &map,
            MovementProfile::GROUND,
            Position::new(0, 0),
            Position::new(2, 0)
        ));
    }

    #[test]
    fn best_path_prefers_first_on_ties() {
        let map = TileMap::new(5, 5, Tile::floor(TileKind::Dirt));
        let from = Position::new(2, 2);
        let candidates = [Position::new(4, 4), Position::new(2, 0), Position::new(0, 2)];
        let (path, idx) = GridPathfinder
            .find_best_path(&map, MovementProfile::GROUND, from, &candidates)
            .expect("reachable");
        assert_eq!(idx, 1);
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn fighting_position_is_empty_when_in_range() {
        let map = TileMap::new(5, 5, Tile::floor(TileKind::Dirt));
        let from = Position::new(1, 1);
        let in_range = GridPathfinder.path_to_best_fighting_position(
            &map,
            MovementProfile::GROUND,
            from,
            &[Position::new(1, 2)],
            1.0,
        );
        assert_eq!(in_range, Some(Vec::new()));
        let walk = GridPathfinder
            .path_to_best_fighting_position(
                &map,
                MovementProfile::GROUND,
                from,
                &[Position::new(4, 1)],
                1.0,
            )
            .expect("reachable");
        assert_eq!(walk.last(), Some(&Position::new(3, 1)));
    }
}
