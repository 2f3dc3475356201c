//! The starting dungeon the server simulates.
use anyhow::{Context, Result};

use keeper_core::{
    BuildingKind, ObjectKind, Position, RoomKind, Seat, SeatId, Tile, TileKind, TileMap, World,
};
use keeper_runtime::SpeciesCatalog;

pub const KEEPER: SeatId = SeatId(1);
pub const RIVAL: SeatId = SeatId(2);
/// Furious creatures defect to this seat.
pub const ROGUE: SeatId = SeatId(3);

const WIDTH: u32 = 24;
const HEIGHT: u32 = 16;

/// A claimed cave ringed by rock, with a gold seam to the east and a rival
/// war party waiting behind it.
pub fn starting_dungeon(catalog: &SpeciesCatalog) -> Result<World> {
    let mut map = TileMap::new(WIDTH, HEIGHT, Tile::wall(TileKind::Rock));
    for y in 1..HEIGHT as i32 - 1 {
        for x in 1..12 {
            map.set_tile(Position::new(x, y), Tile::claimed(KEEPER));
        }
        for x in 12..16 {
            let kind = if y % 4 == 0 {
                TileKind::Gold
            } else {
                TileKind::Dirt
            };
            let mut wall = Tile::wall(kind);
            if x == 12 {
                wall.set_marked_for_digging(KEEPER, true);
            }
            map.set_tile(Position::new(x, y), wall);
        }
        for x in 16..WIDTH as i32 - 1 {
            map.set_tile(Position::new(x, y), Tile::claimed(RIVAL));
        }
    }

    let mut world = World::new(map);
    world.add_seat(Seat::new(KEEPER, 1).human());
    world.add_seat(Seat::new(RIVAL, 2));
    world.add_seat(Seat::new(ROGUE, 3));
    world.rogue_seat = Some(ROGUE);

    let rooms = [
        (RoomKind::Portal, vec![Position::new(2, 2)]),
        (RoomKind::Treasury, square(4, 2)),
        (RoomKind::Hatchery, square(2, 11)),
        (RoomKind::Dormitory, square(6, 11)),
        (RoomKind::TrainingHall, square(9, 6)),
        (RoomKind::Library, square(6, 6)),
    ];
    for (kind, tiles) in rooms {
        world
            .add_building(BuildingKind::Room(kind), KEEPER, tiles)
            .with_context(|| format!("placing {kind:?}"))?;
    }
    world.spawn_object(ObjectKind::TreasuryGold { amount: 500 }, Position::new(3, 6));

    let party = [
        ("Kobold", KEEPER, Position::new(3, 4)),
        ("Kobold", KEEPER, Position::new(5, 5)),
        ("Kobold", KEEPER, Position::new(9, 3)),
        ("Troll", KEEPER, Position::new(4, 8)),
        ("DarkElf", KEEPER, Position::new(7, 8)),
        ("Goblin", KEEPER, Position::new(10, 10)),
        ("Troll", RIVAL, Position::new(19, 7)),
        ("Goblin", RIVAL, Position::new(20, 9)),
    ];
    for (n, (class, seat, position)) in party.into_iter().enumerate() {
        let definition = catalog
            .get(class)
            .with_context(|| format!("unknown species {class}"))?;
        world
            .spawn_creature(format!("{class}{}", n + 1), seat, definition, position)
            .with_context(|| format!("spawning {class} at {position}"))?;
    }
    Ok(world)
}

fn square(x: i32, y: i32) -> Vec<Position> {
    vec![
        Position::new(x, y),
        Position::new(x + 1, y),
        Position::new(x, y + 1),
        Position::new(x + 1, y + 1),
    ]
}
