//! Default starting map for the headless engine and scenario tests.
//!
//! Three 20x20 regions in a row. The home region holds the only spawn, two
//! sources and a mineral; the two outer regions each hold one remote source.
//! A partial wall in the middle region forces remote paths to bend.
//!
//! ```text
//!   W1N1 (home, level 7)   W2N1 (level 0)   W3N1 (level 0)
//! ```

use omni_types::{ObjectId, ObjectKind, Position, WorldObject};

use crate::error::WorldError;
use crate::grid::GridWorld;

/// Side length of every starting region.
pub const STARTING_REGION_SIZE: i32 = 20;

/// Identifiers of the notable starting objects.
#[derive(Debug, Clone)]
pub struct StartingObjectIds {
    /// The home spawn; the network's only sink.
    pub spawn: ObjectId,
    /// Home source near the spawn.
    pub home_source_a: ObjectId,
    /// Second home source.
    pub home_source_b: ObjectId,
    /// Home mineral (gated on region level).
    pub home_mineral: ObjectId,
    /// Source in the adjacent region.
    pub east_source: ObjectId,
    /// Source two regions away.
    pub far_source: ObjectId,
}

fn place(world: &mut GridWorld, id: &str, kind: ObjectKind, pos: Position) -> Result<ObjectId, WorldError> {
    let id = ObjectId::new(id);
    world.add_object(WorldObject {
        id: id.clone(),
        kind,
        pos,
    })?;
    Ok(id)
}

/// Build the starting world.
///
/// # Errors
///
/// Returns a [`WorldError`] only if the hard-coded layout is inconsistent.
pub fn create_starting_world() -> Result<(GridWorld, StartingObjectIds), WorldError> {
    let mut world = GridWorld::new(STARTING_REGION_SIZE)?;
    world.add_region("W1N1", (0, 0), 7)?;
    world.add_region("W2N1", (1, 0), 0)?;
    world.add_region("W3N1", (2, 0), 0)?;

    for y in 0..12 {
        world.add_wall(&Position::new("W2N1", 5, y))?;
    }

    let spawn = place(&mut world, "spawn-home", ObjectKind::Spawn, Position::new("W1N1", 10, 10))?;
    let home_source_a = place(&mut world, "src-home-a", ObjectKind::Source, Position::new("W1N1", 3, 4))?;
    let home_source_b = place(&mut world, "src-home-b", ObjectKind::Source, Position::new("W1N1", 16, 15))?;
    let home_mineral = place(&mut world, "min-home", ObjectKind::Mineral, Position::new("W1N1", 4, 16))?;
    let east_source = place(&mut world, "src-east", ObjectKind::Source, Position::new("W2N1", 8, 6))?;
    let far_source = place(&mut world, "src-far", ObjectKind::Source, Position::new("W3N1", 12, 6))?;

    Ok((
        world,
        StartingObjectIds {
            spawn,
            home_source_a,
            home_source_b,
            home_mineral,
            east_source,
            far_source,
        },
    ))
}
