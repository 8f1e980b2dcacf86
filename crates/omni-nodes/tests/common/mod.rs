//! Shared fixtures for the node network scenario tests.

#![allow(dead_code)]

use std::cell::Cell;

use omni_nodes::{NetworkConfig, Registry};
use omni_store::MemoryStore;
use omni_types::{ObjectId, ObjectKind, Position, RegionId, WorldObject};
use omni_world::{ConstructionQueue, GridWorld, PathOptions, WorldError, WorldQuery};

/// Everything a session borrows, owned in one place.
pub struct Harness {
    pub world: GridWorld,
    pub store: MemoryStore,
    pub queue: ConstructionQueue,
    pub registry: Registry,
    pub config: NetworkConfig,
}

impl Harness {
    pub fn new(world: GridWorld) -> Self {
        Self {
            world,
            store: MemoryStore::new(),
            queue: ConstructionQueue::new(),
            registry: Registry::new(),
            config: NetworkConfig::default(),
        }
    }
}

/// A world of `regions` laid out left to right, each `size` tiles square.
pub fn row_world(size: i32, regions: &[&str]) -> GridWorld {
    let mut world = GridWorld::new(size).expect("valid region size");
    for (i, name) in regions.iter().enumerate() {
        let x = i32::try_from(i).expect("few regions");
        world.add_region(*name, (x, 0), 7).expect("unique region");
    }
    world
}

pub fn place(world: &mut GridWorld, id: &str, kind: ObjectKind, region: &str, x: i32, y: i32) {
    world
        .add_object(WorldObject {
            id: ObjectId::new(id),
            kind,
            pos: Position::new(region, x, y),
        })
        .expect("unique object");
}

/// Wraps a world and counts the expensive calls made through it.
pub struct CountingWorld<'a> {
    inner: &'a GridWorld,
    paths: Cell<u32>,
    routes: Cell<u32>,
}

impl<'a> CountingWorld<'a> {
    pub const fn new(inner: &'a GridWorld) -> Self {
        Self {
            inner,
            paths: Cell::new(0),
            routes: Cell::new(0),
        }
    }

    pub fn path_searches(&self) -> u32 {
        self.paths.get()
    }

    pub fn route_searches(&self) -> u32 {
        self.routes.get()
    }
}

impl WorldQuery for CountingWorld<'_> {
    fn object(&self, id: &ObjectId) -> Option<WorldObject> {
        self.inner.object(id)
    }

    fn objects_in_range(&self, pos: &Position, range: u32) -> Vec<WorldObject> {
        self.inner.objects_in_range(pos, range)
    }

    fn objects_in_region(&self, region: &RegionId) -> Vec<WorldObject> {
        self.inner.objects_in_region(region)
    }

    fn region_route(&self, from: &RegionId, to: &RegionId) -> Result<Vec<RegionId>, WorldError> {
        self.routes.set(self.routes.get().saturating_add(1));
        self.inner.region_route(from, to)
    }

    fn find_path(&self, from: &Position, to: &Position, options: PathOptions) -> Result<Vec<Position>, WorldError> {
        self.paths.set(self.paths.get().saturating_add(1));
        self.inner.find_path(from, to, options)
    }

    fn region_linear_distance(&self, from: &RegionId, to: &RegionId) -> Option<u32> {
        self.inner.region_linear_distance(from, to)
    }

    fn tile_distance(&self, from: &Position, to: &Position) -> Option<u32> {
        self.inner.tile_distance(from, to)
    }

    fn region_level(&self, region: &RegionId) -> u32 {
        self.inner.region_level(region)
    }
}
