//! In-memory tile world: square regions on a grid.
//!
//! A [`GridWorld`] is a set of equally sized square regions placed at
//! integer grid coordinates. Regions that share an edge are connected, and
//! tiles can be walked across region borders. Region routes are found by
//! BFS over the region grid; tile paths by BFS over walkable tiles with
//! king moves, which gives shortest paths because every step costs one.
//!
//! Internally every tile has a global coordinate,
//! `region_coord * region_size + local`, so that range checks and path
//! searches never need to special-case borders.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use omni_types::{ObjectId, ObjectKind, Position, RegionId, StructureKind, WorldObject};

use crate::error::WorldError;
use crate::query::{ConstructionRequest, PathOptions, WorldQuery};

/// Region size used by [`GridWorld::default`].
pub const DEFAULT_REGION_SIZE: i32 = 50;

/// King-move neighbour offsets, orthogonal first so ties prefer straight
/// steps.
const NEIGHBOURS: [(i32, i32); 8] = [
    (0, -1),
    (1, 0),
    (0, 1),
    (-1, 0),
    (1, -1),
    (1, 1),
    (-1, 1),
    (-1, -1),
];

/// Edge-sharing region offsets.
const REGION_NEIGHBOURS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

type Global = (i32, i32);

#[derive(Debug, Clone, PartialEq, Eq)]
struct RegionState {
    coord: (i32, i32),
    level: u32,
    walls: BTreeSet<(i32, i32)>,
}

/// An in-memory world of square regions laid out on a grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridWorld {
    /// Width and height of every region, in tiles.
    region_size: i32,
    /// All regions indexed by id.
    regions: BTreeMap<RegionId, RegionState>,
    /// Reverse index: grid coordinate -> region id.
    by_coord: BTreeMap<(i32, i32), RegionId>,
    /// All objects indexed by id.
    objects: BTreeMap<ObjectId, WorldObject>,
    /// Object ids in insertion order; defines "world order" for queries.
    order: Vec<ObjectId>,
}

impl GridWorld {
    /// Create an empty world whose regions are `region_size` tiles square.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidLayout`] if `region_size` is not positive.
    pub fn new(region_size: i32) -> Result<Self, WorldError> {
        if region_size < 1 {
            return Err(WorldError::InvalidLayout {
                reason: format!("region size must be at least 1, got {region_size}"),
            });
        }
        Ok(Self {
            region_size,
            regions: BTreeMap::new(),
            by_coord: BTreeMap::new(),
            objects: BTreeMap::new(),
            order: Vec::new(),
        })
    }

    /// Region width and height in tiles.
    pub const fn region_size(&self) -> i32 {
        self.region_size
    }

    // -------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------

    /// Add a region at grid coordinate `coord` with development `level`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateRegion`] if the id or the coordinate is
    /// already taken.
    pub fn add_region(
        &mut self,
        id: impl Into<RegionId>,
        coord: (i32, i32),
        level: u32,
    ) -> Result<(), WorldError> {
        let id = id.into();
        if self.regions.contains_key(&id) || self.by_coord.contains_key(&coord) {
            return Err(WorldError::DuplicateRegion(id));
        }
        self.by_coord.insert(coord, id.clone());
        self.regions.insert(
            id,
            RegionState {
                coord,
                level,
                walls: BTreeSet::new(),
            },
        );
        Ok(())
    }

    /// Change the development level of a region.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::RegionNotFound`] if the region does not exist.
    pub fn set_region_level(&mut self, region: &RegionId, level: u32) -> Result<(), WorldError> {
        let state = self
            .regions
            .get_mut(region)
            .ok_or_else(|| WorldError::RegionNotFound(region.clone()))?;
        state.level = level;
        Ok(())
    }

    /// Mark a tile as impassable terrain.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] if the tile is outside its region.
    pub fn add_wall(&mut self, pos: &Position) -> Result<(), WorldError> {
        if !self.in_bounds(pos.x, pos.y) {
            return Err(WorldError::OutOfBounds(pos.clone()));
        }
        let state = self
            .regions
            .get_mut(&pos.region)
            .ok_or_else(|| WorldError::RegionNotFound(pos.region.clone()))?;
        state.walls.insert((pos.x, pos.y));
        Ok(())
    }

    /// Add an object to the world.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::RegionNotFound`] or [`WorldError::OutOfBounds`]
    /// for a bad position, or [`WorldError::DuplicateObject`] if the id is
    /// taken.
    pub fn add_object(&mut self, object: WorldObject) -> Result<(), WorldError> {
        if !self.regions.contains_key(&object.pos.region) {
            return Err(WorldError::RegionNotFound(object.pos.region.clone()));
        }
        if !self.in_bounds(object.pos.x, object.pos.y) {
            return Err(WorldError::OutOfBounds(object.pos));
        }
        if self.objects.contains_key(&object.id) {
            return Err(WorldError::DuplicateObject(object.id));
        }
        self.order.push(object.id.clone());
        self.objects.insert(object.id.clone(), object);
        Ok(())
    }

    /// Remove an object, returning it if it existed.
    pub fn remove_object(&mut self, id: &ObjectId) -> Option<WorldObject> {
        let removed = self.objects.remove(id)?;
        self.order.retain(|o| o != id);
        Some(removed)
    }

    /// All region ids, in id order.
    pub fn region_ids(&self) -> Vec<RegionId> {
        self.regions.keys().cloned().collect()
    }

    /// Number of objects in the world.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Turn construction requests into construction sites.
    ///
    /// A request is skipped if its tile already holds a structure or site of
    /// the same kind, or lies outside the world. Returns the number of sites
    /// created.
    pub fn place_sites(&mut self, requests: &[ConstructionRequest]) -> usize {
        let mut placed: usize = 0;
        for request in requests {
            let occupied = self.objects_at(&request.pos).iter().any(|o| {
                o.kind.is_built(request.kind) || o.kind.is_site(request.kind)
            });
            if occupied {
                continue;
            }
            let site = WorldObject {
                id: ObjectId::new(structure_object_id(request.kind, &request.pos)),
                kind: ObjectKind::ConstructionSite(request.kind),
                pos: request.pos.clone(),
            };
            match self.add_object(site) {
                Ok(()) => placed = placed.saturating_add(1),
                Err(err) => tracing::debug!(%err, "Construction site rejected"),
            }
        }
        placed
    }

    /// Finish every construction site, turning it into the built structure.
    /// Returns the number of structures completed.
    pub fn complete_sites(&mut self) -> usize {
        let mut completed: usize = 0;
        for object in self.objects.values_mut() {
            let ObjectKind::ConstructionSite(kind) = object.kind else {
                continue;
            };
            object.kind = match kind {
                StructureKind::Container => ObjectKind::Container,
                StructureKind::Road => ObjectKind::Road,
                StructureKind::Storage => ObjectKind::Storage,
                StructureKind::Extractor => ObjectKind::Extractor,
            };
            completed = completed.saturating_add(1);
        }
        completed
    }

    // -------------------------------------------------------------------
    // Geometry helpers
    // -------------------------------------------------------------------

    const fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.region_size && y < self.region_size
    }

    fn to_global(&self, pos: &Position) -> Option<Global> {
        if !self.in_bounds(pos.x, pos.y) {
            return None;
        }
        let region = self.regions.get(&pos.region)?;
        let gx = region.coord.0.checked_mul(self.region_size)?.checked_add(pos.x)?;
        let gy = region.coord.1.checked_mul(self.region_size)?.checked_add(pos.y)?;
        Some((gx, gy))
    }

    fn from_global(&self, (gx, gy): Global) -> Option<Position> {
        let coord = (gx.div_euclid(self.region_size), gy.div_euclid(self.region_size));
        let region = self.by_coord.get(&coord)?;
        Some(Position::new(
            region.clone(),
            gx.rem_euclid(self.region_size),
            gy.rem_euclid(self.region_size),
        ))
    }

    fn objects_at(&self, pos: &Position) -> Vec<&WorldObject> {
        self.order
            .iter()
            .filter_map(|id| self.objects.get(id))
            .filter(|o| o.pos == *pos)
            .collect()
    }

    /// Global tiles blocked by solid objects.
    fn obstacles(&self) -> BTreeSet<Global> {
        self.objects
            .values()
            .filter(|o| is_obstacle(&o.kind))
            .filter_map(|o| self.to_global(&o.pos))
            .collect()
    }

    fn walkable(&self, tile: Global, obstacles: &BTreeSet<Global>) -> bool {
        if obstacles.contains(&tile) {
            return false;
        }
        self.from_global(tile).is_some_and(|pos| {
            self.regions
                .get(&pos.region)
                .is_some_and(|r| !r.walls.contains(&(pos.x, pos.y)))
        })
    }
}

impl Default for GridWorld {
    fn default() -> Self {
        Self {
            region_size: DEFAULT_REGION_SIZE,
            regions: BTreeMap::new(),
            by_coord: BTreeMap::new(),
            objects: BTreeMap::new(),
            order: Vec::new(),
        }
    }
}

/// Deterministic id for a structure placed through the construction queue.
fn structure_object_id(kind: StructureKind, pos: &Position) -> String {
    let name = match kind {
        StructureKind::Container => "container",
        StructureKind::Road => "road",
        StructureKind::Storage => "storage",
        StructureKind::Extractor => "extractor",
    };
    format!("{name}-{}-{}-{}", pos.region, pos.x, pos.y)
}

/// Objects that cannot be walked through.
const fn is_obstacle(kind: &ObjectKind) -> bool {
    matches!(
        kind,
        ObjectKind::Source
            | ObjectKind::Mineral
            | ObjectKind::Deposit
            | ObjectKind::Spawn
            | ObjectKind::Storage
            | ObjectKind::Extractor
    )
}

const fn chebyshev(a: Global, b: Global) -> u32 {
    let dx = a.0.abs_diff(b.0);
    let dy = a.1.abs_diff(b.1);
    if dx > dy { dx } else { dy }
}

impl WorldQuery for GridWorld {
    fn object(&self, id: &ObjectId) -> Option<WorldObject> {
        self.objects.get(id).cloned()
    }

    fn objects_in_range(&self, pos: &Position, range: u32) -> Vec<WorldObject> {
        let Some(center) = self.to_global(pos) else {
            return Vec::new();
        };
        self.order
            .iter()
            .filter_map(|id| self.objects.get(id))
            .filter(|o| {
                self.to_global(&o.pos)
                    .is_some_and(|g| chebyshev(center, g) <= range)
            })
            .cloned()
            .collect()
    }

    fn objects_in_region(&self, region: &RegionId) -> Vec<WorldObject> {
        self.order
            .iter()
            .filter_map(|id| self.objects.get(id))
            .filter(|o| o.pos.region == *region)
            .cloned()
            .collect()
    }

    fn region_route(&self, from: &RegionId, to: &RegionId) -> Result<Vec<RegionId>, WorldError> {
        let start = self
            .regions
            .get(from)
            .ok_or_else(|| WorldError::RegionNotFound(from.clone()))?
            .coord;
        let goal = self
            .regions
            .get(to)
            .ok_or_else(|| WorldError::RegionNotFound(to.clone()))?
            .coord;
        if start == goal {
            return Ok(Vec::new());
        }

        let mut prev: BTreeMap<(i32, i32), (i32, i32)> = BTreeMap::new();
        let mut queue = VecDeque::new();
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            for (dx, dy) in REGION_NEIGHBOURS {
                let (Some(nx), Some(ny)) = (current.0.checked_add(dx), current.1.checked_add(dy))
                else {
                    continue;
                };
                let next = (nx, ny);
                if next == start || prev.contains_key(&next) || !self.by_coord.contains_key(&next) {
                    continue;
                }
                prev.insert(next, current);
                if next == goal {
                    queue.clear();
                    break;
                }
                queue.push_back(next);
            }
        }

        if !prev.contains_key(&goal) {
            return Err(WorldError::NoRegionRoute {
                from: from.clone(),
                to: to.clone(),
            });
        }

        let mut route = VecDeque::new();
        let mut current = goal;
        while current != start {
            if let Some(id) = self.by_coord.get(&current) {
                route.push_front(id.clone());
            }
            let Some(&predecessor) = prev.get(&current) else {
                break;
            };
            current = predecessor;
        }
        Ok(route.into_iter().collect())
    }

    fn find_path(
        &self,
        from: &Position,
        to: &Position,
        options: PathOptions,
    ) -> Result<Vec<Position>, WorldError> {
        let start = self
            .to_global(from)
            .ok_or_else(|| WorldError::OutOfBounds(from.clone()))?;
        let goal = self
            .to_global(to)
            .ok_or_else(|| WorldError::OutOfBounds(to.clone()))?;
        if chebyshev(start, goal) <= options.range {
            return Ok(Vec::new());
        }

        let obstacles = self.obstacles();
        let mut prev: BTreeMap<Global, Global> = BTreeMap::new();
        let mut visited: BTreeSet<Global> = BTreeSet::new();
        let mut queue = VecDeque::new();
        let mut ops: u32 = 0;
        visited.insert(start);
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            ops = ops.saturating_add(1);
            if ops > options.max_ops {
                return Err(WorldError::SearchBudgetExhausted {
                    from: from.clone(),
                    max_ops: options.max_ops,
                });
            }
            for (dx, dy) in NEIGHBOURS {
                let (Some(nx), Some(ny)) = (current.0.checked_add(dx), current.1.checked_add(dy))
                else {
                    continue;
                };
                let next = (nx, ny);
                if visited.contains(&next) || !self.walkable(next, &obstacles) {
                    continue;
                }
                visited.insert(next);
                prev.insert(next, current);
                if chebyshev(next, goal) <= options.range {
                    return Ok(self.reconstruct(&prev, start, next));
                }
                queue.push_back(next);
            }
        }

        Err(WorldError::NoPath {
            from: from.clone(),
            to: to.clone(),
        })
    }

    fn region_linear_distance(&self, from: &RegionId, to: &RegionId) -> Option<u32> {
        let a = self.regions.get(from)?.coord;
        let b = self.regions.get(to)?.coord;
        Some(chebyshev(a, b))
    }

    fn tile_distance(&self, from: &Position, to: &Position) -> Option<u32> {
        Some(chebyshev(self.to_global(from)?, self.to_global(to)?))
    }

    fn region_level(&self, region: &RegionId) -> u32 {
        self.regions.get(region).map_or(0, |r| r.level)
    }
}

impl GridWorld {
    fn reconstruct(&self, prev: &BTreeMap<Global, Global>, start: Global, end: Global) -> Vec<Position> {
        let mut tiles = VecDeque::new();
        let mut current = end;
        while current != start {
            tiles.push_front(current);
            let Some(&predecessor) = prev.get(&current) else {
                break;
            };
            current = predecessor;
        }
        tiles
            .into_iter()
            .filter_map(|g| self.from_global(g))
            .collect()
    }
}
