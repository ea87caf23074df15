use crate::actor::{ActorError, ActorHandle};
use crate::math::Point2d;
use crate::ActorId;
use itertools::iproduct;
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};

/// The default size of a grid cell, in m.
const DEFAULT_CELL_SIZE: f64 = 20.0; // m

/// A spatial index used to find the actors near a vehicle.
pub trait VicinityIndex: Send + Sync {
    /// Inserts the actor, or moves it to its current location.
    fn update(&mut self, actor: &dyn ActorHandle) -> Result<(), ActorError>;

    /// Removes the actor with the given ID, if present.
    fn erase(&mut self, id: ActorId);

    /// Finds the IDs of the actors near the given actor, which may include itself.
    fn query(&self, actor: &dyn ActorHandle) -> Result<HashSet<ActorId>, ActorError>;
}

/// A [VicinityIndex] which buckets actors into a uniform grid.
/// A query returns every actor in the 3x3 block of cells around the actor.
#[derive(Clone, Debug)]
pub struct GridIndex {
    cell_size: f64,
    cells: HashMap<(i64, i64), SmallVec<[ActorId; 8]>>,
    actor_cells: HashMap<ActorId, (i64, i64)>,
}

impl Default for GridIndex {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}

impl GridIndex {
    /// Creates an empty grid. Queries cover at least `cell_size` in every direction.
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
            actor_cells: HashMap::new(),
        }
    }

    /// The number of actors in the grid.
    pub fn len(&self) -> usize {
        self.actor_cells.len()
    }

    /// Whether the grid has no actors.
    pub fn is_empty(&self) -> bool {
        self.actor_cells.is_empty()
    }

    /// Whether the actor with the given ID is in the grid.
    pub fn contains(&self, id: ActorId) -> bool {
        self.actor_cells.contains_key(&id)
    }

    fn cell_of(&self, pos: Point2d) -> (i64, i64) {
        (
            (pos.x / self.cell_size).floor() as i64,
            (pos.y / self.cell_size).floor() as i64,
        )
    }

    fn remove_from_cell(&mut self, id: ActorId, cell: (i64, i64)) {
        if let Some(ids) = self.cells.get_mut(&cell) {
            ids.retain(|other| *other != id);
            if ids.is_empty() {
                self.cells.remove(&cell);
            }
        }
    }
}

impl VicinityIndex for GridIndex {
    fn update(&mut self, actor: &dyn ActorHandle) -> Result<(), ActorError> {
        let id = actor.id();
        let cell = self.cell_of(actor.state()?.position());
        match self.actor_cells.insert(id, cell) {
            Some(old) if old == cell => return Ok(()),
            Some(old) => self.remove_from_cell(id, old),
            None => {}
        }
        self.cells.entry(cell).or_default().push(id);
        Ok(())
    }

    fn erase(&mut self, id: ActorId) {
        if let Some(cell) = self.actor_cells.remove(&id) {
            self.remove_from_cell(id, cell);
        }
    }

    fn query(&self, actor: &dyn ActorHandle) -> Result<HashSet<ActorId>, ActorError> {
        let (cx, cy) = self.cell_of(actor.state()?.position());
        Ok(iproduct!(-1..=1, -1..=1)
            .filter_map(|(dx, dy)| self.cells.get(&(cx + dx, cy + dy)))
            .flatten()
            .copied()
            .collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::actor::{ActorKind, ActorState};
    use crate::math::{Point3d, Vector2d, Vector3d};
    use crate::world::SimWorld;

    fn at(x: f64, y: f64) -> ActorState {
        ActorState {
            location: Point3d::new(x, y, 0.0),
            heading: Vector2d::new(1.0, 0.0),
            velocity: Vector3d::new(0.0, 0.0, 0.0),
            half_length: 2.0,
            half_width: 1.0,
        }
    }

    #[test]
    fn finds_neighbours_only() {
        let world = SimWorld::new();
        let a = world.spawn(ActorKind::Vehicle, at(0.0, 0.0));
        let b = world.spawn(ActorKind::Vehicle, at(15.0, -5.0));
        let c = world.spawn(ActorKind::Vehicle, at(100.0, 0.0));

        let mut grid = GridIndex::default();
        for actor in [&a, &b, &c] {
            grid.update(actor.as_ref()).unwrap();
        }

        let near = grid.query(a.as_ref()).unwrap();
        assert!(near.contains(&a.id()));
        assert!(near.contains(&b.id()));
        assert!(!near.contains(&c.id()));
    }

    #[test]
    fn moves_and_erases() {
        let world = SimWorld::new();
        let a = world.spawn(ActorKind::Vehicle, at(0.0, 0.0));
        let b = world.spawn(ActorKind::Vehicle, at(5.0, 0.0));

        let mut grid = GridIndex::default();
        grid.update(a.as_ref()).unwrap();
        grid.update(b.as_ref()).unwrap();
        assert!(grid.query(a.as_ref()).unwrap().contains(&b.id()));

        b.set_state(at(200.0, 0.0));
        grid.update(b.as_ref()).unwrap();
        assert!(!grid.query(a.as_ref()).unwrap().contains(&b.id()));
        assert_eq!(grid.len(), 2);

        grid.erase(b.id());
        assert!(!grid.contains(b.id()));
        assert!(grid.query(b.as_ref()).unwrap().is_empty());
    }

    #[test]
    fn destroyed_actor_cannot_be_queried() {
        let world = SimWorld::new();
        let a = world.spawn(ActorKind::Vehicle, at(0.0, 0.0));
        let grid = GridIndex::default();
        world.destroy(a.id());
        assert_eq!(grid.query(a.as_ref()), Err(ActorError::Destroyed(a.id())));
    }
}
