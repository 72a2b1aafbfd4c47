//! Tile directions and the cached neighbor registry.

use crate::partition::WorkerGrid;

/// Direction toward a neighboring tile.
///
/// North is toward smaller `y`, South toward larger `y`, West toward
/// smaller `x`, East toward larger `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Toward smaller y.
    North,
    /// Toward larger y.
    South,
    /// Toward larger x.
    East,
    /// Toward smaller x.
    West,
}

impl Direction {
    /// The opposite direction.
    pub fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }

    /// All four directions.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];
}

/// Index of a tile in the solver's tile table, row-major over the worker
/// grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId(pub usize);

/// The four optional neighbors of one tile.
///
/// A side is `None` exactly when the tile's owned region touches the
/// corresponding global edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Neighborhood {
    /// Neighbor toward smaller y, if any.
    pub north: Option<TileId>,
    /// Neighbor toward larger y, if any.
    pub south: Option<TileId>,
    /// Neighbor toward larger x, if any.
    pub east: Option<TileId>,
    /// Neighbor toward smaller x, if any.
    pub west: Option<TileId>,
}

impl Neighborhood {
    /// The neighbor on `side`, if any.
    pub fn get(&self, side: Direction) -> Option<TileId> {
        match side {
            Direction::North => self.north,
            Direction::South => self.south,
            Direction::East => self.east,
            Direction::West => self.west,
        }
    }
}

/// Neighbor registry for every tile, resolved once from the worker-grid
/// shape and never recomputed during a run.
#[derive(Debug, Clone)]
pub struct Topology {
    grid: WorkerGrid,
    neighbors: Vec<Neighborhood>,
}

impl Topology {
    /// Resolve all neighbor relationships for a worker grid.
    pub fn new(grid: WorkerGrid) -> Self {
        let mut neighbors = Vec::with_capacity(grid.worker_count());
        for ty in 0..grid.py() {
            for tx in 0..grid.px() {
                let north = if ty > 0 {
                    Some(TileId(grid.index_of(tx, ty - 1)))
                } else {
                    None
                };
                let south = if ty + 1 < grid.py() {
                    Some(TileId(grid.index_of(tx, ty + 1)))
                } else {
                    None
                };
                let east = if tx + 1 < grid.px() {
                    Some(TileId(grid.index_of(tx + 1, ty)))
                } else {
                    None
                };
                let west = if tx > 0 {
                    Some(TileId(grid.index_of(tx - 1, ty)))
                } else {
                    None
                };
                neighbors.push(Neighborhood {
                    north,
                    south,
                    east,
                    west,
                });
            }
        }
        Self { grid, neighbors }
    }

    /// The worker-grid shape this registry covers.
    pub fn grid(&self) -> WorkerGrid {
        self.grid
    }

    /// Number of tiles.
    pub fn tile_count(&self) -> usize {
        self.neighbors.len()
    }

    /// The full neighborhood of one tile.
    pub fn neighborhood(&self, id: TileId) -> Neighborhood {
        self.neighbors[id.0]
    }

    /// The neighbor of `id` on `side`, if any.
    pub fn neighbor(&self, id: TileId, side: Direction) -> Option<TileId> {
        self.neighbors[id.0].get(side)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite_is_an_involution() {
        for side in Direction::ALL {
            assert_ne!(side.opposite(), side);
            assert_eq!(side.opposite().opposite(), side);
        }
    }

    #[test]
    fn test_single_tile_has_no_neighbors() {
        let topology = Topology::new(WorkerGrid::new(1, 1).unwrap());
        assert_eq!(topology.tile_count(), 1);
        assert_eq!(topology.neighborhood(TileId(0)), Neighborhood::default());
    }

    #[test]
    fn test_two_by_two_adjacency() {
        let topology = Topology::new(WorkerGrid::new(2, 2).unwrap());
        // Row-major ids: 0 1 / 2 3.
        assert_eq!(topology.neighbor(TileId(0), Direction::East), Some(TileId(1)));
        assert_eq!(topology.neighbor(TileId(0), Direction::South), Some(TileId(2)));
        assert_eq!(topology.neighbor(TileId(0), Direction::North), None);
        assert_eq!(topology.neighbor(TileId(0), Direction::West), None);
        assert_eq!(topology.neighbor(TileId(3), Direction::North), Some(TileId(1)));
        assert_eq!(topology.neighbor(TileId(3), Direction::West), Some(TileId(2)));
        assert_eq!(topology.neighbor(TileId(3), Direction::South), None);
        assert_eq!(topology.neighbor(TileId(3), Direction::East), None);
    }

    #[test]
    fn test_neighbors_absent_exactly_at_grid_edges() {
        let grid = WorkerGrid::new(3, 4).unwrap();
        let topology = Topology::new(grid);
        for ty in 0..4 {
            for tx in 0..3 {
                let hood = topology.neighborhood(TileId(grid.index_of(tx, ty)));
                assert_eq!(hood.north.is_none(), ty == 0);
                assert_eq!(hood.south.is_none(), ty == 3);
                assert_eq!(hood.west.is_none(), tx == 0);
                assert_eq!(hood.east.is_none(), tx == 2);
            }
        }
    }

    #[test]
    fn test_adjacency_is_symmetric() {
        let grid = WorkerGrid::new(3, 3).unwrap();
        let topology = Topology::new(grid);
        for id in 0..topology.tile_count() {
            for side in Direction::ALL {
                if let Some(other) = topology.neighbor(TileId(id), side) {
                    assert_eq!(
                        topology.neighbor(other, side.opposite()),
                        Some(TileId(id))
                    );
                }
            }
        }
    }
}
