//! Spatial chunk index over the toroidal domain
//!
//! The domain is cut into square cells whose edge equals the interaction
//! radius, so every particle that can influence a query particle sits in the
//! block of cells around the query's own cell. Cells past a domain edge wrap
//! around, and the particles returned from them are translated by whole domain
//! lengths: distances against the query position are then plain Euclidean
//! distances along the shortest toroidal path.
//!
//! When the domain extent is not a multiple of the radius the last cell on that
//! axis is narrower than the radius, and the search reach on that axis grows
//! from one to two cells so nothing in range is skipped.
//!
//! An axis never has more than [`MAX_CELLS_PER_AXIS`] cells. Past that the
//! cells are stretched to split the axis evenly, which keeps them at least as
//! wide as the radius.
//!
//! Correct results need the interaction radius to be at most half of each
//! domain side (the engine clamps it to that).

use crate::params::validate_interaction_radius;
use glam::Vec2;
use particle_physics::{ConfigError, Domain, Particle};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Upper bound on the cell count along either axis
pub const MAX_CELLS_PER_AXIS: usize = 512;

/// Copy of a particle as seen from a query cell
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbour {
    /// Position, possibly translated outside the domain
    pub position: Vec2,
    pub group: usize,
}

impl From<&Particle> for Neighbour {
    fn from(particle: &Particle) -> Self {
        Self {
            position: particle.position(),
            group: particle.group(),
        }
    }
}

/// Contract shared by the chunk index variants.
///
/// Rebuilt once per tick: `reset`, then `add` for every particle, then any
/// number of `neighbours_for` queries (possibly from many threads).
pub trait ChunkIndex: Send + Sync {
    /// Empty every cell and drop any memoized query results
    fn reset(&mut self);

    /// Insert a particle into the cell under its position.
    ///
    /// Positions outside the grid (for instance after the radius changed and the
    /// grid was not resized) fold back modulo the grid dimensions.
    fn add(&mut self, particle: &Particle);

    /// Every particle in the cell block around `position`, translated across the
    /// periodic boundary where the block wraps
    fn neighbours_for(&self, position: Vec2) -> Arc<[Neighbour]>;

    /// Current cell edge length
    fn cell_size(&self) -> f32;

    /// Re-cut the grid for a new interaction radius. Empties the index.
    fn resize(&mut self, interaction_radius: f32) -> Result<(), ConfigError>;
}

/// Plain chunk grid, recomputing the neighbourhood on every query
#[derive(Debug, Clone)]
pub struct ChunkGrid {
    domain: Domain,
    /// Radius the grid was cut for
    cell_size: f32,
    /// Actual cell edges, equal to `cell_size` unless the axis was capped
    edge_x: f32,
    edge_y: f32,
    cells_x: usize,
    cells_y: usize,
    reach_x: i64,
    reach_y: i64,
    cells: Vec<Vec<Neighbour>>,
}

impl ChunkGrid {
    pub fn new(domain: Domain, interaction_radius: f32) -> Result<Self, ConfigError> {
        let mut grid = Self {
            domain,
            cell_size: interaction_radius,
            edge_x: interaction_radius,
            edge_y: interaction_radius,
            cells_x: 1,
            cells_y: 1,
            reach_x: 1,
            reach_y: 1,
            cells: Vec::new(),
        };
        grid.layout(interaction_radius)?;
        Ok(grid)
    }

    fn layout(&mut self, cell_size: f32) -> Result<(), ConfigError> {
        validate_interaction_radius(cell_size)?;
        let (cells_x, edge_x, reach_x) = axis_layout(self.domain.width(), cell_size);
        let (cells_y, edge_y, reach_y) = axis_layout(self.domain.height(), cell_size);

        self.cell_size = cell_size;
        self.edge_x = edge_x;
        self.edge_y = edge_y;
        self.cells_x = cells_x;
        self.cells_y = cells_y;
        self.reach_x = reach_x;
        self.reach_y = reach_y;
        self.cells = vec![Vec::new(); cells_x * cells_y];
        Ok(())
    }

    /// Number of cells along x and y
    pub fn dimensions(&self) -> (usize, usize) {
        (self.cells_x, self.cells_y)
    }

    /// Cells searched on each side of the query cell, along x and y
    pub fn reach(&self) -> (i64, i64) {
        (self.reach_x, self.reach_y)
    }

    /// Total number of particles stored
    pub fn len(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Vec::is_empty)
    }

    /// Cell under `position`
    pub fn cell_of(&self, position: Vec2) -> (usize, usize) {
        (
            axis_cell(position.x, self.edge_x, self.cells_x),
            axis_cell(position.y, self.edge_y, self.cells_y),
        )
    }

    fn cell(&self, x: usize, y: usize) -> &[Neighbour] {
        &self.cells[y * self.cells_x + x]
    }

    /// Unwrapped cell coordinates around `cell`, row by row
    fn neighbourhood(&self, (x, y): (usize, usize)) -> impl Iterator<Item = (i64, i64)> {
        let (x, y) = (x as i64, y as i64);
        let (reach_x, reach_y) = (self.reach_x, self.reach_y);
        (y - reach_y..=y + reach_y)
            .flat_map(move |uy| (x - reach_x..=x + reach_x).map(move |ux| (ux, uy)))
    }

    /// Contents of the unwrapped cell `(ux, uy)`, translated by the number of
    /// domain lengths it lies away from the grid
    fn images_of(&self, ux: i64, uy: i64) -> impl Iterator<Item = Neighbour> + '_ {
        let (nx, ny) = (self.cells_x as i64, self.cells_y as i64);
        let shift = Vec2::new(
            ux.div_euclid(nx) as f32 * self.domain.width(),
            uy.div_euclid(ny) as f32 * self.domain.height(),
        );
        self.cell(ux.rem_euclid(nx) as usize, uy.rem_euclid(ny) as usize)
            .iter()
            .map(move |neighbour| Neighbour {
                position: neighbour.position + shift,
                group: neighbour.group,
            })
    }
}

impl ChunkIndex for ChunkGrid {
    fn reset(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
    }

    fn add(&mut self, particle: &Particle) {
        let (x, y) = self.cell_of(particle.position());
        let index = y * self.cells_x + x;
        self.cells[index].push(Neighbour::from(particle));
    }

    fn neighbours_for(&self, position: Vec2) -> Arc<[Neighbour]> {
        self.neighbourhood(self.cell_of(position))
            .flat_map(|(ux, uy)| self.images_of(ux, uy))
            .collect()
    }

    fn cell_size(&self) -> f32 {
        self.cell_size
    }

    fn resize(&mut self, interaction_radius: f32) -> Result<(), ConfigError> {
        self.layout(interaction_radius)
    }
}

/// Chunk grid that memoizes query results until the next reset.
///
/// Particles sharing a cell share a neighbourhood, so both the translated
/// contents of each visited cell and the union per query cell are computed
/// once per tick. Queries may run concurrently; the memo tables sit behind
/// `RwLock`s.
#[derive(Debug)]
pub struct CachedChunkGrid {
    grid: ChunkGrid,
    images: RwLock<HashMap<(i64, i64), Arc<[Neighbour]>>>,
    unions: RwLock<HashMap<(usize, usize), Arc<[Neighbour]>>>,
}

impl CachedChunkGrid {
    pub fn new(domain: Domain, interaction_radius: f32) -> Result<Self, ConfigError> {
        Ok(Self {
            grid: ChunkGrid::new(domain, interaction_radius)?,
            images: RwLock::new(HashMap::new()),
            unions: RwLock::new(HashMap::new()),
        })
    }

    pub fn grid(&self) -> &ChunkGrid {
        &self.grid
    }

    fn clear_memo(&mut self) {
        let images = self.images.get_mut().unwrap_or_else(PoisonError::into_inner);
        if !images.is_empty() {
            images.clear();
        }
        let unions = self.unions.get_mut().unwrap_or_else(PoisonError::into_inner);
        if !unions.is_empty() {
            unions.clear();
        }
    }

    fn cell_images(&self, ux: i64, uy: i64) -> Arc<[Neighbour]> {
        if let Some(hit) = read(&self.images).get(&(ux, uy)) {
            return Arc::clone(hit);
        }
        let images: Arc<[Neighbour]> = self.grid.images_of(ux, uy).collect();
        Arc::clone(write(&self.images).entry((ux, uy)).or_insert(images))
    }
}

impl ChunkIndex for CachedChunkGrid {
    fn reset(&mut self) {
        self.grid.reset();
        self.clear_memo();
    }

    fn add(&mut self, particle: &Particle) {
        // Results memoized before this insert no longer hold
        self.clear_memo();
        self.grid.add(particle);
    }

    fn neighbours_for(&self, position: Vec2) -> Arc<[Neighbour]> {
        let cell = self.grid.cell_of(position);
        if let Some(hit) = read(&self.unions).get(&cell) {
            return Arc::clone(hit);
        }

        let mut union = Vec::new();
        for (ux, uy) in self.grid.neighbourhood(cell) {
            union.extend_from_slice(&self.cell_images(ux, uy));
        }
        let union: Arc<[Neighbour]> = union.into();
        Arc::clone(write(&self.unions).entry(cell).or_insert(union))
    }

    fn cell_size(&self) -> f32 {
        self.grid.cell_size()
    }

    fn resize(&mut self, interaction_radius: f32) -> Result<(), ConfigError> {
        self.grid.resize(interaction_radius)?;
        self.clear_memo();
        Ok(())
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Cell count, cell edge and search reach along one axis
fn axis_layout(extent: f32, cell_size: f32) -> (usize, f32, i64) {
    let wanted = (extent / cell_size).ceil();
    if wanted > MAX_CELLS_PER_AXIS as f32 {
        // Even split, so there is no narrow trailing cell
        let edge = extent / MAX_CELLS_PER_AXIS as f32;
        return (MAX_CELLS_PER_AXIS, edge, 1);
    }

    let cells = wanted.max(1.0) as usize;
    let trailing = extent - (cells - 1) as f32 * cell_size;
    // A narrow trailing cell puts in-range particles up to two cells away across the seam
    let reach = if trailing < cell_size * (1.0 - 1e-4) { 2 } else { 1 };
    (cells, cell_size, reach)
}

fn axis_cell(value: f32, edge: f32, cells: usize) -> usize {
    let index = (value / edge).floor() as i64;
    let last = cells as i64 - 1;
    // Rounding can push a position just below the far edge one cell past the end
    if index == last + 1 && value >= 0.0 && value < edge * cells as f32 {
        return last as usize;
    }
    index.rem_euclid(cells as i64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain(width: u32, height: u32) -> Domain {
        Domain::new(width, height).unwrap()
    }

    fn particle(x: f32, y: f32, group: u32) -> Particle {
        Particle::new(Vec2::new(x, y), group)
    }

    fn contains(neighbours: &[Neighbour], x: f32, y: f32) -> bool {
        neighbours
            .iter()
            .any(|n| (n.position - Vec2::new(x, y)).length() < 1e-4)
    }

    #[test]
    fn test_grid_dimensions_follow_radius() {
        let grid = ChunkGrid::new(domain(500, 300), 100.0).unwrap();
        assert_eq!(grid.dimensions(), (5, 3));
        assert_eq!(grid.reach(), (1, 1));

        let grid = ChunkGrid::new(domain(500, 300), 120.0).unwrap();
        assert_eq!(grid.dimensions(), (5, 3));
        assert_eq!(grid.reach(), (2, 2));

        assert!(ChunkGrid::new(domain(500, 300), 0.0).is_err());
        assert!(CachedChunkGrid::new(domain(500, 300), -1.0).is_err());
    }

    #[test]
    fn test_out_of_range_positions_fold_back() {
        let grid = ChunkGrid::new(domain(500, 500), 100.0).unwrap();
        assert_eq!(grid.cell_of(Vec2::new(250.0, 499.0)), (2, 4));
        assert_eq!(grid.cell_of(Vec2::new(730.0, 20.0)), (2, 0));
        assert_eq!(grid.cell_of(Vec2::new(-10.0, 5.0)), (4, 0));
    }

    #[test]
    fn test_stale_grid_still_accepts_particles() {
        // Grid cut for radius 100, particles placed as if cells were 10 wide
        let mut grid = ChunkGrid::new(domain(500, 500), 100.0).unwrap();
        grid.reset();
        grid.add(&particle(499.0, 499.0, 0));
        grid.add(&particle(1e6, -1e6, 1));
        assert_eq!(grid.len(), 2);
    }

    #[test]
    fn test_neighbours_across_edges_are_translated() {
        let mut grid = ChunkGrid::new(domain(500, 500), 100.0).unwrap();
        grid.add(&particle(495.0, 250.0, 0));
        grid.add(&particle(495.0, 495.0, 1));
        grid.add(&particle(250.0, 250.0, 2));

        let neighbours = grid.neighbours_for(Vec2::new(5.0, 250.0));
        assert!(contains(&neighbours, -5.0, 250.0));
        assert!(!contains(&neighbours, 250.0, 250.0));

        let neighbours = grid.neighbours_for(Vec2::new(5.0, 5.0));
        assert!(contains(&neighbours, -5.0, -5.0));
        assert_eq!(neighbours[0].group, 1);
    }

    #[test]
    fn test_narrow_trailing_cell_widens_search() {
        // 500 / 120 leaves a 20-wide last column; x = 410 is 100 away across the seam
        let mut grid = ChunkGrid::new(domain(500, 500), 120.0).unwrap();
        grid.add(&particle(410.0, 250.0, 0));

        let neighbours = grid.neighbours_for(Vec2::new(10.0, 250.0));
        assert!(contains(&neighbours, -90.0, 250.0));
    }

    #[test]
    fn test_reset_empties_cells() {
        let mut grid = ChunkGrid::new(domain(300, 300), 100.0).unwrap();
        grid.add(&particle(10.0, 10.0, 0));
        assert!(!grid.is_empty());
        grid.reset();
        assert!(grid.is_empty());
        assert!(grid.neighbours_for(Vec2::new(10.0, 10.0)).is_empty());
    }

    #[test]
    fn test_resize_recuts_the_grid() {
        let mut grid = ChunkGrid::new(domain(400, 400), 100.0).unwrap();
        grid.add(&particle(10.0, 10.0, 0));
        grid.resize(50.0).unwrap();
        assert_eq!(grid.cell_size(), 50.0);
        assert_eq!(grid.dimensions(), (8, 8));
        assert!(grid.is_empty());
        assert!(grid.resize(f32::NAN).is_err());
    }

    #[test]
    fn test_tiny_radius_caps_the_cell_count() {
        let mut grid = ChunkGrid::new(domain(500, 300), 1e-30).unwrap();
        assert_eq!(grid.dimensions(), (MAX_CELLS_PER_AXIS, MAX_CELLS_PER_AXIS));
        assert_eq!(grid.reach(), (1, 1));
        assert_eq!(grid.cell_size(), 1e-30);

        grid.add(&particle(499.999, 299.999, 0));
        assert_eq!(grid.cell_of(Vec2::new(499.999, 299.999)), (511, 511));
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn test_capped_cells_still_see_close_pairs_across_edges() {
        // 700 cells wanted, 512 kept, each 500 / 512 wide
        let mut grid = ChunkGrid::new(domain(500, 500), 500.0 / 700.0).unwrap();
        grid.add(&particle(1.2, 10.0, 0));
        grid.add(&particle(499.8, 10.0, 1));

        // Query in cell 0, neighbours in cell 1 and across the seam in cell 511
        let neighbours = grid.neighbours_for(Vec2::new(0.5, 10.0));
        assert!(contains(&neighbours, 1.2, 10.0));
        assert!(contains(&neighbours, -0.2, 10.0));
    }

    #[test]
    fn test_failed_resize_leaves_the_grid_intact() {
        let mut grid = CachedChunkGrid::new(domain(400, 400), 100.0).unwrap();
        grid.add(&particle(10.0, 10.0, 0));
        assert!(grid.resize(0.0).is_err());
        assert_eq!(grid.cell_size(), 100.0);
        assert_eq!(grid.grid().dimensions(), (4, 4));
        assert!(contains(&grid.neighbours_for(Vec2::new(20.0, 20.0)), 10.0, 10.0));
    }

    #[test]
    fn test_cached_grid_matches_plain_grid() {
        let mut plain = ChunkGrid::new(domain(300, 200), 60.0).unwrap();
        let mut cached = CachedChunkGrid::new(domain(300, 200), 60.0).unwrap();
        for i in 0..60 {
            let p = particle((i * 37 % 300) as f32 + 0.5, (i * 53 % 200) as f32 + 0.25, i % 3);
            plain.add(&p);
            cached.add(&p);
        }

        for query in [
            Vec2::new(0.0, 0.0),
            Vec2::new(299.0, 199.0),
            Vec2::new(150.0, 100.0),
            Vec2::new(10.0, 190.0),
        ] {
            assert_eq!(plain.neighbours_for(query), cached.neighbours_for(query));
            // Second lookup hits the memo
            assert_eq!(plain.neighbours_for(query), cached.neighbours_for(query));
        }
    }

    #[test]
    fn test_cached_grid_forgets_results_on_reset() {
        let mut cached = CachedChunkGrid::new(domain(300, 300), 100.0).unwrap();
        cached.add(&particle(50.0, 50.0, 0));
        let query = Vec2::new(60.0, 60.0);
        assert!(contains(&cached.neighbours_for(query), 50.0, 50.0));

        cached.reset();
        cached.add(&particle(70.0, 70.0, 1));

        let neighbours = cached.neighbours_for(query);
        assert!(!contains(&neighbours, 50.0, 50.0));
        assert!(contains(&neighbours, 70.0, 70.0));
    }

    #[test]
    fn test_cached_grid_is_queryable_from_many_threads() {
        let mut cached = CachedChunkGrid::new(domain(300, 300), 100.0).unwrap();
        for i in 0..30 {
            cached.add(&particle(i as f32 * 10.0, 150.0, 0));
        }
        let expected = cached.grid().neighbours_for(Vec2::new(150.0, 150.0));

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    assert_eq!(cached.neighbours_for(Vec2::new(150.0, 150.0)), expected);
                });
            }
        });
    }
}
