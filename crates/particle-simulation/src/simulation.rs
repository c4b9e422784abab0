//! CPU particle-life engine
//!
//! One force/integration algorithm with two orthogonal knobs: where the
//! candidate neighbours of a particle come from ([`NeighbourSearch`]) and how
//! the per-particle work is scheduled ([`Dispatch`]).
//!
//! A tick is two phases. The acceleration phase reads positions, the matrix and
//! the chunk index, and writes only each particle's own acceleration, so it can
//! fan out one unit of work per particle. The position phase integrates, wraps,
//! and rebuilds the chunk index on the driving thread.

use crate::chunks::{CachedChunkGrid, ChunkGrid, ChunkIndex, Neighbour};
use crate::params::{Settings, TickParams};
use crate::scenario::PopulationSeed;
use glam::Vec2;
use particle_physics::{
    pair_force, AttractionMatrix, ConfigError, Domain, Particle, ParticleGroupsManager,
};
use rand::Rng;
use rayon::prelude::*;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Source of candidate neighbours for the acceleration phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NeighbourSearch {
    /// Every particle of every group, O(n²). Reference for the others.
    BruteForce,
    /// Cell block around the particle from a [`ChunkGrid`]
    Chunked,
    /// Same as `Chunked`, memoizing neighbourhoods per tick ([`CachedChunkGrid`])
    ChunkedCached,
}

/// Scheduling of the per-particle acceleration updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dispatch {
    Sequential,
    /// One rayon task per particle, joined before the position phase
    Parallel,
}

/// A neighbour search paired with a dispatch mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Strategy {
    pub search: NeighbourSearch,
    pub dispatch: Dispatch,
}

impl Strategy {
    pub const BRUTE_FORCE: Self = Self::new(NeighbourSearch::BruteForce, Dispatch::Sequential);
    pub const BRUTE_FORCE_PARALLEL: Self =
        Self::new(NeighbourSearch::BruteForce, Dispatch::Parallel);
    pub const GRID: Self = Self::new(NeighbourSearch::Chunked, Dispatch::Sequential);
    pub const GRID_PARALLEL: Self = Self::new(NeighbourSearch::Chunked, Dispatch::Parallel);
    pub const GRID_CACHED: Self = Self::new(NeighbourSearch::ChunkedCached, Dispatch::Sequential);
    pub const GRID_CACHED_PARALLEL: Self =
        Self::new(NeighbourSearch::ChunkedCached, Dispatch::Parallel);

    pub const ALL: [Self; 6] = [
        Self::BRUTE_FORCE,
        Self::BRUTE_FORCE_PARALLEL,
        Self::GRID,
        Self::GRID_PARALLEL,
        Self::GRID_CACHED,
        Self::GRID_CACHED_PARALLEL,
    ];

    pub const fn new(search: NeighbourSearch, dispatch: Dispatch) -> Self {
        Self { search, dispatch }
    }

    /// Short name used on the command line
    pub fn name(&self) -> &'static str {
        match (self.search, self.dispatch) {
            (NeighbourSearch::BruteForce, Dispatch::Sequential) => "brute",
            (NeighbourSearch::BruteForce, Dispatch::Parallel) => "brute-parallel",
            (NeighbourSearch::Chunked, Dispatch::Sequential) => "grid",
            (NeighbourSearch::Chunked, Dispatch::Parallel) => "grid-parallel",
            (NeighbourSearch::ChunkedCached, Dispatch::Sequential) => "grid-cached",
            (NeighbourSearch::ChunkedCached, Dispatch::Parallel) => "grid-cached-parallel",
        }
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Self::GRID_CACHED_PARALLEL
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown strategy `{0}` (expected brute, brute-parallel, grid, grid-parallel, grid-cached or grid-cached-parallel)")]
pub struct UnknownStrategy(pub String);

impl FromStr for Strategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownStrategy(s.to_owned()))
    }
}

/// Contract shared by every engine variant
pub trait PhysicsEngine {
    /// Run one tick: acceleration phase, then position phase
    fn advance(&mut self, delta_time: f32);

    /// Current population, for drawing or inspection
    fn particle_groups(&self) -> &ParticleGroupsManager;
}

/// Owns the population and advances it with the configured [`Strategy`]
pub struct ParticleSimulation {
    domain: Domain,
    settings: Arc<Settings>,
    groups: ParticleGroupsManager,
    matrix: AttractionMatrix,
    strategy: Strategy,
    chunks: Option<Box<dyn ChunkIndex>>,
    radius_clamped: bool,
}

impl ParticleSimulation {
    /// Take ownership of a population and index it for the chosen strategy.
    ///
    /// Positions outside the domain are wrapped in. Fails if any group id,
    /// or any particle's group, has no row in the matrix.
    pub fn new(
        domain: Domain,
        settings: Arc<Settings>,
        mut groups: ParticleGroupsManager,
        matrix: AttractionMatrix,
        strategy: Strategy,
    ) -> Result<Self, ConfigError> {
        log::info!("Initializing ParticleSimulation...");
        let max_groups = matrix.max_groups();
        let last_group = groups.len().checked_sub(1);
        let last_member = groups.particles().map(Particle::group).max();
        if let Some(index) = last_group.max(last_member).filter(|&id| id >= max_groups) {
            return Err(ConfigError::GroupOutOfRange { index, max_groups });
        }

        for particle in groups.particles_mut() {
            particle.position = domain.wrap(particle.position()).to_array();
        }

        let mut simulation = Self {
            domain,
            settings,
            groups,
            matrix,
            strategy,
            chunks: None,
            radius_clamped: false,
        };
        let params = simulation.capture_params();
        simulation.chunks = build_index(strategy.search, domain, params.interaction_radius)?;
        simulation.rebuild_chunks();

        log::info!(
            "{} particles in {} groups on a {}x{} domain, strategy {}",
            simulation.groups.particle_count(),
            simulation.groups.len(),
            domain.width(),
            domain.height(),
            strategy
        );
        Ok(simulation)
    }

    /// Generate a population from `seed` and wrap it in a simulation
    pub fn from_seed<R: Rng + ?Sized>(
        domain: Domain,
        settings: Arc<Settings>,
        seed: &PopulationSeed,
        strategy: Strategy,
        rng: &mut R,
    ) -> Result<Self, ConfigError> {
        let (groups, matrix) = seed.populate(&domain, rng)?;
        Self::new(domain, settings, groups, matrix, strategy)
    }

    /// One tick of length `delta_time`
    pub fn advance(&mut self, delta_time: f32) {
        let params = self.capture_params();
        self.run_tick(&params, delta_time);
    }

    /// One tick for a frame of `frame_seconds`, scaled by the step size setting
    pub fn advance_frame(&mut self, frame_seconds: f32) {
        let params = self.capture_params();
        self.run_tick(&params, params.step_size * frame_seconds);
    }

    /// Acceleration phase on its own
    pub fn update_accelerations(&mut self, delta_time: f32) {
        let params = self.capture_params();
        self.sync_chunks(&params);
        self.accelerate(&params, delta_time);
    }

    /// Position phase on its own; also rebuilds the chunk index
    pub fn update_positions(&mut self, delta_time: f32) {
        self.integrate(delta_time);
    }

    fn run_tick(&mut self, params: &TickParams, delta_time: f32) {
        self.sync_chunks(params);
        self.accelerate(params, delta_time);
        self.integrate(delta_time);
        log::trace!("tick done, dt = {delta_time}");
    }

    /// Read the settings once and fit the radius to the domain
    fn capture_params(&mut self) -> TickParams {
        let (params, requested) = self.settings.snapshot().fitted_to(&self.domain);
        match requested {
            Some(radius) if !self.radius_clamped => {
                log::warn!(
                    "Interaction radius {radius} exceeds half the domain, using {}",
                    params.interaction_radius
                );
                self.radius_clamped = true;
            }
            Some(_) => {}
            None => self.radius_clamped = false,
        }
        params
    }

    /// Re-cut the chunk grid if the radius moved since it was last sized
    fn sync_chunks(&mut self, params: &TickParams) {
        let Some(index) = self.chunks.as_mut() else {
            return;
        };
        if index.cell_size() == params.interaction_radius {
            return;
        }

        log::debug!(
            "Resizing chunk grid from {} to {}",
            index.cell_size(),
            params.interaction_radius
        );
        match index.resize(params.interaction_radius) {
            Ok(()) => self.rebuild_chunks(),
            // The old layout is untouched and already holds the current positions
            Err(err) => log::error!("Keeping chunk grid cut for {}: {err}", index.cell_size()),
        }
    }

    fn rebuild_chunks(&mut self) {
        if let Some(index) = self.chunks.as_mut() {
            index.reset();
            for particle in self.groups.particles() {
                index.add(particle);
            }
        }
    }

    fn accelerate(&mut self, params: &TickParams, delta_time: f32) {
        let friction = params.friction(delta_time);
        let candidates = match self.chunks.as_deref() {
            Some(index) => Candidates::Chunks(index),
            None => Candidates::All {
                snapshot: self.groups.particles().map(Neighbour::from).collect(),
                domain: self.domain,
            },
        };
        let matrix = &self.matrix;

        let update = |particle: &mut Particle| {
            let force = candidates.force_on(particle, matrix, params);
            particle.apply_force(force, friction, params.interaction_radius, delta_time);
        };

        match self.strategy.dispatch {
            Dispatch::Sequential => self.groups.particles_mut().for_each(update),
            Dispatch::Parallel => {
                let particles: Vec<&mut Particle> = self.groups.particles_mut().collect();
                particles.into_par_iter().for_each(update);
            }
        }
    }

    fn integrate(&mut self, delta_time: f32) {
        let domain = self.domain;
        for particle in self.groups.particles_mut() {
            particle.advance(delta_time, &domain);
        }
        self.rebuild_chunks();
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }

    /// Edge length of the chunk cells, if the strategy uses a grid
    pub fn chunk_cell_size(&self) -> Option<f32> {
        self.chunks.as_ref().map(|index| index.cell_size())
    }
}

impl PhysicsEngine for ParticleSimulation {
    fn advance(&mut self, delta_time: f32) {
        ParticleSimulation::advance(self, delta_time);
    }

    fn particle_groups(&self) -> &ParticleGroupsManager {
        &self.groups
    }
}

fn build_index(
    search: NeighbourSearch,
    domain: Domain,
    interaction_radius: f32,
) -> Result<Option<Box<dyn ChunkIndex>>, ConfigError> {
    Ok(match search {
        NeighbourSearch::BruteForce => None,
        NeighbourSearch::Chunked => Some(Box::new(ChunkGrid::new(domain, interaction_radius)?)),
        NeighbourSearch::ChunkedCached => {
            Some(Box::new(CachedChunkGrid::new(domain, interaction_radius)?))
        }
    })
}

/// Where a particle's candidate neighbours come from during one acceleration phase
enum Candidates<'a> {
    /// Copy of every particle, compared through its nearest periodic image
    All {
        snapshot: Vec<Neighbour>,
        domain: Domain,
    },
    /// Already translated cell block from the chunk index
    Chunks(&'a dyn ChunkIndex),
}

impl Candidates<'_> {
    /// Summed force on `particle` from every candidate
    fn force_on(&self, particle: &Particle, matrix: &AttractionMatrix, params: &TickParams) -> Vec2 {
        let position = particle.position();
        let group = particle.group();
        let pull = |neighbour: &Neighbour, image: Vec2| {
            let coefficient = matrix.coefficient(group, neighbour.group, params.force_multiplier);
            pair_force(
                image - position,
                coefficient,
                params.interaction_radius,
                params.cutoff,
            )
        };

        match self {
            Self::All { snapshot, domain } => snapshot
                .iter()
                .map(|n| pull(n, domain.nearest_image(position, n.position)))
                .fold(Vec2::ZERO, |sum, force| sum + force),
            Self::Chunks(index) => index
                .neighbours_for(position)
                .iter()
                .map(|n| pull(n, n.position))
                .fold(Vec2::ZERO, |sum, force| sum + force),
        }
    }
}
