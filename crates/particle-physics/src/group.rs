//! Particle groups and the bounded group collection

use crate::domain::Domain;
use crate::particle::{Color, Particle};
use glam::Vec2;
use rand::Rng;

/// A population of particles sharing a colour and a row/column of the attraction matrix
#[derive(Debug, Clone)]
pub struct ParticleGroup {
    id: u32,
    color: Color,
    particles: Vec<Particle>,
}

impl ParticleGroup {
    fn new(id: u32, max_groups: usize, particles: Vec<Particle>) -> Self {
        Self {
            id,
            color: Color::for_group(id as usize, max_groups),
            particles,
        }
    }

    pub fn id(&self) -> usize {
        self.id as usize
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Raw bytes of the particle array, ready for a vertex/storage buffer upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.particles)
    }
}

/// At most `max_groups` groups, keyed by dense sequential ids starting at 0.
///
/// Groups are only added during setup. Adding past the bound is a silent no-op.
/// The collection is `Send + Sync`; concurrent setup code shares it behind a
/// `Mutex`, and `&mut self` on every mutator keeps additions serialized.
#[derive(Debug, Clone)]
pub struct ParticleGroupsManager {
    groups: Vec<ParticleGroup>,
    max_groups: usize,
}

impl ParticleGroupsManager {
    pub fn new(max_groups: usize) -> Self {
        Self {
            groups: Vec::with_capacity(max_groups),
            max_groups,
        }
    }

    /// Add a group of `count` particles scattered uniformly over `domain`.
    ///
    /// Returns the new group id, or `None` when the collection is full.
    pub fn add_group<R: Rng + ?Sized>(
        &mut self,
        count: usize,
        domain: &Domain,
        rng: &mut R,
    ) -> Option<usize> {
        let id = self.next_id()?;
        let particles = (0..count)
            .map(|_| Particle::random(id, domain, &mut *rng))
            .collect();
        Some(self.push(id, particles))
    }

    /// Add a group with particles at the given positions, all at rest.
    pub fn add_group_at<I>(&mut self, positions: I) -> Option<usize>
    where
        I: IntoIterator<Item = Vec2>,
    {
        let id = self.next_id()?;
        let particles = positions
            .into_iter()
            .map(|position| Particle::new(position, id))
            .collect();
        Some(self.push(id, particles))
    }

    fn next_id(&self) -> Option<u32> {
        (self.groups.len() < self.max_groups).then_some(self.groups.len() as u32)
    }

    fn push(&mut self, id: u32, particles: Vec<Particle>) -> usize {
        self.groups.push(ParticleGroup::new(id, self.max_groups, particles));
        id as usize
    }

    pub fn groups(&self) -> &[ParticleGroup] {
        &self.groups
    }

    pub fn group(&self, id: usize) -> Option<&ParticleGroup> {
        self.groups.get(id)
    }

    pub fn max_groups(&self) -> usize {
        self.max_groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn particle_count(&self) -> usize {
        self.groups.iter().map(ParticleGroup::len).sum()
    }

    /// Every particle, group by group in insertion order
    pub fn particles(&self) -> impl Iterator<Item = &Particle> + '_ {
        self.groups.iter().flat_map(|group| group.particles.iter())
    }

    /// Mutable access to every particle. Group membership cannot change through it.
    pub fn particles_mut(&mut self) -> impl Iterator<Item = &mut Particle> + '_ {
        self.groups
            .iter_mut()
            .flat_map(|group| group.particles.iter_mut())
    }
}

impl Default for ParticleGroupsManager {
    fn default() -> Self {
        Self::new(crate::constants::MAX_GROUPS)
    }
}
