//! Starting population: group sizes and the initial attraction table

use particle_physics::{
    AttractionMatrix, ConfigError, Domain, ParticleGroupsManager, DEFAULT_GROUP_SIZE, MAX_GROUPS,
};
use rand::Rng;

/// Coefficients of the stock four-group world, as `(from, to, coefficient)`
pub const DEFAULT_COEFFICIENTS: [(usize, usize, f32); 9] = [
    (0, 0, 1.0),
    (1, 0, 1.6),
    (0, 1, -0.5),
    (2, 1, -0.5),
    (3, 1, -0.25),
    (2, 0, 0.5),
    (2, 2, 1.0),
    (1, 3, 0.5),
    (3, 2, 1.0),
];

/// Everything needed to generate a population once, at setup
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationSeed {
    pub max_groups: usize,
    /// Particle count for each group, in id order
    pub group_sizes: Vec<usize>,
    /// Non-zero base coefficients; unlisted pairs start at zero
    pub coefficients: Vec<(usize, usize, f32)>,
}

impl Default for PopulationSeed {
    fn default() -> Self {
        Self {
            max_groups: MAX_GROUPS,
            group_sizes: vec![DEFAULT_GROUP_SIZE; MAX_GROUPS],
            coefficients: DEFAULT_COEFFICIENTS.to_vec(),
        }
    }
}

impl PopulationSeed {
    /// Scatter every group uniformly over `domain` and build the matrix.
    ///
    /// Group sizes past `max_groups` are dropped, the same way the group
    /// collection ignores additions beyond its bound.
    pub fn populate<R: Rng + ?Sized>(
        &self,
        domain: &Domain,
        rng: &mut R,
    ) -> Result<(ParticleGroupsManager, AttractionMatrix), ConfigError> {
        let matrix =
            AttractionMatrix::from_entries(self.max_groups, self.coefficients.iter().copied())?;

        let mut groups = ParticleGroupsManager::new(self.max_groups);
        for &count in &self.group_sizes {
            if groups.add_group(count, domain, &mut *rng).is_none() {
                log::debug!(
                    "Population seed lists {} groups, keeping the first {}",
                    self.group_sizes.len(),
                    self.max_groups
                );
                break;
            }
        }

        Ok((groups, matrix))
    }
}
