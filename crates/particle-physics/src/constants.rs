//! Default tunables for the particle-life world
//!
//! These seed the live settings and the default population. Everything here can
//! be changed at runtime except `MAX_GROUPS`, which sizes the attraction matrix.

/// Upper bound on the number of particle groups (and the attraction matrix side)
pub const MAX_GROUPS: usize = 4;

/// Particles generated per group by the default population
pub const DEFAULT_GROUP_SIZE: usize = 500;

/// Time scale applied to wall-clock frame time
pub const DEFAULT_STEP_SIZE: f32 = 0.2;

/// Time for accumulated acceleration to decay by half with no new force
pub const DEFAULT_FRICTION_HALF_LIFE: f32 = 0.25;

/// Uniform scale applied to every attraction coefficient at read time
pub const DEFAULT_FORCE_MULTIPLIER: f32 = 0.1;

/// Normalized distance below which every pair repels
pub const DEFAULT_CUTOFF: f32 = 0.3;

/// Maximum interaction distance, also the chunk edge length
pub const DEFAULT_INTERACTION_RADIUS: f32 = 100.0;

/// Default world width
pub const DEFAULT_DOMAIN_WIDTH: u32 = 500;

/// Default world height
pub const DEFAULT_DOMAIN_HEIGHT: u32 = 500;
