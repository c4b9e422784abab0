//! # Particle Life Physics
//!
//! Leaf types for a 2D particle-life world: the toroidal domain, particles and
//! their groups, the asymmetric attraction matrix and the distance-shaped force
//! law that ties them together.

pub mod constants;
pub mod domain;
pub mod error;
pub mod forces;
pub mod group;
pub mod matrix;
pub mod particle;

pub use constants::*;
pub use domain::*;
pub use error::*;
pub use forces::*;
pub use group::*;
pub use matrix::*;
pub use particle::*;
