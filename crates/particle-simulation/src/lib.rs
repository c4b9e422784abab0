//! # Particle Life Simulation Engine
//!
//! CPU engine advancing a particle-life population on a toroidal domain, with
//! brute-force or chunk-grid neighbour search and sequential or rayon-parallel
//! acceleration updates.

pub mod chunks;
pub mod params;
pub mod scenario;
pub mod simulation;

pub use chunks::*;
pub use params::*;
pub use scenario::*;
pub use simulation::*;
