//! Distance-shaped force law for particle-life interactions
//!
//! The force between two particles depends only on their distance normalized by
//! the interaction radius and on the attraction coefficient of the ordered group
//! pair:
//!
//! ```text
//!  force
//!    a |              /\
//!      |            /    \
//!    0 +-----------/------\-------- r / radius
//!      |        /cutoff    1
//!   -1 |      /
//! ```
//!
//! Below `cutoff` every pair repels (independent of the coefficient), which keeps
//! particles from collapsing onto one point. Between `cutoff` and 1 the force is a
//! triangular bump that peaks at the coefficient. Beyond the radius nothing happens.

use glam::Vec2;

/// Scalar force for a normalized distance `r_norm = distance / radius`.
///
/// `cutoff` must lie in `(0, 1)`; settings reject anything else before a tick
/// can run.
pub fn force_law(r_norm: f32, coefficient: f32, cutoff: f32) -> f32 {
    if r_norm < cutoff {
        short_range_repulsion(r_norm, cutoff)
    } else if r_norm < 1.0 {
        attraction_bump(r_norm, coefficient, cutoff)
    } else {
        0.0
    }
}

fn short_range_repulsion(r_norm: f32, cutoff: f32) -> f32 {
    r_norm / cutoff - 1.0
}

fn attraction_bump(r_norm: f32, coefficient: f32, cutoff: f32) -> f32 {
    coefficient * (1.0 - (2.0 * r_norm - 1.0 - cutoff).abs() / (1.0 - cutoff))
}

/// Force exerted on a particle by a neighbour displaced by `delta`.
///
/// `delta` must already be expressed in a plain Euclidean frame (the neighbour's
/// nearest periodic image minus the particle's position). Coincident particles
/// and particles at or beyond `radius` contribute nothing.
pub fn pair_force(delta: Vec2, coefficient: f32, radius: f32, cutoff: f32) -> Vec2 {
    let r = delta.length();
    if r > 0.0 && r < radius {
        delta / r * force_law(r / radius, coefficient, cutoff)
    } else {
        Vec2::ZERO
    }
}
