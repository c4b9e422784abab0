//! Particle and group colour types

use crate::domain::Domain;
use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use rand::Rng;

/// Render-compatible particle structure
///
/// Plain old data so a renderer can upload a whole group with
/// `bytemuck::cast_slice`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Particle {
    /// Position inside the domain
    pub position: [f32; 2],
    /// Damped accumulated acceleration (doubles as velocity in the integrator)
    pub acceleration: [f32; 2],
    /// Id of the owning group, fixed at creation
    group: u32,
}

impl Particle {
    pub fn new(position: Vec2, group: u32) -> Self {
        Self {
            position: position.to_array(),
            acceleration: [0.0; 2],
            group,
        }
    }

    /// Create a particle at a uniformly random position inside `domain`
    pub fn random<R: Rng + ?Sized>(group: u32, domain: &Domain, rng: &mut R) -> Self {
        let position = Vec2::new(
            rng.random::<f32>() * domain.width(),
            rng.random::<f32>() * domain.height(),
        );
        // random::<f32>() is in [0, 1) but the product can round up to the extent
        Self::new(domain.wrap(position), group)
    }

    pub fn position(&self) -> Vec2 {
        Vec2::from_array(self.position)
    }

    pub fn acceleration(&self) -> Vec2 {
        Vec2::from_array(self.acceleration)
    }

    pub fn set_acceleration(&mut self, acceleration: Vec2) {
        self.acceleration = acceleration.to_array();
    }

    pub fn group(&self) -> usize {
        self.group as usize
    }

    /// Fold an accumulated force into the acceleration.
    ///
    /// `friction` is the per-step decay factor; the force is scaled by the
    /// interaction radius and the step length.
    pub fn apply_force(&mut self, force: Vec2, friction: f32, radius: f32, delta_time: f32) {
        let acceleration = self.acceleration() * friction + force * radius * delta_time;
        self.set_acceleration(acceleration);
    }

    /// Integrate one step and wrap the result back into the domain
    pub fn advance(&mut self, delta_time: f32, domain: &Domain) {
        let position = self.position() + self.acceleration() * delta_time;
        self.position = domain.wrap(position).to_array();
    }
}

/// Linear RGB colour in `[0, 1]`
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Fully saturated colour for group `id` out of `max_groups`, evenly spaced in hue
    pub fn for_group(id: usize, max_groups: usize) -> Self {
        Self::from_hsv(id as f32 / max_groups.max(1) as f32, 1.0, 1.0)
    }

    /// HSV to RGB. Only the fractional part of `hue` is used.
    ///
    /// # Panics
    /// If `hue` is not finite, since no colour sector exists for it.
    pub fn from_hsv(hue: f32, saturation: f32, value: f32) -> Self {
        let sector_position = (hue - hue.trunc()) * 6.0;
        let floor = sector_position.floor();
        let f = sector_position - floor;
        // NaN would saturate to sector 0 in a plain cast
        let sector = if floor.is_finite() { floor as i32 } else { i32::MIN };

        let p = value * (1.0 - saturation);
        let q = value * (1.0 - saturation * f);
        let t = value * (1.0 - saturation * (1.0 - f));
        let v = value;

        // Negative hues land in sectors -6..-1
        match sector {
            0 | 6 | -6 => Self::rgb(v, t, p),
            1 | -5 => Self::rgb(q, v, p),
            2 | -4 => Self::rgb(p, v, t),
            3 | -3 => Self::rgb(p, q, v),
            4 | -2 => Self::rgb(t, p, v),
            5 | -1 => Self::rgb(v, p, q),
            _ => unreachable!("hue {hue} maps to no colour sector"),
        }
    }
}
