//! Physics parameters for runtime tuning
//!
//! [`Settings`] is the live, shareable set of tunables a UI or other controller
//! writes to. The engine never reads it while particles are being updated:
//! at the start of each tick it takes a [`TickParams`] snapshot and hands that
//! copy to every unit of work.

use particle_physics::{
    ConfigError, Domain, DEFAULT_CUTOFF, DEFAULT_FORCE_MULTIPLIER, DEFAULT_FRICTION_HALF_LIFE,
    DEFAULT_INTERACTION_RADIUS, DEFAULT_STEP_SIZE,
};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// f32 stored as raw bits for lock-free sharing
#[derive(Debug)]
struct AtomicF32(AtomicU32);

impl AtomicF32 {
    fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Live-tunable simulation settings.
///
/// Every setter validates its input and leaves the previous value in place on
/// error. Share with `Arc<Settings>`; writes from another thread become
/// visible at the next tick.
#[derive(Debug)]
pub struct Settings {
    step_size: AtomicF32,
    friction_half_life: AtomicF32,
    force_multiplier: AtomicF32,
    cutoff: AtomicF32,
    interaction_radius: AtomicF32,
    show_ui: AtomicBool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            step_size: AtomicF32::new(DEFAULT_STEP_SIZE),
            friction_half_life: AtomicF32::new(DEFAULT_FRICTION_HALF_LIFE),
            force_multiplier: AtomicF32::new(DEFAULT_FORCE_MULTIPLIER),
            cutoff: AtomicF32::new(DEFAULT_CUTOFF),
            interaction_radius: AtomicF32::new(DEFAULT_INTERACTION_RADIUS),
            show_ui: AtomicBool::new(true),
        }
    }
}

impl Settings {
    pub fn step_size(&self) -> f32 {
        self.step_size.load()
    }

    pub fn set_step_size(&self, value: f32) -> Result<(), ConfigError> {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::InvalidStepSize(value));
        }
        self.step_size.store(value);
        Ok(())
    }

    pub fn friction_half_life(&self) -> f32 {
        self.friction_half_life.load()
    }

    pub fn set_friction_half_life(&self, value: f32) -> Result<(), ConfigError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(ConfigError::InvalidFrictionHalfLife(value));
        }
        self.friction_half_life.store(value);
        Ok(())
    }

    pub fn force_multiplier(&self) -> f32 {
        self.force_multiplier.load()
    }

    pub fn set_force_multiplier(&self, value: f32) -> Result<(), ConfigError> {
        if !value.is_finite() {
            return Err(ConfigError::InvalidForceMultiplier(value));
        }
        self.force_multiplier.store(value);
        Ok(())
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff.load()
    }

    pub fn set_cutoff(&self, value: f32) -> Result<(), ConfigError> {
        // NaN fails both comparisons
        if !(value > 0.0 && value < 1.0) {
            return Err(ConfigError::CutoffOutOfRange(value));
        }
        self.cutoff.store(value);
        Ok(())
    }

    pub fn interaction_radius(&self) -> f32 {
        self.interaction_radius.load()
    }

    pub fn set_interaction_radius(&self, value: f32) -> Result<(), ConfigError> {
        validate_interaction_radius(value)?;
        self.interaction_radius.store(value);
        Ok(())
    }

    pub fn show_ui(&self) -> bool {
        self.show_ui.load(Ordering::Relaxed)
    }

    pub fn set_show_ui(&self, visible: bool) {
        self.show_ui.store(visible, Ordering::Relaxed);
    }

    /// Read every cell once
    pub fn snapshot(&self) -> TickParams {
        TickParams {
            step_size: self.step_size(),
            friction_half_life: self.friction_half_life(),
            force_multiplier: self.force_multiplier(),
            cutoff: self.cutoff(),
            interaction_radius: self.interaction_radius(),
            show_ui: self.show_ui(),
        }
    }
}

pub(crate) fn validate_interaction_radius(value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::InvalidInteractionRadius(value));
    }
    Ok(())
}

/// Immutable per-tick copy of [`Settings`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickParams {
    pub step_size: f32,
    pub friction_half_life: f32,
    pub force_multiplier: f32,
    pub cutoff: f32,
    pub interaction_radius: f32,
    pub show_ui: bool,
}

impl TickParams {
    /// Exact half-life decay factor over `delta_time`
    pub fn friction(&self, delta_time: f32) -> f32 {
        0.5f32.powf(delta_time / self.friction_half_life)
    }

    /// Clamp the interaction radius so every pair has a single nearest image.
    ///
    /// Returns the adjusted parameters and, if clamping happened, the radius
    /// that was asked for.
    pub fn fitted_to(mut self, domain: &Domain) -> (Self, Option<f32>) {
        let limit = domain.max_interaction_radius();
        if self.interaction_radius <= limit {
            return (self, None);
        }
        let requested = self.interaction_radius;
        self.interaction_radius = limit;
        (self, Some(requested))
    }
}

impl Default for TickParams {
    fn default() -> Self {
        Settings::default().snapshot()
    }
}
