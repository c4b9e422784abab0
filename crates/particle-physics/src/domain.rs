//! Toroidal world rectangle

use crate::error::ConfigError;
use glam::Vec2;

/// A `width x height` rectangle whose axes wrap around.
///
/// Every particle position lives in `[0, width) x [0, height)` after a
/// position update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Domain {
    width: u32,
    height: u32,
}

impl Domain {
    pub fn new(width: u32, height: u32) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::InvalidDomain { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> f32 {
        self.width as f32
    }

    pub fn height(&self) -> f32 {
        self.height as f32
    }

    /// Largest interaction radius for which every pair has a unique nearest image
    pub fn max_interaction_radius(&self) -> f32 {
        self.width().min(self.height()) * 0.5
    }

    /// Map a position back into the domain, axis by axis.
    pub fn wrap(&self, position: Vec2) -> Vec2 {
        Vec2::new(
            wrap_axis(position.x, self.width()),
            wrap_axis(position.y, self.height()),
        )
    }

    /// Translate `other` by whole domain lengths so it is the copy closest to `origin`.
    ///
    /// The returned point may lie outside the domain; subtracting `origin` from it
    /// gives the shortest toroidal displacement.
    pub fn nearest_image(&self, origin: Vec2, other: Vec2) -> Vec2 {
        Vec2::new(
            other.x + image_shift(other.x - origin.x, self.width()),
            other.y + image_shift(other.y - origin.y, self.height()),
        )
    }
}

impl Default for Domain {
    fn default() -> Self {
        Self {
            width: crate::constants::DEFAULT_DOMAIN_WIDTH,
            height: crate::constants::DEFAULT_DOMAIN_HEIGHT,
        }
    }
}

fn wrap_axis(value: f32, extent: f32) -> f32 {
    let wrapped = value.rem_euclid(extent);
    // rem_euclid rounds tiny negative values up to exactly `extent`
    if wrapped >= extent {
        0.0
    } else {
        wrapped
    }
}

fn image_shift(delta: f32, extent: f32) -> f32 {
    if delta > extent * 0.5 {
        -extent
    } else if delta < -extent * 0.5 {
        extent
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_domain() {
        assert_eq!(
            Domain::new(0, 10),
            Err(ConfigError::InvalidDomain {
                width: 0,
                height: 10
            })
        );
        assert!(Domain::new(10, 0).is_err());
        assert!(Domain::new(1, 1).is_ok());
    }

    #[test]
    fn test_wrap_stays_inside() {
        let domain = Domain::new(100, 50).unwrap();
        assert_eq!(domain.wrap(Vec2::new(105.0, -5.0)), Vec2::new(5.0, 45.0));
        assert_eq!(domain.wrap(Vec2::new(100.0, 50.0)), Vec2::ZERO);
        assert_eq!(domain.wrap(Vec2::new(-250.0, 120.0)), Vec2::new(50.0, 20.0));

        let tiny = domain.wrap(Vec2::new(-1e-9, -1e-9));
        assert!(tiny.x >= 0.0 && tiny.x < 100.0);
        assert!(tiny.y >= 0.0 && tiny.y < 50.0);
    }

    #[test]
    fn test_nearest_image_crosses_seam() {
        let domain = Domain::new(100, 100).unwrap();
        let origin = Vec2::new(5.0, 50.0);

        let image = domain.nearest_image(origin, Vec2::new(95.0, 50.0));
        assert_eq!(image, Vec2::new(-5.0, 50.0));

        let image = domain.nearest_image(Vec2::new(90.0, 2.0), Vec2::new(3.0, 98.0));
        assert_eq!(image, Vec2::new(103.0, -2.0));

        // Already closest: untouched
        let image = domain.nearest_image(origin, Vec2::new(20.0, 60.0));
        assert_eq!(image, Vec2::new(20.0, 60.0));
    }

    #[test]
    fn test_max_interaction_radius() {
        let domain = Domain::new(320, 240).unwrap();
        assert_eq!(domain.max_interaction_radius(), 120.0);
    }
}
