//! The processing area.

use crate::error::{RuntimeError, RuntimeResult};

/// Relative slack on the exclusive upper bound, so accumulated rounding in
/// `width / step` does not drop the last row or column.
const EPSILON: f64 = 1e-9;

/// Rectangle in world units.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WorldBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

impl WorldBounds {
    pub fn new(min_x: f64, min_y: f64, width: f64, height: f64) -> Self {
        WorldBounds {
            min_x,
            min_y,
            width,
            height,
        }
    }

    pub fn max_x(&self) -> f64 {
        self.min_x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.min_y + self.height
    }

    /// Smallest rectangle holding all `points`.
    pub(crate) fn enclosing(points: &[(f64, f64)]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let (mut x0, mut y0) = *first;
        let (mut x1, mut y1) = *first;
        for &(x, y) in rest {
            x0 = x0.min(x);
            y0 = y0.min(y);
            x1 = x1.max(x);
            y1 = y1.max(y);
        }
        Some(WorldBounds::new(x0, y0, x1 - x0, y1 - y0))
    }
}

/// Bounds plus a step size per axis. Always valid once constructed.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct World {
    bounds: WorldBounds,
    x_step: f64,
    y_step: f64,
}

impl World {
    /// Checks that the bounds are non-empty and finite and that each step
    /// is finite, positive and no larger than its axis.
    pub fn new(bounds: WorldBounds, x_step: f64, y_step: f64) -> RuntimeResult<Self> {
        let finite = [bounds.min_x, bounds.min_y, bounds.width, bounds.height]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(RuntimeError::InvalidWorld {
                reason: "bounds must be finite",
            });
        }
        if bounds.width <= 0.0 || bounds.height <= 0.0 {
            return Err(RuntimeError::InvalidWorld {
                reason: "bounds are empty",
            });
        }
        for (step, extent) in [(x_step, bounds.width), (y_step, bounds.height)] {
            if !step.is_finite() || step <= 0.0 {
                return Err(RuntimeError::InvalidWorld {
                    reason: "step sizes must be finite and positive",
                });
            }
            if step > extent {
                return Err(RuntimeError::InvalidWorld {
                    reason: "step size is larger than the bounds",
                });
            }
        }
        Ok(World {
            bounds,
            x_step,
            y_step,
        })
    }

    /// One unit per pixel.
    pub fn unit_steps(bounds: WorldBounds) -> RuntimeResult<Self> {
        Self::new(bounds, 1.0, 1.0)
    }

    pub fn bounds(&self) -> &WorldBounds {
        &self.bounds
    }

    pub fn x_step(&self) -> f64 {
        self.x_step
    }

    pub fn y_step(&self) -> f64 {
        self.y_step
    }

    pub fn columns(&self) -> u64 {
        steps(self.bounds.width, self.x_step)
    }

    pub fn rows(&self) -> u64 {
        steps(self.bounds.height, self.y_step)
    }

    /// `ceil(width / x_step) * ceil(height / y_step)`.
    pub fn pixel_count(&self) -> u64 {
        self.columns() * self.rows()
    }

    pub(crate) fn x_at(&self, column: u64) -> f64 {
        self.bounds.min_x + column as f64 * self.x_step
    }

    pub(crate) fn y_at(&self, row: u64) -> f64 {
        self.bounds.min_y + row as f64 * self.y_step
    }
}

/// Number of positions `min + k * step` strictly below `min + extent`.
fn steps(extent: f64, step: f64) -> u64 {
    let n = extent / step;
    (n - n * EPSILON).ceil().max(0.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(w: f64, h: f64) -> WorldBounds {
        WorldBounds::new(0.0, 0.0, w, h)
    }

    #[test]
    fn test_pixel_count() {
        let world = World::unit_steps(bounds(100.0, 50.0));
        assert_eq!(world.map(|w| w.pixel_count()), Ok(5000));

        let world = World::new(bounds(10.0, 10.0), 3.0, 4.0);
        assert_eq!(world.map(|w| (w.columns(), w.rows())), Ok((4, 3)));
    }

    #[test]
    fn test_fractional_steps_keep_last_column() {
        let world = World::new(bounds(1.0, 1.0), 0.1, 0.1);
        assert_eq!(world.map(|w| w.columns()), Ok(10));
        let world = World::new(bounds(0.3, 0.3), 0.1, 0.1);
        assert_eq!(world.map(|w| w.rows()), Ok(3));
    }

    #[test]
    fn test_positions() {
        let world = World::new(WorldBounds::new(-5.0, 2.0, 10.0, 10.0), 2.5, 5.0);
        assert_eq!(world.map(|w| (w.x_at(3), w.y_at(1))), Ok((2.5, 7.0)));
    }

    #[test]
    fn test_rejects_invalid_worlds() {
        let invalid = |world: RuntimeResult<World>| {
            matches!(world, Err(RuntimeError::InvalidWorld { .. }))
        };
        assert!(invalid(World::unit_steps(bounds(0.0, 10.0))));
        assert!(invalid(World::unit_steps(bounds(10.0, -1.0))));
        assert!(invalid(World::unit_steps(bounds(f64::NAN, 10.0))));
        assert!(invalid(World::new(bounds(10.0, 10.0), 0.0, 1.0)));
        assert!(invalid(World::new(bounds(10.0, 10.0), 1.0, -1.0)));
        assert!(invalid(World::new(bounds(10.0, 10.0), f64::INFINITY, 1.0)));
        assert!(invalid(World::new(bounds(10.0, 10.0), 11.0, 1.0)));
        assert!(World::new(bounds(10.0, 10.0), 10.0, 10.0).is_ok());
    }

    #[test]
    fn test_enclosing() {
        let b = WorldBounds::enclosing(&[(1.0, 5.0), (-2.0, 3.0), (4.0, 0.0)]);
        assert_eq!(b, Some(WorldBounds::new(-2.0, 0.0, 6.0, 5.0)));
        assert_eq!(WorldBounds::enclosing(&[]), None);
    }
}
