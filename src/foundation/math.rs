use std::f64::consts::TAU;

use crate::foundation::core::{Matrix, PixelBox, Vec2};

/// Projection for a `width` x `height` target: pixel space (y down) to clip space `[-1, 1]`.
pub fn projection(width: u32, height: u32) -> Matrix {
    let w = f64::from(width.max(1));
    let h = f64::from(height.max(1));
    Matrix::new([2.0 / w, 0.0, 0.0, -2.0 / h, -1.0, 1.0])
}

/// Maps the unit square onto `region`, rotated by `rotation_rad` about the region's center,
/// then through `projection`.
pub fn project_box(region: PixelBox, rotation_rad: f64, projection: Matrix) -> Matrix {
    let size = Vec2::new(f64::from(region.width), f64::from(region.height));
    let half = size * 0.5;

    let t_origin = Matrix::translate(Vec2::new(f64::from(region.x), f64::from(region.y)));
    let t_center = Matrix::translate(half);
    let t_uncenter = Matrix::translate(-half);
    let t_rotate = Matrix::rotate(rotation_rad);
    let t_scale = Matrix::scale_non_uniform(size.x, size.y);

    projection * t_origin * t_center * t_rotate * t_uncenter * t_scale
}

/// Unit square scaled to a `width` x `height` quadrangle anchored at the origin (pixel space).
pub fn quad(width: f64, height: f64) -> Matrix {
    Matrix::scale_non_uniform(width, height)
}

/// Moves an already-built pixel-space transform by `(dx, dy)`.
pub fn translate(m: Matrix, dx: f64, dy: f64) -> Matrix {
    Matrix::translate(Vec2::new(dx, dy)) * m
}

/// Continuously increasing angle that wraps back to 0 once it reaches a full turn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rotation {
    angle: f64,
    step: f64,
}

impl Rotation {
    pub fn new(step: f64) -> Self {
        Self { angle: 0.0, step }
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Advance by one step. The stored angle always stays in `[0, 2π)`.
    pub fn advance(&mut self) -> f64 {
        self.angle += self.step;
        if !(0.0..TAU).contains(&self.angle) {
            self.angle = 0.0;
        }
        self.angle
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
