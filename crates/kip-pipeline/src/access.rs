//! Pixel access traits.
//!
//! Actions never see a [`Frame`](crate::Frame) directly. Neighborhood
//! actions get a [`PixelAccess`] view of the source frame (read-only),
//! whole-frame actions get a [`MutablePixelAccess`] view of the frame
//! they are allowed to change.
//!
//! Exact accessors (`read`, `write`, `transform`) expect coordinates in
//! `[0, width) x [0, height)`; anything else is a programmer error and
//! may panic or touch a different pixel. The `*_coerce` family clamps
//! each coordinate into range first and is the way to sample neighbors
//! near an edge.

use crate::color::PixelColor;

/// Clamp `v` into `0..len`. An empty axis maps everything to 0.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn clamp_axis(v: i64, len: u32) -> u32 {
    v.min(i64::from(len) - 1).max(0) as u32
}

/// Read-only access to a raster.
pub trait PixelAccess {
    /// Width in pixels.
    fn width(&self) -> u32;

    /// Height in pixels.
    fn height(&self) -> u32;

    /// Read the pixel at an in-range coordinate.
    fn read(&self, x: u32, y: u32) -> PixelColor;

    /// Clamp `x` into `[0, width)`.
    fn coerce_x(&self, x: i64) -> u32 {
        clamp_axis(x, self.width())
    }

    /// Clamp `y` into `[0, height)`.
    fn coerce_y(&self, y: i64) -> u32 {
        clamp_axis(y, self.height())
    }

    /// Clamp both coordinates.
    fn coerce(&self, x: i64, y: i64) -> (u32, u32) {
        (self.coerce_x(x), self.coerce_y(y))
    }

    /// Read the pixel nearest to `(x, y)` inside the raster.
    fn read_coerce(&self, x: i64, y: i64) -> PixelColor {
        let (x, y) = self.coerce(x, y);
        self.read(x, y)
    }
}

/// Read-write access to a raster.
pub trait MutablePixelAccess: PixelAccess {
    /// Write the pixel at an in-range coordinate.
    fn write(&mut self, x: u32, y: u32, color: PixelColor);

    /// Replace the pixel at `(x, y)` with `f` applied to it.
    fn transform(&mut self, x: u32, y: u32, f: &dyn Fn(PixelColor) -> PixelColor) {
        let color = self.read(x, y);
        self.write(x, y, f(color));
    }

    /// Write the pixel nearest to `(x, y)` inside the raster.
    fn write_coerce(&mut self, x: i64, y: i64, color: PixelColor) {
        let (x, y) = self.coerce(x, y);
        self.write(x, y, color);
    }

    /// Transform the pixel nearest to `(x, y)` inside the raster.
    fn transform_coerce(&mut self, x: i64, y: i64, f: &dyn Fn(PixelColor) -> PixelColor) {
        let (x, y) = self.coerce(x, y);
        self.transform(x, y, f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_axis_bounds() {
        assert_eq!(clamp_axis(-5, 4), 0);
        assert_eq!(clamp_axis(2, 4), 2);
        assert_eq!(clamp_axis(4, 4), 3);
        assert_eq!(clamp_axis(i64::MAX, 4), 3);
    }

    #[test]
    fn clamp_axis_empty_is_zero() {
        assert_eq!(clamp_axis(-1, 0), 0);
        assert_eq!(clamp_axis(10, 0), 0);
    }
}
