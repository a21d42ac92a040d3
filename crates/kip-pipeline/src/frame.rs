//! Fixed-size raster frames.
//!
//! A [`Frame`] is one step of an image's history: a packed byte buffer
//! of `width * height` pixels, 3 bytes per pixel (R, G, B) or 4 when the
//! frame carries alpha (R, G, B, A). The buffer length never changes
//! after construction.
//!
//! Frames are treated as immutable once pushed onto an
//! [`ImageStack`](crate::ImageStack). Producing a new step always goes
//! through [`Frame::next`] (blank frame of the same shape) or
//! [`Clone::clone`] (deep copy), so a frame shared between stacks is
//! never written to.

use image::{DynamicImage, RgbImage, RgbaImage};

use crate::access::{MutablePixelAccess, PixelAccess};
use crate::color::PixelColor;
use crate::types::{Dimensions, PipelineError};

/// A raster buffer with fixed dimensions and channel layout.
///
/// `Clone` is a deep byte copy: mutating the clone never changes the
/// original.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    has_alpha: bool,
    data: Vec<u8>,
}

/// Bytes per pixel for a given alpha flag.
const fn unit_for(has_alpha: bool) -> usize {
    if has_alpha { 4 } else { 3 }
}

impl Frame {
    /// A zero-filled frame.
    #[must_use]
    pub fn blank(width: u32, height: u32, has_alpha: bool) -> Self {
        let len = width as usize * height as usize * unit_for(has_alpha);
        Self {
            width,
            height,
            has_alpha,
            data: vec![0; len],
        }
    }

    /// Wrap existing pixel bytes.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidFrame`] if `data.len()` is not
    /// exactly `width * height * unit`.
    pub fn from_raw(
        width: u32,
        height: u32,
        has_alpha: bool,
        data: Vec<u8>,
    ) -> Result<Self, PipelineError> {
        let expected = width as usize * height as usize * unit_for(has_alpha);
        if data.len() != expected {
            return Err(PipelineError::InvalidFrame(format!(
                "{width}x{height} frame with alpha={has_alpha} needs {expected} bytes, got {}",
                data.len(),
            )));
        }
        Ok(Self {
            width,
            height,
            has_alpha,
            data,
        })
    }

    /// Whether pixels carry an alpha byte.
    #[must_use]
    pub const fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    /// Bytes per pixel: 4 with alpha, 3 without.
    #[must_use]
    pub const fn unit(&self) -> usize {
        unit_for(self.has_alpha)
    }

    /// Width and height.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            height: self.height,
        }
    }

    /// The packed pixel bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the frame and return its packed pixel bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// A blank frame with the same dimensions and alpha flag.
    #[must_use]
    pub fn next(&self) -> Self {
        Self::blank(self.width, self.height, self.has_alpha)
    }

    /// Byte offset of pixel `(x, y)`.
    const fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * self.unit()
    }

    /// Read the pixel starting at byte `offset`.
    pub(crate) fn read_at(&self, offset: usize) -> PixelColor {
        let px = &self.data[offset..offset + self.unit()];
        let a = if self.has_alpha { px[3] } else { u8::MAX };
        PixelColor::from_bytes(px[0], px[1], px[2], a)
    }

    /// Write `color` to the pixel starting at byte `offset`.
    pub(crate) fn write_at(&mut self, offset: usize, color: PixelColor) {
        let unit = self.unit();
        let bytes = color.to_bytes();
        self.data[offset..offset + unit].copy_from_slice(&bytes[..unit]);
    }

    /// Byte offsets of every pixel, in buffer order.
    pub(crate) fn offsets(&self) -> impl Iterator<Item = usize> + use<> {
        (0..self.data.len()).step_by(self.unit())
    }

    /// Convert to an `image` raster (`Rgba8` or `Rgb8`).
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidFrame`] if the buffer does not fit
    /// the dimensions, which the constructors rule out.
    pub fn to_image(&self) -> Result<DynamicImage, PipelineError> {
        let data = self.data.clone();
        let image = if self.has_alpha {
            RgbaImage::from_raw(self.width, self.height, data).map(DynamicImage::ImageRgba8)
        } else {
            RgbImage::from_raw(self.width, self.height, data).map(DynamicImage::ImageRgb8)
        };
        image.ok_or_else(|| {
            PipelineError::InvalidFrame(format!(
                "{} buffer does not match {} pixels",
                self.data.len(),
                self.dimensions(),
            ))
        })
    }
}

impl PixelAccess for Frame {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn read(&self, x: u32, y: u32) -> PixelColor {
        debug_assert!(x < self.width && y < self.height, "({x}, {y}) out of range");
        self.read_at(self.offset(x, y))
    }
}

impl MutablePixelAccess for Frame {
    fn write(&mut self, x: u32, y: u32, color: PixelColor) {
        debug_assert!(x < self.width && y < self.height, "({x}, {y}) out of range");
        self.write_at(self.offset(x, y), color);
    }
}

impl From<RgbaImage> for Frame {
    fn from(image: RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            has_alpha: true,
            data: image.into_raw(),
        }
    }
}

impl From<RgbImage> for Frame {
    fn from(image: RgbImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            has_alpha: false,
            data: image.into_raw(),
        }
    }
}

/// Keeps alpha only when the source color type has it.
impl From<DynamicImage> for Frame {
    fn from(image: DynamicImage) -> Self {
        if image.color().has_alpha() {
            image.into_rgba8().into()
        } else {
            image.into_rgb8().into()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::color::OPAQUE;

    fn gradient(width: u32, height: u32, has_alpha: bool) -> Frame {
        let mut frame = Frame::blank(width, height, has_alpha);
        for y in 0..height {
            for x in 0..width {
                frame.write(x, y, PixelColor::new(x * 10, y * 10, x + y, 200));
            }
        }
        frame
    }

    #[test]
    fn blank_buffer_length_matches_layout() {
        assert_eq!(Frame::blank(5, 4, false).as_bytes().len(), 60);
        assert_eq!(Frame::blank(5, 4, true).as_bytes().len(), 80);
        assert!(Frame::blank(5, 4, true).as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn from_raw_rejects_wrong_length() {
        let err = Frame::from_raw(2, 2, true, vec![0; 12]).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidFrame(_)));
        assert!(Frame::from_raw(2, 2, false, vec![0; 12]).is_ok());
    }

    #[test]
    fn write_then_read_round_trips_in_bounds() {
        for has_alpha in [false, true] {
            let mut frame = Frame::blank(3, 2, has_alpha);
            let expected_alpha = if has_alpha { 17 } else { OPAQUE };
            for y in 0..2 {
                for x in 0..3 {
                    let c = PixelColor::new(x, y, x + y, 17);
                    frame.write(x, y, c);
                    assert_eq!(frame.read(x, y), PixelColor { a: expected_alpha, ..c });
                }
            }
        }
    }

    #[test]
    fn pixel_layout_is_row_major_rgb() {
        let mut frame = Frame::blank(2, 2, false);
        frame.write(1, 1, PixelColor::rgb(7, 8, 9));
        assert_eq!(&frame.as_bytes()[9..12], &[7, 8, 9]);

        let mut frame = Frame::blank(2, 2, true);
        frame.write(0, 1, PixelColor::new(1, 2, 3, 4));
        assert_eq!(&frame.as_bytes()[8..12], &[1, 2, 3, 4]);
    }

    #[test]
    fn read_without_alpha_reports_opaque() {
        let frame = Frame::blank(1, 1, false);
        assert_eq!(frame.read(0, 0).a, 255);
    }

    #[test]
    fn clone_is_deep() {
        let original = gradient(4, 3, true);
        let mut copy = original.clone();
        assert_eq!(copy, original);
        assert_ne!(copy.as_bytes().as_ptr(), original.as_bytes().as_ptr());

        copy.write(0, 0, PixelColor::WHITE);
        assert_ne!(copy.read(0, 0), original.read(0, 0));
        assert_eq!(original.read(0, 0), PixelColor::new(0, 0, 0, 200));
    }

    #[test]
    fn next_is_blank_with_same_shape() {
        let frame = gradient(4, 3, false);
        let next = frame.next();
        assert_eq!(next.dimensions(), frame.dimensions());
        assert_eq!(next.has_alpha(), frame.has_alpha());
        assert!(next.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn coerced_read_matches_clamped_read() {
        let frame = gradient(4, 3, true);
        for (x, y) in [(-1, -1), (4, 0), (10, 10), (-3, 2), (2, 7)] {
            let expected = frame.read(frame.coerce_x(x), frame.coerce_y(y));
            assert_eq!(frame.read_coerce(x, y), expected);
        }
        assert_eq!(frame.read_coerce(-1, -1), frame.read(0, 0));
        assert_eq!(frame.read_coerce(99, 99), frame.read(3, 2));
    }

    #[test]
    fn coerced_write_and_transform_land_on_edge() {
        let mut frame = Frame::blank(3, 3, false);
        frame.write_coerce(-4, 1, PixelColor::WHITE);
        assert_eq!(frame.read(0, 1), PixelColor::WHITE);

        frame.transform_coerce(8, 8, &|c| c.transform(|v| v + 5));
        assert_eq!(frame.read(2, 2), PixelColor::rgb(5, 5, 5));
    }

    #[test]
    fn transform_applies_function_in_place() {
        let mut frame = gradient(2, 2, true);
        frame.transform(1, 0, &|c| c.map_red(|r| r + 1));
        assert_eq!(frame.read(1, 0).r, 11);
    }

    #[test]
    fn rgba_image_round_trip_preserves_bytes() {
        let image = RgbaImage::from_fn(3, 2, |x, y| image::Rgba([x as u8, y as u8, 9, 128]));
        let frame = Frame::from(image.clone());
        assert!(frame.has_alpha());
        assert_eq!(frame.read(2, 1), PixelColor::new(2, 1, 9, 128));
        let back = frame.to_image().unwrap().into_rgba8();
        assert_eq!(back, image);
    }

    #[test]
    fn rgb_dynamic_image_has_no_alpha() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(2, 2));
        let frame = Frame::from(image);
        assert!(!frame.has_alpha());
        assert_eq!(frame.unit(), 3);
    }
}
