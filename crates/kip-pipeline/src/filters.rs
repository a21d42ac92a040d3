//! Pixel selectors for [`retain_only`](crate::actions::retain_only).
//!
//! A selector sees the source frame and a pixel's color and answers
//! whether the pixel is kept. The bundled selectors only look at the
//! color; the frame is there for caller-written ones.

use crate::access::PixelAccess;
use crate::color::PixelColor;

/// Selector predicate.
pub type Selector = dyn Fn(&dyn PixelAccess, PixelColor) -> bool;

/// Mean of R, G and B strictly above `threshold`.
#[must_use]
pub fn gray_over(threshold: u32) -> impl Fn(&dyn PixelAccess, PixelColor) -> bool {
    move |_, c| mean(c) > f64::from(threshold)
}

/// Mean of R, G and B strictly below `threshold`.
#[must_use]
pub fn gray_under(threshold: u32) -> impl Fn(&dyn PixelAccess, PixelColor) -> bool {
    move |_, c| mean(c) < f64::from(threshold)
}

/// Brightest of R, G and B strictly above `threshold`.
#[must_use]
pub fn max_over(threshold: u32) -> impl Fn(&dyn PixelAccess, PixelColor) -> bool {
    move |_, c| c.r.max(c.g).max(c.b) > threshold
}

/// Brightest of R, G and B strictly below `threshold`.
#[must_use]
pub fn max_under(threshold: u32) -> impl Fn(&dyn PixelAccess, PixelColor) -> bool {
    move |_, c| c.r.max(c.g).max(c.b) < threshold
}

/// Darkest of R, G and B strictly above `threshold`.
#[must_use]
pub fn min_over(threshold: u32) -> impl Fn(&dyn PixelAccess, PixelColor) -> bool {
    move |_, c| c.r.min(c.g).min(c.b) > threshold
}

/// Darkest of R, G and B strictly below `threshold`.
#[must_use]
pub fn min_under(threshold: u32) -> impl Fn(&dyn PixelAccess, PixelColor) -> bool {
    move |_, c| c.r.min(c.g).min(c.b) < threshold
}

/// Every one of R, G and B strictly above its own threshold.
#[must_use]
pub fn channels_over(r: u32, g: u32, b: u32) -> impl Fn(&dyn PixelAccess, PixelColor) -> bool {
    move |_, c| c.r > r && c.g > g && c.b > b
}

/// Every one of R, G and B strictly below its own threshold.
#[must_use]
pub fn channels_under(r: u32, g: u32, b: u32) -> impl Fn(&dyn PixelAccess, PixelColor) -> bool {
    move |_, c| c.r < r && c.g < g && c.b < b
}

/// The negation of `selector`.
pub fn not(
    selector: impl Fn(&dyn PixelAccess, PixelColor) -> bool,
) -> impl Fn(&dyn PixelAccess, PixelColor) -> bool {
    move |src, c| !selector(src, c)
}

fn mean(c: PixelColor) -> f64 {
    f64::from(c.r + c.g + c.b) / 3.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;

    #[test]
    fn gray_thresholds_are_strict() {
        let frame = Frame::blank(1, 1, false);
        let c = PixelColor::rgb(10, 20, 31);
        assert!(gray_over(20)(&frame, c));
        assert!(!gray_over(21)(&frame, c));
        assert!(gray_under(21)(&frame, c));
        assert!(!gray_under(20)(&frame, PixelColor::rgb(20, 20, 20)));
    }

    #[test]
    fn max_and_min_look_at_extreme_channel() {
        let frame = Frame::blank(1, 1, false);
        let c = PixelColor::rgb(5, 100, 50);
        assert!(max_over(99)(&frame, c));
        assert!(!max_under(100)(&frame, c));
        assert!(min_under(6)(&frame, c));
        assert!(!min_over(5)(&frame, c));
    }

    #[test]
    fn channel_thresholds_need_every_channel() {
        let frame = Frame::blank(1, 1, false);
        let c = PixelColor::rgb(50, 60, 70);
        assert!(channels_over(49, 59, 69)(&frame, c));
        assert!(!channels_over(49, 60, 69)(&frame, c));
        assert!(channels_under(51, 61, 71)(&frame, c));
        assert!(!channels_under(51, 61, 70)(&frame, c));
    }

    #[test]
    fn not_negates() {
        let frame = Frame::blank(1, 1, false);
        let dark = not(gray_over(100));
        assert!(dark(&frame, PixelColor::BLACK));
        assert!(!dark(&frame, PixelColor::WHITE));
    }
}
