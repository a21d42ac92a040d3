//! Ready-made pixel functions for the builder.
//!
//! Color mappers plug into
//! [`PipelineBuilder::map_color`](crate::PipelineBuilder::map_color),
//! [`smooth`] and [`context_filter`] into
//! [`map_with_neighbors_at`](crate::PipelineBuilder::map_with_neighbors_at),
//! [`retain_only`] into
//! [`map_with_neighbors`](crate::PipelineBuilder::map_with_neighbors),
//! and [`gaussian_blur`] into [`paint`](crate::PipelineBuilder::paint).
//!
//! Channel-wise mappers take a [`Channels`] selector. [`Channels::All`]
//! touches alpha as well as R, G and B, so for example [`invert`] turns
//! an opaque pixel fully transparent in frames that carry alpha.

use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::access::PixelAccess;
use crate::color::PixelColor;
use crate::mask;

pub use crate::blur::gaussian_blur;

/// Which channels a channel-wise mapper changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Channels {
    /// R, G, B and A.
    #[default]
    All,
    /// R only.
    Red,
    /// G only.
    Green,
    /// B only.
    Blue,
}

impl Channels {
    /// Apply `f` to the selected channels of `color`.
    #[must_use]
    pub fn apply(self, color: PixelColor, f: impl Fn(u32) -> u32) -> PixelColor {
        match self {
            Self::All => color.transform(f),
            Self::Red => color.map_red(f),
            Self::Green => color.map_green(f),
            Self::Blue => color.map_blue(f),
        }
    }
}

/// Turn a curve over `0.0..=255.0` into a channel mapper: the curve's
/// output is clamped to the byte range and rounded.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn channel_mapper(curve: impl Fn(f64) -> f64) -> impl Fn(u32) -> u32 {
    move |v| curve(f64::from(v)).clamp(0.0, 255.0).round() as u32
}

/// Leaves every color unchanged.
#[must_use]
pub fn identity() -> impl Fn(PixelColor) -> PixelColor {
    |c| c
}

/// `255 - v` on all four channels.
#[must_use]
pub fn invert() -> impl Fn(PixelColor) -> PixelColor {
    |c| c.transform(|v| 255u32.saturating_sub(v))
}

/// Moves every channel `rate` of the way toward 255.
#[must_use]
pub fn brighten(rate: f64) -> impl Fn(PixelColor) -> PixelColor {
    let mapper = channel_mapper(move |v| v + (255.0 - v) * rate);
    move |c| c.transform(&mapper)
}

/// Pushes channels away from `split * 255`: values at or below it move
/// `rate` of the way toward 0, values above it toward 255.
#[must_use]
pub fn saturate(rate: f64, split: f64, channels: Channels) -> impl Fn(PixelColor) -> PixelColor {
    let abs_split = split * 255.0;
    let mapper = channel_mapper(move |v| {
        let target = if v <= abs_split { 0.0 } else { 255.0 };
        v + (target - v) * rate
    });
    move |c| channels.apply(c, &mapper)
}

/// Moves channels `rate` of the way toward the pixel's gray value.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn desaturate(rate: f64, channels: Channels) -> impl Fn(PixelColor) -> PixelColor {
    move |c| {
        let gray = f64::from(c.gray_value());
        channels.apply(c, |v| {
            let v = f64::from(v);
            (v + (gray - v) * rate) as u32
        })
    }
}

/// Reshapes channels with `curve` (see [`channel_mapper`]).
pub fn curves(
    curve: impl Fn(f64) -> f64,
    channels: Channels,
) -> impl Fn(PixelColor) -> PixelColor {
    let mapper = channel_mapper(curve);
    move |c| channels.apply(c, &mapper)
}

/// Weighted gray: `(r * rw + g * gw + b * bw) / 3`, clamped and
/// truncated. Weights of 1.0 give the plain mean. Alpha is kept.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn grayscale(r_weight: f64, g_weight: f64, b_weight: f64) -> impl Fn(PixelColor) -> PixelColor {
    move |c| {
        let weighted =
            f64::from(c.r) * r_weight + f64::from(c.g) * g_weight + f64::from(c.b) * b_weight;
        let gray = (weighted / 3.0).clamp(0.0, 255.0) as u32;
        PixelColor::new(gray, gray, gray, c.a)
    }
}

/// Caches `f`'s result per distinct input.
///
/// Worth it for expensive mappers on images with few distinct colors.
/// The cache is never evicted.
pub fn memoized<T, R>(f: impl Fn(T) -> R) -> impl Fn(T) -> R
where
    T: Eq + Hash + Clone,
    R: Clone,
{
    let cache = RefCell::new(HashMap::new());
    move |input: T| {
        if let Some(hit) = cache.borrow().get(&input) {
            return R::clone(hit);
        }
        let result = f(input.clone());
        cache.borrow_mut().insert(input, result.clone());
        result
    }
}

/// Weighted mean over a neighborhood.
///
/// `mask` picks the offsets within `radius`, `weight` scales each one by
/// its distance from the center. Every weighted sample is divided by the
/// number of offsets, so uniform weight 1.0 gives the plain mean. All
/// four channels are averaged; samples near the edge are clamped into
/// the frame.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn smooth(
    radius: u32,
    mask: impl Fn(i64, i64, i64) -> bool,
    weight: impl Fn(u32, u32) -> f64,
) -> impl Fn(&dyn PixelAccess, u32, u32, PixelColor) -> PixelColor {
    let offsets = mask::select(radius, &mask);
    let weights: Vec<f64> = offsets.iter().map(|o| weight(o.distance, radius)).collect();
    let global = 1.0 / offsets.len().max(1) as f64;
    move |src, x, y, _| {
        let mut sum = [0.0f64; 4];
        for (offset, w) in offsets.iter().zip(&weights) {
            let c = src.read_coerce(i64::from(x) + offset.dx, i64::from(y) + offset.dy);
            for (acc, v) in sum.iter_mut().zip([c.r, c.g, c.b, c.a]) {
                *acc += f64::from(v) * w * global;
            }
        }
        let [r, g, b, a] = sum.map(|v| v.round().clamp(0.0, 255.0) as u32);
        PixelColor::new(r, g, b, a)
    }
}

/// [`smooth`] with a circular mask and uniform weight.
#[must_use]
pub fn smooth_uniform(radius: u32) -> impl Fn(&dyn PixelAccess, u32, u32, PixelColor) -> PixelColor {
    smooth(radius, mask::circle(), mask::uniform(1.0))
}

/// Hands `transform` every neighbor `mask` accepts within `radius`, as
/// `(dx, dy, color)` in row order with the center left out, together with
/// the pixel's own color.
///
/// Offsets are relative to the pixel being mapped; reads past the border
/// clamp to the nearest edge pixel.
pub fn context_filter(
    radius: u32,
    mask: impl Fn(i64, i64, i64) -> bool,
    transform: impl Fn(&[(i64, i64, PixelColor)], PixelColor) -> PixelColor,
) -> impl Fn(&dyn PixelAccess, u32, u32, PixelColor) -> PixelColor {
    let offsets: Vec<(i64, i64)> = mask::select(radius, &mask)
        .into_iter()
        .map(|o| (o.dx, o.dy))
        .filter(|&offset| offset != (0, 0))
        .collect();
    move |src, x, y, c| {
        let neighbors: Vec<_> = offsets
            .iter()
            .map(|&(dx, dy)| (dx, dy, src.read_coerce(i64::from(x) + dx, i64::from(y) + dy)))
            .collect();
        transform(&neighbors, c)
    }
}

/// Keeps pixels `selector` accepts and paints the rest opaque black.
pub fn retain_only(
    selector: impl Fn(&dyn PixelAccess, PixelColor) -> bool,
) -> impl Fn(&dyn PixelAccess, PixelColor) -> PixelColor {
    move |src, c| if selector(src, c) { c } else { PixelColor::BLACK }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::access::MutablePixelAccess;
    use crate::filters;
    use crate::frame::Frame;

    #[test]
    fn invert_flips_all_channels() {
        let c = invert()(PixelColor::new(10, 20, 30, 255));
        assert_eq!(c, PixelColor::new(245, 235, 225, 0));
    }

    #[test]
    fn brighten_moves_toward_white() {
        let c = brighten(0.5)(PixelColor::new(0, 100, 255, 255));
        assert_eq!(c, PixelColor::new(128, 178, 255, 255));
        assert_eq!(brighten(0.0)(PixelColor::rgb(7, 8, 9)), PixelColor::rgb(7, 8, 9));
    }

    #[test]
    fn saturate_splits_channels() {
        let c = saturate(1.0, 0.5, Channels::All)(PixelColor::new(100, 200, 127, 255));
        assert_eq!(c, PixelColor::new(0, 255, 0, 255));

        let red_only = saturate(0.5, 0.5, Channels::Red)(PixelColor::new(200, 200, 200, 9));
        assert_eq!(red_only, PixelColor::new(228, 200, 200, 9));
    }

    #[test]
    fn desaturate_moves_toward_gray() {
        let c = PixelColor::new(30, 60, 90, 60);
        assert_eq!(desaturate(1.0, Channels::All)(c), PixelColor::new(60, 60, 60, 60));
        assert_eq!(desaturate(0.5, Channels::Blue)(c), PixelColor::new(30, 60, 75, 60));
    }

    #[test]
    fn curves_clamp_and_round() {
        let doubled = curves(|v| v * 2.0, Channels::Green)(PixelColor::new(10, 200, 10, 10));
        assert_eq!(doubled, PixelColor::new(10, 255, 10, 10));

        let thirds = curves(|v| v / 3.0, Channels::All)(PixelColor::new(2, 4, 5, 255));
        assert_eq!(thirds, PixelColor::new(1, 1, 2, 85));
    }

    #[test]
    fn grayscale_weights_and_keeps_alpha() {
        let c = PixelColor::new(30, 60, 90, 7);
        assert_eq!(grayscale(1.0, 1.0, 1.0)(c), PixelColor::new(60, 60, 60, 7));
        assert_eq!(grayscale(3.0, 0.0, 0.0)(c), PixelColor::new(30, 30, 30, 7));
        assert_eq!(grayscale(10.0, 10.0, 10.0)(c).r, 255);
    }

    #[test]
    fn memoized_calls_once_per_input() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let f = memoized(move |c: PixelColor| {
            counter.set(counter.get() + 1);
            invert()(c)
        });
        for _ in 0..3 {
            assert_eq!(f(PixelColor::BLACK), PixelColor::new(255, 255, 255, 0));
        }
        f(PixelColor::WHITE);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn smooth_averages_neighbors() {
        let mut frame = Frame::blank(3, 3, true);
        frame.write(1, 1, PixelColor::new(250, 50, 0, 255));
        let f = smooth(1, mask::circle(), mask::uniform(1.0));

        // Center plus four zero neighbors: 250 / 5 = 50.
        assert_eq!(f(&frame, 1, 1, PixelColor::BLACK), PixelColor::new(50, 10, 0, 51));
        // A plus-shaped mask at (0, 0) never samples (1, 1).
        assert_eq!(f(&frame, 0, 0, PixelColor::BLACK), PixelColor::new(0, 0, 0, 0));
    }

    #[test]
    fn smooth_radius_zero_is_identity() {
        let mut frame = Frame::blank(2, 2, false);
        frame.write(1, 0, PixelColor::rgb(9, 8, 7));
        let f = smooth_uniform(0);
        assert_eq!(f(&frame, 1, 0, PixelColor::BLACK), PixelColor::rgb(9, 8, 7));
    }

    fn coordinate_frame() -> Frame {
        let mut frame = Frame::blank(3, 3, false);
        for y in 0..3 {
            for x in 0..3 {
                frame.write(x, y, PixelColor::rgb(x * 10, y * 10, 0));
            }
        }
        frame
    }

    #[test]
    fn context_filter_lists_neighbors_without_center() {
        let frame = coordinate_frame();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let f = context_filter(1, mask::circle(), move |neighbors, c| {
            sink.borrow_mut().extend_from_slice(neighbors);
            c
        });

        assert_eq!(f(&frame, 1, 1, PixelColor::WHITE), PixelColor::WHITE);
        assert_eq!(
            *seen.borrow(),
            vec![
                (0, -1, PixelColor::rgb(10, 0, 0)),
                (-1, 0, PixelColor::rgb(0, 10, 0)),
                (1, 0, PixelColor::rgb(20, 10, 0)),
                (0, 1, PixelColor::rgb(10, 20, 0)),
            ],
        );
    }

    #[test]
    fn context_filter_clamps_at_border() {
        let frame = coordinate_frame();
        let brightest = context_filter(1, mask::square(), |neighbors, _| {
            neighbors
                .iter()
                .map(|&(_, _, c)| c)
                .max_by_key(|c| c.r + c.g)
                .unwrap_or(PixelColor::BLACK)
        });
        // (2, 2) itself is excluded, but (1, 0) and (0, 1) offsets clamp back onto it.
        assert_eq!(brightest(&frame, 2, 2, PixelColor::BLACK), PixelColor::rgb(20, 20, 0));
        assert_eq!(brightest(&frame, 0, 0, PixelColor::BLACK), PixelColor::rgb(10, 10, 0));
    }

    #[test]
    fn context_filter_radius_zero_sees_nothing() {
        let frame = coordinate_frame();
        let any = context_filter(0, mask::square(), |neighbors, _| {
            if neighbors.is_empty() {
                PixelColor::BLACK
            } else {
                PixelColor::WHITE
            }
        });
        assert_eq!(any(&frame, 1, 1, PixelColor::WHITE), PixelColor::BLACK);
    }

    #[test]
    fn retain_only_blackens_rejected_pixels() {
        let frame = Frame::blank(1, 1, false);
        let f = retain_only(filters::gray_over(100));
        assert_eq!(f(&frame, PixelColor::rgb(200, 200, 200)), PixelColor::rgb(200, 200, 200));
        assert_eq!(f(&frame, PixelColor::new(10, 10, 10, 3)), PixelColor::BLACK);
    }
}
