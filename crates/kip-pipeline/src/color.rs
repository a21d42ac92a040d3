//! RGBA pixel color value.
//!
//! [`PixelColor`] is what every pipeline action reads and returns. Its
//! channels are plain `u32` values that are expected to stay within
//! `0..=255`; the type does not clamp on its own, so intermediate
//! arithmetic (sums, scaling) can temporarily leave that range and the
//! caller decides how to bring it back. Writing a color into a
//! [`Frame`](crate::Frame) keeps only the low byte of each channel.

use std::ops::Add;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A four-channel color with channels in the logical range `0..=255`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelColor {
    /// Red channel.
    pub r: u32,
    /// Green channel.
    pub g: u32,
    /// Blue channel.
    pub b: u32,
    /// Alpha channel. Informational only: the core never blends with it.
    pub a: u32,
}

/// Alpha reported for pixels read from frames without an alpha channel.
pub const OPAQUE: u32 = 255;

impl PixelColor {
    /// Opaque black.
    pub const BLACK: Self = Self::new(0, 0, 0, OPAQUE);
    /// Opaque white.
    pub const WHITE: Self = Self::new(255, 255, 255, OPAQUE);

    /// Create a color from its four channels.
    #[must_use]
    pub const fn new(r: u32, g: u32, b: u32, a: u32) -> Self {
        Self { r, g, b, a }
    }

    /// Create a fully opaque color.
    #[must_use]
    pub const fn rgb(r: u32, g: u32, b: u32) -> Self {
        Self::new(r, g, b, OPAQUE)
    }

    /// Create a color from raw channel bytes.
    #[must_use]
    pub const fn from_bytes(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::new(r as u32, g as u32, b as u32, a as u32)
    }

    /// The low byte of each channel, in R, G, B, A order.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn to_bytes(self) -> [u8; 4] {
        [self.r as u8, self.g as u8, self.b as u8, self.a as u8]
    }

    /// Apply `on_channel` to all four channels, alpha included.
    #[must_use]
    pub fn transform(self, on_channel: impl Fn(u32) -> u32) -> Self {
        Self::new(
            on_channel(self.r),
            on_channel(self.g),
            on_channel(self.b),
            on_channel(self.a),
        )
    }

    /// Apply `on_channel` to R, G and B and `on_alpha` to A.
    #[must_use]
    pub fn transform_with_alpha(
        self,
        on_channel: impl Fn(u32) -> u32,
        on_alpha: impl Fn(u32) -> u32,
    ) -> Self {
        Self::new(
            on_channel(self.r),
            on_channel(self.g),
            on_channel(self.b),
            on_alpha(self.a),
        )
    }

    /// Transform only the red channel.
    #[must_use]
    pub fn map_red(self, f: impl Fn(u32) -> u32) -> Self {
        Self { r: f(self.r), ..self }
    }

    /// Transform only the green channel.
    #[must_use]
    pub fn map_green(self, f: impl Fn(u32) -> u32) -> Self {
        Self { g: f(self.g), ..self }
    }

    /// Transform only the blue channel.
    #[must_use]
    pub fn map_blue(self, f: impl Fn(u32) -> u32) -> Self {
        Self { b: f(self.b), ..self }
    }

    /// Transform only the alpha channel.
    #[must_use]
    pub fn map_alpha(self, f: impl Fn(u32) -> u32) -> Self {
        Self { a: f(self.a), ..self }
    }

    /// Unweighted mean of R, G and B (integer division).
    #[must_use]
    pub const fn gray_value(self) -> u32 {
        (self.r + self.g + self.b) / 3
    }

    /// This color with R, G and B replaced by [`gray_value`](Self::gray_value).
    #[must_use]
    pub const fn grayscale(self) -> Self {
        let gray = self.gray_value();
        Self::new(gray, gray, gray, self.a)
    }

    /// Multiply R, G and B by `factor`, truncating toward zero. Alpha is
    /// kept.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn scale(self, factor: f64) -> Self {
        let apply = |c: u32| (f64::from(c) * factor) as u32;
        Self::new(apply(self.r), apply(self.g), apply(self.b), self.a)
    }

    /// Divide R, G and B by `divisor`, truncating toward zero. Alpha is
    /// kept.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn divide(self, divisor: f64) -> Self {
        let apply = |c: u32| (f64::from(c) / divisor) as u32;
        Self::new(apply(self.r), apply(self.g), apply(self.b), self.a)
    }
}

/// Channel-wise sum of R, G and B; alpha becomes the mean of both alphas.
impl Add for PixelColor {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(
            self.r + other.r,
            self.g + other.g,
            self.b + other.b,
            (self.a + other.a) / 2,
        )
    }
}

/// Error returned when parsing a hex color string fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid hex color {0:?}: expected #rrggbb or #rrggbbaa")]
pub struct ParseColorError(String);

impl FromStr for PixelColor {
    type Err = ParseColorError;

    /// Parse `rrggbb` or `rrggbbaa`, with an optional leading `#`.
    ///
    /// A missing alpha component parses as 0, as in the `#rrggbb` form
    /// the alpha is simply absent.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if !matches!(hex.len(), 6 | 8) || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ParseColorError(s.to_owned()));
        }
        let channel = |idx: usize| {
            hex.get(idx * 2..idx * 2 + 2)
                .and_then(|pair| u32::from_str_radix(pair, 16).ok())
                .ok_or_else(|| ParseColorError(s.to_owned()))
        };
        let a = if hex.len() == 8 { channel(3)? } else { 0 };
        Ok(Self::new(channel(0)?, channel(1)?, channel(2)?, a))
    }
}
