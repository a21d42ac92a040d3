//! Gaussian blur as a whole-frame action.
//!
//! Wraps [`imageproc::filter::gaussian_blur_f32`], which only accepts
//! single-channel images: the frame is split into four `f32` channel
//! images, each is blurred independently and the results are rounded back
//! into the frame. Gaussian blur is linear and per-channel, so this equals
//! blurring in color space.
//!
//! The channels are `f32` rather than `u8` because the separable filter
//! truncates to the subpixel type after each pass; on 8-bit channels a
//! uniform frame would lose up to two levels.

use image::{ImageBuffer, Luma};

use crate::access::{MutablePixelAccess, PixelAccess};
use crate::color::PixelColor;

type Channel = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Blur every channel with standard deviation `sigma`.
///
/// Non-positive sigma values leave the frame unchanged, since
/// `imageproc`'s underlying function panics on `sigma <= 0.0`.
#[must_use]
pub fn gaussian_blur(sigma: f32) -> impl Fn(&mut dyn MutablePixelAccess) {
    move |frame| {
        if sigma <= 0.0 || frame.width() == 0 || frame.height() == 0 {
            return;
        }
        let blurred = split_channels(&*frame)
            .map(|channel| imageproc::filter::gaussian_blur_f32(&channel, sigma));
        for y in 0..frame.height() {
            for x in 0..frame.width() {
                let [r, g, b, a] =
                    std::array::from_fn(|c| to_byte(blurred[c].get_pixel(x, y).0[0]));
                frame.write(x, y, PixelColor::new(r, g, b, a));
            }
        }
    }
}

/// One `f32` image per channel, R, G, B, A.
#[allow(clippy::cast_precision_loss)]
fn split_channels<A: PixelAccess + ?Sized>(frame: &A) -> [Channel; 4] {
    let (w, h) = (frame.width(), frame.height());
    std::array::from_fn(|c| {
        Channel::from_fn(w, h, |x, y| {
            let color = frame.read(x, y);
            Luma([[color.r, color.g, color.b, color.a][c] as f32])
        })
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_byte(value: f32) -> u32 {
    value.round().clamp(0.0, 255.0) as u32
}
