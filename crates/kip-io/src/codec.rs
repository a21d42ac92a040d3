//! In-memory decoding and encoding of frames.

use std::io::Cursor;

use image::{DynamicImage, ImageEncoder, ImageFormat};
use kip_pipeline::{Frame, ImageStack};

use crate::error::IoError;

/// Decode image bytes into a fresh [`ImageStack`].
///
/// The format is guessed from the bytes. Frames keep alpha only when the
/// source color type has it.
///
/// # Errors
///
/// Returns [`IoError::EmptyInput`] for an empty slice and
/// [`IoError::ImageDecode`] when the bytes are not a supported image.
pub fn decode(bytes: &[u8], keep_history: bool) -> Result<ImageStack, IoError> {
    if bytes.is_empty() {
        return Err(IoError::EmptyInput);
    }
    let image = image::load_from_memory(bytes).map_err(|e| IoError::decode(&e))?;
    let frame = Frame::from(image);
    tracing::debug!(
        dimensions = %frame.dimensions(),
        has_alpha = frame.has_alpha(),
        "decoded image",
    );
    Ok(ImageStack::new(frame, keep_history))
}

/// Encode a frame as PNG (`Rgba8` or `Rgb8`).
///
/// # Errors
///
/// Returns [`IoError::ImageEncode`] if PNG encoding fails.
pub fn encode_png(frame: &Frame) -> Result<Vec<u8>, IoError> {
    let color = if frame.has_alpha() {
        image::ExtendedColorType::Rgba8
    } else {
        image::ExtendedColorType::Rgb8
    };
    let dims = frame.dimensions();
    let mut png_bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
    encoder
        .write_image(frame.as_bytes(), dims.width, dims.height, color)
        .map_err(|e| IoError::encode(&e))?;
    Ok(png_bytes)
}

/// Encode a frame in any enabled output format.
///
/// JPEG has no alpha channel, so alpha is dropped for it.
///
/// # Errors
///
/// Returns [`IoError::ImageEncode`] if the format cannot be written.
pub fn encode(frame: &Frame, format: ImageFormat) -> Result<Vec<u8>, IoError> {
    if format == ImageFormat::Png {
        return encode_png(frame);
    }
    let mut image = frame.to_image().map_err(|e| IoError::encode(&e))?;
    if format == ImageFormat::Jpeg && frame.has_alpha() {
        image = DynamicImage::ImageRgb8(image.into_rgb8());
    }
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, format)
        .map_err(|e| IoError::encode(&e))?;
    Ok(out.into_inner())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use kip_pipeline::{MutablePixelAccess, PixelAccess, PixelColor};

    use super::*;

    fn checker(has_alpha: bool) -> Frame {
        let mut frame = Frame::blank(4, 3, has_alpha);
        for y in 0..3 {
            for x in 0..4 {
                let v = if (x + y) % 2 == 0 { 255 } else { 0 };
                frame.write(x, y, PixelColor::new(v, 255 - v, x * 20, 128 + y));
            }
        }
        frame
    }

    #[test]
    fn empty_input_returns_error() {
        assert!(matches!(decode(&[], false), Err(IoError::EmptyInput)));
    }

    #[test]
    fn corrupt_bytes_returns_image_decode_error() {
        let result = decode(&[0xFF, 0xFE, 0x00, 0x01], false);
        assert!(matches!(result, Err(IoError::ImageDecode(_))));
    }

    #[test]
    fn png_keeps_pixels_and_alpha() {
        let frame = checker(true);
        let stack = decode(&encode_png(&frame).unwrap(), true).unwrap();
        assert_eq!(stack.len(), 1);
        assert!(stack.keep_history());
        assert_eq!(*stack.top(), frame);
    }

    #[test]
    fn rgb_png_decodes_without_alpha() {
        let frame = checker(false);
        let stack = decode(&encode_png(&frame).unwrap(), false).unwrap();
        let top = stack.top();
        assert!(!top.has_alpha());
        assert_eq!(top.read(1, 0).a, 255);
        assert_eq!(*top, frame);
    }

    #[test]
    fn jpeg_drops_alpha() {
        let bytes = encode(&checker(true), ImageFormat::Jpeg).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
        let stack = decode(&bytes, false).unwrap();
        assert!(!stack.top().has_alpha());
        assert_eq!(stack.top().dimensions().width, 4);
    }

    #[test]
    fn bmp_encodes() {
        let bytes = encode(&checker(false), ImageFormat::Bmp).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Bmp);
    }
}
