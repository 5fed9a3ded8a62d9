//! Raster normalization and JPEG/base64 encoding for vision requests.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgb, RgbImage};

use super::error::{OcrError, OcrResult};

pub const JPEG_MIME: &str = "image/jpeg";

/// A page raster ready to embed in a chat request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub width: u32,
    pub height: u32,
    /// Size of the JPEG before base64.
    pub byte_len: usize,
    pub base64: String,
}

impl EncodedImage {
    /// `data:image/jpeg;base64,...` URL.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", JPEG_MIME, self.base64)
    }
}

/// Converts any color mode to opaque RGB, compositing transparency over white.
pub fn flatten_to_rgb(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, px) in rgba.enumerate_pixels() {
        let [r, g, b, a] = px.0;
        let alpha = u16::from(a);
        let blend = |c: u8| -> u8 { ((u16::from(c) * alpha + 255 * (255 - alpha)) / 255) as u8 };
        out.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }
    out
}

/// Flattens `image` and encodes it as base64 JPEG at `quality` (1..=100).
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> OcrResult<EncodedImage> {
    let rgb = flatten_to_rgb(image);

    let mut bytes = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
    encoder
        .encode_image(&rgb)
        .map_err(|e| OcrError::Encode(e.to_string()))?;

    Ok(EncodedImage {
        width: rgb.width(),
        height: rgb.height(),
        byte_len: bytes.len(),
        base64: BASE64.encode(&bytes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_transparent_pixels_become_white() {
        let mut rgba = RgbaImage::new(2, 1);
        rgba.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        rgba.put_pixel(1, 0, Rgba([10, 20, 30, 255]));

        let rgb = flatten_to_rgb(&DynamicImage::ImageRgba8(rgba));

        assert_eq!(rgb.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(rgb.get_pixel(1, 0), &Rgb([10, 20, 30]));
    }

    #[test]
    fn test_half_alpha_blends_toward_white() {
        let mut rgba = RgbaImage::new(1, 1);
        rgba.put_pixel(0, 0, Rgba([0, 0, 0, 128]));

        let rgb = flatten_to_rgb(&DynamicImage::ImageRgba8(rgba));
        let Rgb([r, g, b]) = *rgb.get_pixel(0, 0);

        assert_eq!(r, g);
        assert_eq!(g, b);
        assert!((120..=135).contains(&r));
    }

    #[test]
    fn test_grayscale_is_expanded() {
        let gray = DynamicImage::new_luma8(3, 3);
        let rgb = flatten_to_rgb(&gray);
        assert_eq!(rgb.dimensions(), (3, 3));
        assert_eq!(rgb.get_pixel(1, 1), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_encode_jpeg_produces_jpeg_data_url() {
        let image = DynamicImage::new_rgba8(16, 8);

        let encoded = encode_jpeg(&image, 85).unwrap();

        assert_eq!((encoded.width, encoded.height), (16, 8));
        assert!(encoded.byte_len > 0);
        let raw = BASE64.decode(&encoded.base64).unwrap();
        assert_eq!(raw.len(), encoded.byte_len);
        assert_eq!(&raw[..2], &[0xFF, 0xD8]);
        assert!(encoded.data_url().starts_with("data:image/jpeg;base64,"));
    }
}
