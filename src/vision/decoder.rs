use image::RgbImage;

use crate::error::RecognitionError;

/// Decodes uploaded bytes into an 8-bit RGB pixel matrix.
///
/// Gray, gray+alpha, RGBA and 16-bit sources are all converted here (gray is
/// replicated into three channels, alpha is dropped), so every later stage
/// sees the same R,G,B channel order.
pub fn decode(bytes: &[u8]) -> Result<RgbImage, RecognitionError> {
    let img = image::load_from_memory(bytes)?;
    Ok(img.to_rgb8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, ImageOutputFormat, Luma};
    use std::io::Cursor;

    #[test]
    fn garbage_is_a_decode_error() {
        let err = decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, RecognitionError::Decode(_)));
        assert!(matches!(decode(&[]), Err(RecognitionError::Decode(_))));
    }

    #[test]
    fn grayscale_png_becomes_replicated_rgb() {
        let gray = GrayImage::from_pixel(4, 3, Luma([77]));
        let mut bytes = Vec::new();
        DynamicImage::ImageLuma8(gray)
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .unwrap();

        let rgb = decode(&bytes).unwrap();
        assert_eq!(rgb.dimensions(), (4, 3));
        assert!(rgb.pixels().all(|p| p.0 == [77, 77, 77]));
    }
}
