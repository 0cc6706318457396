#![allow(dead_code)]

use std::io::Cursor;

use digit_lens::classifier::ShadeClassifier;
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};

/// White canvas with one filled block per digit, shaded so that
/// `ShadeClassifier` reads the digit back.
pub fn shaded_digits(digits: &[u8]) -> RgbImage {
    let mut img = RgbImage::from_pixel(30 + 34 * digits.len() as u32, 64, Rgb([255, 255, 255]));
    for (i, &d) in digits.iter().enumerate() {
        let shade = ShadeClassifier::shade_for(d);
        let x0 = 16 + 34 * i as u32;
        for y in 14..50 {
            for x in x0..x0 + 16 {
                img.put_pixel(x, y, Rgb([shade, shade, shade]));
            }
        }
    }
    img
}

pub fn png(img: DynamicImage) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageOutputFormat::Png).unwrap();
    out.into_inner()
}

pub fn digits_png(digits: &[u8]) -> Vec<u8> {
    png(DynamicImage::ImageRgb8(shaded_digits(digits)))
}
