//! Splits an image into candidate digit regions in reading order.
//!
//! The foreground mask comes from an inverted adaptive threshold: a pixel is
//! ink when it is darker than its Gaussian-weighted neighbourhood mean by at
//! least `offset`. Only outermost contours become regions, so the loop of a
//! `0` or the counter of a `6` does not produce a second region.

use image::{GrayImage, ImageBuffer, Luma, RgbImage};
use imageproc::contours::find_contours;

use crate::config::SegmentationConfig;
use crate::vision::region::Region;

const INK: u8 = 255;

type MeanImage = ImageBuffer<Luma<f32>, Vec<f32>>;

#[derive(Debug, Clone)]
pub struct Segmenter {
    config: SegmentationConfig,
}

impl Segmenter {
    pub fn new(config: SegmentationConfig) -> Self {
        Segmenter { config }
    }

    /// Binary ink mask (255 = foreground) for a grayscale image.
    ///
    /// The local mean uses a Gaussian of exactly `block_size` taps with
    /// replicated borders, kept in `f32` and rounded to the nearest level
    /// before the comparison.
    pub fn threshold(&self, gray: &GrayImage) -> GrayImage {
        let kernel = gaussian_kernel(self.config.block_size, self.config.gaussian_sigma());
        let mean = local_mean(gray, &kernel);
        let offset = self.config.offset as i32;
        GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
            let src = gray.get_pixel(x, y)[0] as i32;
            let local = mean.get_pixel(x, y)[0].round() as i32;
            if src <= local - offset { Luma([INK]) } else { Luma([0]) }
        })
    }

    /// Ordered regions for `image`, left edge ascending.
    ///
    /// Regions sharing a left edge keep contour discovery order.
    pub fn segment(&self, image: &RgbImage) -> Vec<Region> {
        let gray = image::imageops::grayscale(image);
        let mask = self.threshold(&gray);
        let mut regions = external_regions(&mask);

        let min_area = self.config.min_region_area;
        if min_area > 0 {
            regions.retain(|r| r.area() >= min_area);
        }
        regions.sort_by_key(|r| r.x);
        regions
    }
}

/// Normalized 1-D Gaussian with `taps` coefficients centred on the middle one.
fn gaussian_kernel(taps: u32, sigma: f32) -> Vec<f32> {
    let half = (taps / 2) as i32;
    let weights: Vec<f32> = (-half..=half)
        .map(|i| (-((i * i) as f32) / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / sum).collect()
}

/// Separable convolution of `gray` with `kernel` along both axes.
fn local_mean(gray: &GrayImage, kernel: &[f32]) -> MeanImage {
    let (width, height) = gray.dimensions();
    let half = (kernel.len() / 2) as i64;
    let clamp = |v: i64, len: u32| v.clamp(0, len as i64 - 1) as u32;

    let rows: MeanImage = ImageBuffer::from_fn(width, height, |x, y| {
        let sum: f32 = kernel
            .iter()
            .enumerate()
            .map(|(k, w)| w * gray.get_pixel(clamp(x as i64 + k as i64 - half, width), y)[0] as f32)
            .sum();
        Luma([sum])
    });
    ImageBuffer::from_fn(width, height, |x, y| {
        let sum: f32 = kernel
            .iter()
            .enumerate()
            .map(|(k, w)| w * rows.get_pixel(x, clamp(y as i64 + k as i64 - half, height))[0])
            .sum();
        Luma([sum])
    })
}

/// Bounding boxes of contours with no enclosing contour.
fn external_regions(mask: &GrayImage) -> Vec<Region> {
    find_contours::<u32>(mask)
        .into_iter()
        .filter(|c| c.parent.is_none())
        .filter_map(|c| Region::bounding(c.points.iter().map(|p| (p.x, p.y))))
        .collect()
}
