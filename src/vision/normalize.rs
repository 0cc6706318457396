use image::imageops::{self, FilterType};
use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::RecognitionError;
use crate::vision::region::Region;

/// Spatial size and channel count of a classifier input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TensorShape {
    pub height: u32,
    pub width: u32,
    pub channels: u32,
}

impl TensorShape {
    pub const fn new(height: u32, width: u32, channels: u32) -> Self {
        TensorShape { height, width, channels }
    }

    /// Number of values in one sample.
    pub fn len(&self) -> usize {
        self.height as usize * self.width as usize * self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Batch-first NHWC dimensions with a batch of one.
    pub fn dims(&self) -> [usize; 4] {
        [1, self.height as usize, self.width as usize, self.channels as usize]
    }
}

/// One region's pixels, resized and scaled to [0, 1].
///
/// Values are stored NHWC, channels interleaved per pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTensor {
    shape: TensorShape,
    data: Vec<f64>,
}

impl NormalizedTensor {
    pub fn shape(&self) -> TensorShape {
        self.shape
    }

    pub fn dims(&self) -> [usize; 4] {
        self.shape.dims()
    }

    pub fn values(&self) -> &[f64] {
        &self.data
    }

    pub fn mean(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().sum::<f64>() / self.data.len() as f64
    }
}

/// Crops `region` out of `image` and turns it into a tensor of `shape`.
///
/// The crop is bilinearly resized to the target size first, then reduced to
/// luma (1 channel) or kept as RGB (3 channels), then divided by 255.
pub fn normalize(image: &RgbImage, region: Region, shape: TensorShape) -> Result<NormalizedTensor, RecognitionError> {
    if shape.channels != 1 && shape.channels != 3 {
        return Err(RecognitionError::UnsupportedChannels { channels: shape.channels });
    }
    if region.is_empty() {
        return Err(RecognitionError::EmptyCrop { region });
    }
    if !region.fits_within(image.width(), image.height()) {
        return Err(RecognitionError::RegionOutOfBounds {
            region,
            width: image.width(),
            height: image.height(),
        });
    }

    let crop = imageops::crop_imm(image, region.x, region.y, region.width, region.height).to_image();
    let resized = imageops::resize(&crop, shape.width, shape.height, FilterType::Triangle);

    let data: Vec<f64> = if shape.channels == 1 {
        imageops::grayscale(&resized)
            .pixels()
            .map(|p| p.0[0] as f64 / 255.0)
            .collect()
    } else {
        resized
            .pixels()
            .flat_map(|p| p.0.iter().map(|&c| c as f64 / 255.0))
            .collect()
    };

    Ok(NormalizedTensor { shape, data })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gradient(w: u32, h: u32) -> RgbImage {
        RgbImage::from_fn(w, h, |x, y| Rgb([(x * 7 % 256) as u8, (y * 5 % 256) as u8, 128]))
    }

    #[test]
    fn output_shape_is_fixed_regardless_of_crop() {
        let img = gradient(200, 120);
        let shapes = [TensorShape::new(28, 28, 1), TensorShape::new(64, 64, 3)];
        let crops = [Region::new(0, 0, 1, 1), Region::new(3, 4, 5, 90), Region::new(10, 0, 190, 120)];
        for shape in shapes {
            for crop in crops {
                let t = normalize(&img, crop, shape).unwrap();
                assert_eq!(t.shape(), shape);
                assert_eq!(t.values().len(), shape.len());
                assert_eq!(t.dims()[0], 1);
                assert!(t.values().iter().all(|v| (0.0..=1.0).contains(v)));
            }
        }
    }

    #[test]
    fn uniform_crop_keeps_its_level() {
        let img = RgbImage::from_pixel(30, 30, Rgb([51, 51, 51]));
        let t = normalize(&img, Region::new(2, 2, 9, 13), TensorShape::new(28, 28, 1)).unwrap();
        assert!((t.mean() - 0.2).abs() < 0.01);
    }

    #[test]
    fn rgb_channels_are_interleaved() {
        let img = RgbImage::from_pixel(8, 8, Rgb([255, 0, 51]));
        let t = normalize(&img, Region::new(0, 0, 8, 8), TensorShape::new(64, 64, 3)).unwrap();
        assert_eq!(&t.values()[..3], &[1.0, 0.0, 0.2]);
    }

    #[test]
    fn degenerate_regions_are_rejected() {
        let img = gradient(20, 20);
        let shape = TensorShape::new(28, 28, 1);
        assert!(matches!(
            normalize(&img, Region::new(3, 3, 0, 5), shape),
            Err(RecognitionError::EmptyCrop { .. })
        ));
        assert!(matches!(
            normalize(&img, Region::new(15, 15, 10, 2), shape),
            Err(RecognitionError::RegionOutOfBounds { .. })
        ));
        assert!(matches!(
            normalize(&img, Region::new(0, 0, 5, 5), TensorShape::new(28, 28, 2)),
            Err(RecognitionError::UnsupportedChannels { channels: 2 })
        ));
    }
}
