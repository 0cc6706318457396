use std::fmt;

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box around one candidate glyph.
///
/// A region never owns pixels; it only describes where to crop the image it
/// was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Region { x, y, width, height }
    }

    /// Smallest region covering every point, or `None` for no points.
    pub fn bounding<I>(points: I) -> Option<Region>
    where
        I: IntoIterator<Item = (u32, u32)>,
    {
        let mut iter = points.into_iter();
        let (x0, y0) = iter.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (x0, y0, x0, y0);
        for (x, y) in iter {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        Some(Region::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether the region lies fully inside a `width` x `height` image.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        matches!(self.x.checked_add(self.width), Some(r) if r <= width)
            && matches!(self.y.checked_add(self.height), Some(b) if b <= height)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}x{})", self.x, self.y, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_box_is_inclusive() {
        let r = Region::bounding([(3, 4), (5, 9), (4, 4)]).unwrap();
        assert_eq!(r, Region::new(3, 4, 3, 6));
        assert!(Region::bounding(std::iter::empty()).is_none());
    }

    #[test]
    fn single_point_is_one_pixel() {
        assert_eq!(Region::bounding([(7, 7)]).unwrap(), Region::new(7, 7, 1, 1));
    }

    #[test]
    fn fits_within_handles_overflow() {
        assert!(Region::new(0, 0, 10, 10).fits_within(10, 10));
        assert!(!Region::new(1, 0, 10, 10).fits_within(10, 10));
        assert!(!Region::new(u32::MAX, 0, 2, 1).fits_within(10, 10));
    }
}
