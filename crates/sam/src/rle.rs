//! Uncompressed COCO run-length masks as emitted by SAM's
//! `output_mode="uncompressed_rle"`.

use image::{GrayImage, Luma};
use serde::Deserialize;

use crate::error::{Result, SamError};

/// `size` is `[height, width]`; `counts` alternate background/foreground runs
/// over the mask in column-major order, starting with background.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UncompressedRle {
    pub size: [u32; 2],
    pub counts: Vec<u64>,
}

impl UncompressedRle {
    pub fn height(&self) -> u32 {
        self.size[0]
    }

    pub fn width(&self) -> u32 {
        self.size[1]
    }

    /// Expand into a mask image with foreground pixels set to 255.
    pub fn decode(&self) -> Result<GrayImage> {
        let height = self.height();
        let width = self.width();
        let total = height as u64 * width as u64;

        let covered = self
            .counts
            .iter()
            .try_fold(0u64, |acc, &count| acc.checked_add(count))
            .ok_or_else(|| SamError::InvalidRle("run lengths overflow".to_string()))?;
        if covered != total {
            return Err(SamError::InvalidRle(format!(
                "runs cover {covered} pixels, mask is {width}x{height} ({total})"
            )));
        }

        let mut mask = GrayImage::new(width, height);
        let mut offset = 0u64;
        for (run, &count) in self.counts.iter().enumerate() {
            if run % 2 == 1 {
                for index in offset..offset + count {
                    let x = (index / height as u64) as u32;
                    let y = (index % height as u64) as u32;
                    mask.put_pixel(x, y, Luma([255u8]));
                }
            }
            offset += count;
        }

        Ok(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_column_major() {
        // 3 rows x 2 cols; foreground at (x=0, y=1), (x=0, y=2), (x=1, y=0)
        let rle = UncompressedRle { size: [3, 2], counts: vec![1, 3, 2] };
        let mask = rle.decode().unwrap();

        assert_eq!(mask.dimensions(), (2, 3));
        assert_eq!(mask.get_pixel(0, 0)[0], 0);
        assert_eq!(mask.get_pixel(0, 1)[0], 255);
        assert_eq!(mask.get_pixel(0, 2)[0], 255);
        assert_eq!(mask.get_pixel(1, 0)[0], 255);
        assert_eq!(mask.get_pixel(1, 1)[0], 0);
        assert_eq!(mask.get_pixel(1, 2)[0], 0);
    }

    #[test]
    fn test_leading_foreground_uses_zero_run() {
        let rle = UncompressedRle { size: [2, 2], counts: vec![0, 4] };
        let mask = rle.decode().unwrap();
        assert!(mask.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_overflowing_runs_are_invalid() {
        let rle = UncompressedRle { size: [2, 2], counts: vec![u64::MAX, 4] };
        assert!(matches!(rle.decode(), Err(SamError::InvalidRle(_))));
    }

    #[test]
    fn test_run_total_must_match_size() {
        let rle = UncompressedRle { size: [4, 4], counts: vec![3, 2] };
        assert!(matches!(rle.decode(), Err(SamError::InvalidRle(_))));
    }
}
