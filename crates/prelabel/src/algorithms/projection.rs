use crate::types::{ImageDimensions, PercentBox, PixelBox};

/// Express a pixel box in percent of the image size.
///
/// Offsets come from the minimum column/row, sizes from the box extents.
pub fn project(bbox: &PixelBox, image: ImageDimensions) -> PercentBox {
    let width = image.width as f64;
    let height = image.height as f64;

    PercentBox {
        x: bbox.x_min as f64 / width * 100.0,
        y: bbox.y_min as f64 / height * 100.0,
        width: bbox.width() as f64 / width * 100.0,
        height: bbox.height() as f64 / height * 100.0,
    }
}
