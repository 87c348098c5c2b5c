//! Pixel sizes the image model produces for each aspect ratio and resolution.

use illustrator_core::model::{AspectRatio, Resolution};

/// `(width, height)` in pixels.
pub fn image_dimensions(aspect_ratio: AspectRatio, resolution: Resolution) -> (u32, u32) {
    match (aspect_ratio, resolution) {
        (AspectRatio::Wide, Resolution::TwoK) => (2560, 1440),
        (AspectRatio::Wide, Resolution::FourK) => (3840, 2160),
        (AspectRatio::Portrait, Resolution::TwoK) => (1920, 2560),
        (AspectRatio::Portrait, Resolution::FourK) => (2880, 3840),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_table() {
        assert_eq!(image_dimensions(AspectRatio::Wide, Resolution::TwoK), (2560, 1440));
        assert_eq!(image_dimensions(AspectRatio::Wide, Resolution::FourK), (3840, 2160));
        assert_eq!(image_dimensions(AspectRatio::Portrait, Resolution::TwoK), (1920, 2560));
        assert_eq!(image_dimensions(AspectRatio::Portrait, Resolution::FourK), (2880, 3840));
    }
}
