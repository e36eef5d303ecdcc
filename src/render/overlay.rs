//! Alpha compositing of filled circles onto RGB frames.

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;

/// A pre-rasterised filled circle that can be blended onto frames.
///
/// The circle is drawn once into a small coverage mask; compositing then
/// touches every covered pixel exactly once, which keeps translucent points
/// from darkening where rasterised spans overlap.
#[derive(Debug, Clone)]
pub struct CircleStamp {
    radius: i32,
    mask: GrayImage,
}

impl CircleStamp {
    pub fn new(radius: u32) -> Self {
        let radius = radius as i32;
        let size = (2 * radius + 1) as u32;
        let mut mask = GrayImage::new(size, size);
        draw_filled_circle_mut(&mut mask, (radius, radius), radius, Luma([u8::MAX]));
        Self { radius, mask }
    }

    /// Blend the circle centered at `center` onto `frame`.
    ///
    /// Every covered channel becomes `alpha * color + (1 - alpha) * pixel`,
    /// rounded to the nearest integer. Parts of the circle outside the frame
    /// are skipped.
    pub fn composite(&self, frame: &mut RgbImage, center: (i32, i32), color: Rgb<u8>, alpha: f32) {
        let (width, height) = frame.dimensions();
        let alpha = alpha.clamp(0.0, 1.0);

        for (mx, my, coverage) in self.mask.enumerate_pixels() {
            if coverage[0] == 0 {
                continue;
            }
            let x = center.0 - self.radius + mx as i32;
            let y = center.1 - self.radius + my as i32;
            if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 {
                continue;
            }

            let pixel = frame.get_pixel_mut(x as u32, y as u32);
            for (channel, fg) in pixel.0.iter_mut().zip(color.0) {
                *channel = blend_channel(fg, *channel, alpha);
            }
        }
    }
}

#[inline]
fn blend_channel(fg: u8, bg: u8, alpha: f32) -> u8 {
    (alpha * fg as f32 + (1.0 - alpha) * bg as f32)
        .round()
        .clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORANGE: Rgb<u8> = Rgb([255, 165, 0]);

    #[test]
    fn test_opaque_circle_replaces_center() {
        let mut frame = RgbImage::new(20, 20);
        CircleStamp::new(4).composite(&mut frame, (10, 10), ORANGE, 1.0);

        assert_eq!(*frame.get_pixel(10, 10), ORANGE);
        assert_eq!(*frame.get_pixel(14, 10), ORANGE);
        assert_eq!(*frame.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(*frame.get_pixel(16, 10), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_half_alpha_blends() {
        let mut frame = RgbImage::from_pixel(9, 9, Rgb([100, 100, 100]));
        CircleStamp::new(4).composite(&mut frame, (4, 4), ORANGE, 0.5);

        // 0.5 * 255 + 0.5 * 100 = 177.5, 0.5 * 165 + 50 = 132.5, 0 + 50 = 50
        assert_eq!(*frame.get_pixel(4, 4), Rgb([178, 133, 50]));
    }

    #[test]
    fn test_partially_outside_frame() {
        let mut frame = RgbImage::new(6, 6);
        CircleStamp::new(4).composite(&mut frame, (0, 0), ORANGE, 1.0);
        assert_eq!(*frame.get_pixel(0, 0), ORANGE);

        // Entirely outside is a no-op rather than a panic.
        let mut frame = RgbImage::new(6, 6);
        CircleStamp::new(4).composite(&mut frame, (-50, 100), ORANGE, 1.0);
        assert!(frame.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn test_zero_alpha_is_noop() {
        let mut frame = RgbImage::from_pixel(9, 9, Rgb([7, 8, 9]));
        CircleStamp::new(4).composite(&mut frame, (4, 4), ORANGE, 0.0);
        assert!(frame.pixels().all(|p| *p == Rgb([7, 8, 9])));
    }
}
