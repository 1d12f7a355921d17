//! Captured image handed from the camera to the embedding model.

use chrono::{DateTime, Utc};

/// A single captured image.
///
/// Pixel contents are biometric data: the type never prints them and the
/// flows drop each frame as soon as it has been embedded.
#[derive(Clone)]
pub struct Frame {
    /// Row-major 8-bit samples, one per pixel.
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    /// Wall-clock capture time, for log correlation.
    captured_at: DateTime<Utc>,
    /// Per-session monotonic sequence number.
    sequence: u64,
}

impl Frame {
    /// Creates a new frame with the given parameters.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        Self {
            pixels,
            width,
            height,
            captured_at: Utc::now(),
            sequence,
        }
    }

    /// Returns a reference to the raw pixel data.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns the total number of pixels (width * height).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Validates that the pixel buffer size matches dimensions.
    pub fn is_valid(&self) -> bool {
        self.pixel_count() > 0 && self.pixels.len() == self.pixel_count()
    }

    /// Mean pixel intensity; zero for an empty frame.
    pub fn mean_intensity(&self) -> f64 {
        if self.pixels.is_empty() {
            return 0.0;
        }
        self.pixels.iter().map(|&p| f64::from(p)).sum::<f64>() / self.pixels.len() as f64
    }

    /// Population variance of pixel intensity.
    ///
    /// A flat frame (lens cap, blank wall) has zero variance.
    pub fn intensity_variance(&self) -> f64 {
        if self.pixels.is_empty() {
            return 0.0;
        }
        let mean = self.mean_intensity();
        self.pixels
            .iter()
            .map(|&p| (f64::from(p) - mean).powi(2))
            .sum::<f64>()
            / self.pixels.len() as f64
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sequence", &self.sequence)
            .field("captured_at", &self.captured_at)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_creation() {
        let frame = Frame::new(vec![0u8; 640 * 480], 640, 480, 1);

        assert_eq!(frame.width(), 640);
        assert_eq!(frame.height(), 480);
        assert_eq!(frame.sequence(), 1);
        assert!(frame.is_valid());
    }

    #[test]
    fn test_frame_invalid_size() {
        let frame = Frame::new(vec![0u8; 100], 640, 480, 1);
        assert!(!frame.is_valid());
    }

    #[test]
    fn test_flat_frame_has_zero_variance() {
        let frame = Frame::new(vec![42u8; 64], 8, 8, 1);
        assert_eq!(frame.mean_intensity(), 42.0);
        assert_eq!(frame.intensity_variance(), 0.0);
    }

    #[test]
    fn test_debug_hides_pixels() {
        let frame = Frame::new(vec![7u8; 4], 2, 2, 1);
        let rendered = format!("{frame:?}");
        assert!(!rendered.contains("pixels"));
    }
}
