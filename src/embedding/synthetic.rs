//! Deterministic stand-in for a face embedding model.

use super::{Embedder, FeatureVector};
use crate::capture::Frame;

/// Frames flatter than this are treated as "no face".
const MIN_INTENSITY_VARIANCE: f64 = 1.0;

/// Block-mean embedder.
///
/// Splits the frame into `dimension` equal runs of pixels and emits each
/// run's mean intensity relative to the frame mean. Identical frames give
/// identical vectors and small pixel noise gives small vector changes,
/// which is all the protocol needs from a model. It recognizes nobody.
#[derive(Debug, Clone)]
pub struct SyntheticEmbedder {
    model_id: String,
    dimension: usize,
}

impl SyntheticEmbedder {
    /// Model id reported when no stand-in id is given.
    pub const MODEL_ID: &'static str = "synthetic-block-mean";

    pub fn new(dimension: usize) -> Self {
        Self::standing_in_for(Self::MODEL_ID, dimension)
    }

    /// Creates an embedder that reports `model_id`, for exercising
    /// configurations written for a real model.
    pub fn standing_in_for(model_id: impl Into<String>, dimension: usize) -> Self {
        Self {
            model_id: model_id.into(),
            dimension: dimension.max(1),
        }
    }
}

impl Embedder for SyntheticEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&mut self, frame: &Frame) -> Option<FeatureVector> {
        if !frame.is_valid() || frame.pixel_count() < self.dimension {
            tracing::warn!(?frame, "Frame unusable for embedding");
            return None;
        }
        if frame.intensity_variance() < MIN_INTENSITY_VARIANCE {
            tracing::warn!(sequence = frame.sequence(), "No face detected in frame");
            return None;
        }

        let mean = frame.mean_intensity();
        let run = frame.pixel_count() / self.dimension;
        let components = frame
            .pixels()
            .chunks_exact(run)
            .take(self.dimension)
            .map(|chunk| {
                let block = chunk.iter().map(|&p| f64::from(p)).sum::<f64>() / run as f64;
                (block - mean) as f32
            })
            .collect();

        Some(FeatureVector::new(components))
    }
}
