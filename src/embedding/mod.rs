//! Face embedding interface.
//!
//! Turning a face image into a feature vector is the job of an external
//! model. The flows only need the [`Embedder`] contract; the
//! [`SyntheticEmbedder`] stands in for a real model in tests and in the
//! demo binary.

mod synthetic;

pub use synthetic::SyntheticEmbedder;

use crate::capture::Frame;

/// A real-valued face embedding.
///
/// Transient: produced per capture, encoded, then dropped.
#[derive(Clone, PartialEq)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    pub fn new(components: Vec<f32>) -> Self {
        Self(components)
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<f32>> for FeatureVector {
    fn from(components: Vec<f32>) -> Self {
        Self(components)
    }
}

impl std::fmt::Debug for FeatureVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureVector")
            .field("len", &self.0.len())
            .finish_non_exhaustive()
    }
}

/// An embedding model.
pub trait Embedder {
    /// Identifier of the model; enrollment and verification must agree on it.
    fn model_id(&self) -> &str;

    /// Length of the vectors this model produces.
    fn dimension(&self) -> usize;

    /// Embeds the face in `frame`.
    ///
    /// Returns `None` when no face is detected. Callers must not retry
    /// automatically.
    fn embed(&mut self, frame: &Frame) -> Option<FeatureVector>;
}

impl<E: Embedder + ?Sized> Embedder for &mut E {
    fn model_id(&self) -> &str {
        (**self).model_id()
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn embed(&mut self, frame: &Frame) -> Option<FeatureVector> {
        (**self).embed(frame)
    }
}
