//! Enrollment and verification flows.
//!
//! Each flow is a straight line through the components:
//!
//! ```text
//! enroll:  capture → embed → encode → generate → serialize → service.enroll
//! verify:  service.retrieve → deserialize → capture → embed → encode
//!          → reproduce → service.verify
//! ```
//!
//! Flows hold their configuration and collaborators but no state between
//! calls. Collaborators may be passed by reference (`&mut camera`,
//! `&service`) so callers keep ownership.

mod enroll;
mod verify;

pub use enroll::{EnrollmentFlow, EnrollmentOutcome};
pub use verify::{VerificationFlow, VerificationOutcome};

use crate::capture::{capture_once, Camera, CameraError, CaptureConfig};
use crate::config::{ConfigError, FlowConfig};
use crate::embedding::{Embedder, FeatureVector};
use crate::extractor::{ExtractorError, FuzzyExtractor};
use crate::helper::CodecError;
use crate::service::ServiceError;
use thiserror::Error;

/// Everything that can stop a flow.
///
/// A failed match is not here: it is [`VerificationOutcome::NoMatch`].
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("could not capture an image: {0}")]
    CaptureUnavailable(#[from] CameraError),

    #[error("no face detected; please try again")]
    NoFaceDetected,

    #[error("embedding model '{actual}' does not match configured model '{configured}'")]
    ModelMismatch { configured: String, actual: String },

    #[error("unknown identity '{0}'")]
    IdentityNotFound(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Extractor(#[from] ExtractorError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("credential service error: {0}")]
    Service(ServiceError),
}

impl From<ServiceError> for FlowError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::IdentityNotFound(identity) => FlowError::IdentityNotFound(identity),
            other => FlowError::Service(other),
        }
    }
}

impl FlowError {
    /// True for failures the user can fix by simply trying again
    /// (camera hiccup, face not in view).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, FlowError::CaptureUnavailable(_) | FlowError::NoFaceDetected)
    }

    /// True when helper data failed integrity checks.
    pub fn is_corrupt_helper(&self) -> bool {
        matches!(
            self,
            FlowError::Codec(_)
                | FlowError::Extractor(ExtractorError::CorruptHelper(_))
                | FlowError::Service(ServiceError::Codec(_))
        )
    }
}

fn validate_identity(identity: &str) -> Result<(), FlowError> {
    if identity.trim().is_empty() {
        return Err(FlowError::InvalidIdentity("identity must not be empty".into()));
    }
    Ok(())
}

/// Checks that configuration, embedder and extractor agree.
fn check_compatibility<E, X>(config: &FlowConfig, embedder: &E, extractor: &X) -> Result<(), FlowError>
where
    E: Embedder,
    X: FuzzyExtractor,
{
    config.validate()?;

    if embedder.model_id() != config.embedding_model_id {
        return Err(FlowError::ModelMismatch {
            configured: config.embedding_model_id.clone(),
            actual: embedder.model_id().to_string(),
        });
    }

    let encoded_bits = embedder.dimension().div_ceil(8) * 8;
    if encoded_bits != config.bitstring_length {
        return Err(ConfigError::Invalid(format!(
            "embedder dimension {} encodes to {encoded_bits} bits, configured bitstring_length is {}",
            embedder.dimension(),
            config.bitstring_length
        ))
        .into());
    }

    if extractor.input_len() != config.bitstring_bytes() {
        return Err(ConfigError::Invalid(format!(
            "extractor accepts {}-byte bitstrings, configured length is {} bytes",
            extractor.input_len(),
            config.bitstring_bytes()
        ))
        .into());
    }

    if extractor.tolerance_bits() != config.extractor_tolerance_bits {
        return Err(ConfigError::Invalid(format!(
            "extractor tolerates {} bits, configured tolerance is {}",
            extractor.tolerance_bits(),
            config.extractor_tolerance_bits
        ))
        .into());
    }

    Ok(())
}

/// One capture and one embedding; the camera is released before returning.
fn acquire_vector<C, E>(
    camera: &mut C,
    embedder: &mut E,
    capture: &CaptureConfig,
) -> Result<FeatureVector, FlowError>
where
    C: Camera,
    E: Embedder,
{
    let frame = capture_once(camera, capture).map_err(|e| {
        tracing::warn!(error = %e, "Capture failed");
        FlowError::CaptureUnavailable(e)
    })?;

    embedder.embed(&frame).ok_or_else(|| {
        tracing::warn!(sequence = frame.sequence(), "Embedding returned no face");
        FlowError::NoFaceDetected
    })
}
