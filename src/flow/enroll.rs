//! Enrollment: derive a key and helper for an identity and register them.

use super::{acquire_vector, check_compatibility, validate_identity, FlowError};
use crate::capture::{Camera, CaptureConfig};
use crate::config::FlowConfig;
use crate::embedding::Embedder;
use crate::encoding::BitEncoder;
use crate::extractor::FuzzyExtractor;
use crate::helper::HelperCodec;
use crate::service::{CredentialService, EnrollAck, EnrollRequest};

/// Result of a completed enrollment.
#[derive(Debug, Clone)]
pub struct EnrollmentOutcome {
    pub identity: String,
    /// The service's acknowledgment, relayed unchanged.
    pub ack: EnrollAck,
}

/// Enrollment orchestration.
pub struct EnrollmentFlow<C, E, X, S> {
    config: FlowConfig,
    capture: CaptureConfig,
    camera: C,
    embedder: E,
    extractor: X,
    service: S,
    encoder: BitEncoder,
    codec: HelperCodec,
}

impl<C, E, X, S> EnrollmentFlow<C, E, X, S>
where
    C: Camera,
    E: Embedder,
    X: FuzzyExtractor,
    S: CredentialService,
{
    /// Builds the flow, checking the collaborators agree with `config`.
    pub fn new(
        config: FlowConfig,
        camera: C,
        embedder: E,
        extractor: X,
        service: S,
    ) -> Result<Self, FlowError> {
        check_compatibility(&config, &embedder, &extractor)?;
        Ok(Self {
            config,
            capture: CaptureConfig::default(),
            camera,
            embedder,
            extractor,
            service,
            encoder: BitEncoder::new(),
            codec: HelperCodec::new(),
        })
    }

    /// Overrides the capture settings.
    pub fn with_capture_config(mut self, capture: CaptureConfig) -> Self {
        self.capture = capture;
        self
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    /// Enrolls `identity` from one fresh capture.
    ///
    /// Nothing is sent unless capture, embedding and key generation all
    /// succeed. Service failures are returned as-is; no key material is
    /// kept on any path.
    pub fn enroll(&mut self, identity: &str) -> Result<EnrollmentOutcome, FlowError> {
        validate_identity(identity)?;
        tracing::info!(identity, model = %self.config.embedding_model_id, "Starting enrollment");

        let vector = acquire_vector(&mut self.camera, &mut self.embedder, &self.capture)?;
        let bitstring = self.encoder.encode(&vector);
        drop(vector);

        let (key, helper) = self.extractor.generate(&bitstring)?;
        let request = EnrollRequest {
            identity: identity.to_string(),
            key: key.to_hex(),
            helper: self.codec.serialize(&helper),
        };
        drop(key);

        let ack = self.service.enroll(&request)?;
        tracing::info!(identity, status = %ack.status, "Enrollment accepted");

        Ok(EnrollmentOutcome {
            identity: request.identity,
            ack,
        })
    }
}
