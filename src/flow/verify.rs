//! Verification: reproduce an identity's key from a fresh capture.

use super::{acquire_vector, check_compatibility, validate_identity, FlowError};
use crate::capture::{Camera, CaptureConfig};
use crate::config::FlowConfig;
use crate::embedding::Embedder;
use crate::encoding::BitEncoder;
use crate::extractor::FuzzyExtractor;
use crate::helper::HelperCodec;
use crate::service::{CredentialService, VerifyRequest};

/// How a verification attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// A key was reproduced and the service accepted it.
    Verified,
    /// A key was reproduced but the service rejected it.
    Rejected,
    /// The reading was too far from the enrollment to reproduce any key.
    /// The service was not asked.
    NoMatch,
}

impl VerificationOutcome {
    pub fn is_verified(self) -> bool {
        self == VerificationOutcome::Verified
    }
}

impl std::fmt::Display for VerificationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            VerificationOutcome::Verified => "verified",
            VerificationOutcome::Rejected => "rejected by credential service",
            VerificationOutcome::NoMatch => "no match: could not reproduce the key",
        })
    }
}

/// Verification orchestration.
pub struct VerificationFlow<C, E, X, S> {
    config: FlowConfig,
    capture: CaptureConfig,
    camera: C,
    embedder: E,
    extractor: X,
    service: S,
    encoder: BitEncoder,
    codec: HelperCodec,
}

impl<C, E, X, S> VerificationFlow<C, E, X, S>
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

    /// Verifies `identity` against one fresh capture.
    ///
    /// The helper is fetched and decoded before the camera is touched, so
    /// an unknown identity or a corrupt record costs no capture.
    pub fn verify(&mut self, identity: &str) -> Result<VerificationOutcome, FlowError> {
        validate_identity(identity)?;
        tracing::info!(identity, "Starting verification");

        let serialized = self.service.retrieve(identity)?;
        let helper = self.codec.deserialize(&serialized)?;

        let vector = acquire_vector(&mut self.camera, &mut self.embedder, &self.capture)?;
        let bitstring = self.encoder.encode(&vector);
        drop(vector);

        let Some(key) = self.extractor.reproduce(&bitstring, &helper)? else {
            tracing::info!(identity, "No key reproduced; verify endpoint not contacted");
            return Ok(VerificationOutcome::NoMatch);
        };

        let request = VerifyRequest {
            identity: identity.to_string(),
            key: key.to_hex(),
        };
        drop(key);

        let outcome = if self.service.verify(&request)? {
            VerificationOutcome::Verified
        } else {
            VerificationOutcome::Rejected
        };
        tracing::info!(identity, %outcome, "Verification finished");
        Ok(outcome)
    }
}
