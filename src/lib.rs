//! Facekey
//!
//! Derives a stable secret key from a noisy face embedding with a fuzzy
//! extractor, and enrolls or verifies that key against a remote credential
//! service. Only the key and public helper data ever leave the client; the
//! image and the embedding are dropped as soon as they have been used.
//!
//! # Architecture
//!
//! ```text
//! capture → embedding → encoding → extractor → helper codec → service
//!                                      ↑
//!                                    flow (enroll / verify)
//! ```
//!
//! # Design Principles
//!
//! - **Tolerant matching**: readings within `t` bits of the enrollment
//!   reproduce the same key; anything further yields no key at all
//! - **Public helper only**: the helper reveals nothing useful without a
//!   close reading
//! - **Swappable parts**: camera, embedder, extractor and service are traits
//! - **Uses standard primitives**: BLAKE3 for locker pads, OS randomness for
//!   keys and nonces
//!
//! # Example
//!
//! ```no_run
//! use facekey::{
//!     capture::MockCamera,
//!     config::FlowConfig,
//!     embedding::SyntheticEmbedder,
//!     extractor::{ExtractorParams, SampleLockExtractor},
//!     flow::{EnrollmentFlow, VerificationFlow},
//!     service::InMemoryCredentialService,
//! };
//!
//! let config = FlowConfig::default();
//! let service = InMemoryCredentialService::new();
//! let extractor = SampleLockExtractor::new(ExtractorParams::new(
//!     config.bitstring_bytes(),
//!     config.extractor_tolerance_bits,
//! ))
//! .unwrap();
//! let mut camera = MockCamera::new();
//! let mut embedder =
//!     SyntheticEmbedder::standing_in_for(&config.embedding_model_id, config.bitstring_length);
//!
//! let mut enroll = EnrollmentFlow::new(
//!     config.clone(),
//!     &mut camera,
//!     &mut embedder,
//!     &extractor,
//!     &service,
//! )
//! .unwrap();
//! enroll.enroll("alice").unwrap();
//! drop(enroll);
//!
//! let mut verify =
//!     VerificationFlow::new(config, &mut camera, &mut embedder, &extractor, &service).unwrap();
//! assert!(verify.verify("alice").unwrap().is_verified());
//! ```

#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod capture;
pub mod config;
pub mod embedding;
pub mod encoding;
pub mod extractor;
pub mod flow;
pub mod helper;
pub mod service;

// Re-export commonly used types at crate root
pub use capture::{Camera, CaptureConfig, Frame, MockCamera};
pub use config::{FileConfig, FlowConfig};
pub use embedding::{Embedder, FeatureVector, SyntheticEmbedder};
pub use encoding::{BitEncoder, Bitstring};
pub use extractor::{ExtractorParams, FuzzyExtractor, Key, SampleLockExtractor};
pub use flow::{EnrollmentFlow, FlowError, VerificationFlow, VerificationOutcome};
pub use helper::{Helper, HelperCodec, SerializedHelper};
pub use service::{CredentialService, HttpCredentialService, InMemoryCredentialService};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
