//! Credential service interface.
//!
//! The service owns identities and their enrollment records. The core only
//! submits enrollments, fetches helpers back, and asks for verification
//! decisions. Two implementations ship: [`HttpCredentialService`] for a
//! remote service, and [`InMemoryCredentialService`] with the same
//! semantics for tests and offline runs.
//!
//! # Wire format
//!
//! ```text
//! POST /enroll    {"username": "...", "key": "<hex>", "helper": [<records>]}
//! GET  /retrieve?username=...   -> {"helper": "<records as a JSON string>"}
//! POST /verify    {"username": "...", "key": "<hex>"}
//! ```
//!
//! The retrieve response carries the helper double encoded. Both
//! implementations unwrap that before returning, so callers only ever see
//! a [`SerializedHelper`].

mod digest;
mod http;
mod memory;

pub use digest::KeyDigest;
pub use http::HttpCredentialService;
pub use memory::{CallCounts, InMemoryCredentialService};

use crate::helper::{CodecError, HelperCodec, SerializedHelper};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use thiserror::Error;

/// Errors reported by a credential service or the transport to it.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("no enrollment found for identity '{0}'")]
    IdentityNotFound(String),

    #[error("identity '{0}' is already enrolled")]
    AlreadyEnrolled(String),

    #[error("request rejected: {0}")]
    InvalidRequest(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    #[error("unexpected response from {endpoint}: {message}")]
    InvalidResponse {
        endpoint: &'static str,
        message: String,
    },

    #[error("stored helper is unreadable: {0}")]
    Codec(#[from] CodecError),
}

/// Enrollment submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollRequest {
    #[serde(rename = "username")]
    pub identity: String,
    /// Lowercase hex key.
    pub key: String,
    pub helper: SerializedHelper,
}

/// Enrollment acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollAck {
    #[serde(rename = "username")]
    pub identity: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Retrieve response as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrieveResponse {
    /// JSON text of the record array.
    pub helper: String,
}

/// Retrieve response borrowing the still-quoted helper text.
#[derive(Deserialize)]
struct RetrieveBody<'a> {
    #[serde(borrow)]
    helper: &'a RawValue,
}

/// Unwraps the helper records from a retrieve response body.
///
/// The `helper` field must be a JSON string holding the record array;
/// other fields are ignored.
pub(crate) fn helper_from_retrieve_body(body: &str) -> Result<SerializedHelper, ServiceError> {
    let parsed: RetrieveBody<'_> =
        serde_json::from_str(body).map_err(|e| ServiceError::InvalidResponse {
            endpoint: "retrieve",
            message: e.to_string(),
        })?;
    Ok(HelperCodec::new().records_from_json_string(parsed.helper.get())?)
}

/// Verification request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyRequest {
    #[serde(rename = "username")]
    pub identity: String,
    /// Lowercase hex key.
    pub key: String,
}

/// A credential-holding service.
pub trait CredentialService {
    /// Stores an enrollment record.
    fn enroll(&self, request: &EnrollRequest) -> Result<EnrollAck, ServiceError>;

    /// Fetches the helper enrolled for `identity`.
    ///
    /// Fails with [`ServiceError::IdentityNotFound`] when there is none.
    fn retrieve(&self, identity: &str) -> Result<SerializedHelper, ServiceError>;

    /// Asks the service whether `key` matches the enrolled one.
    fn verify(&self, request: &VerifyRequest) -> Result<bool, ServiceError>;
}

impl<S: CredentialService + ?Sized> CredentialService for &S {
    fn enroll(&self, request: &EnrollRequest) -> Result<EnrollAck, ServiceError> {
        (**self).enroll(request)
    }

    fn retrieve(&self, identity: &str) -> Result<SerializedHelper, ServiceError> {
        (**self).retrieve(identity)
    }

    fn verify(&self, request: &VerifyRequest) -> Result<bool, ServiceError> {
        (**self).verify(request)
    }
}
