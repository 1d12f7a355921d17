//! In-process credential service.

use super::digest::{digests_match, KeyDigest};
use super::{
    helper_from_retrieve_body, CredentialService, EnrollAck, EnrollRequest, RetrieveResponse,
    ServiceError, VerifyRequest,
};
use crate::helper::SerializedHelper;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Per-endpoint request counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub enroll: usize,
    pub retrieve: usize,
    pub verify: usize,
}

#[derive(Debug, Clone)]
struct StoredCredential {
    /// Helper as JSON text, exactly as the retrieve endpoint returns it.
    helper_json: String,
    key_digest: [u8; 32],
    enrolled_at: DateTime<Utc>,
}

/// Credential service held in memory.
///
/// Mirrors the remote service: at most one enrollment per identity, the
/// helper kept as JSON text and handed back through the double-encoded
/// retrieve path, and keys kept only as identity-bound digests.
#[derive(Debug, Default)]
pub struct InMemoryCredentialService {
    records: Mutex<HashMap<String, StoredCredential>>,
    digest: KeyDigest,
    enroll_calls: AtomicUsize,
    retrieve_calls: AtomicUsize,
    verify_calls: AtomicUsize,
}

impl InMemoryCredentialService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `digest` for stored keys.
    pub fn with_digest(digest: KeyDigest) -> Self {
        Self {
            digest,
            ..Self::default()
        }
    }

    /// Requests received so far, per endpoint.
    pub fn calls(&self) -> CallCounts {
        CallCounts {
            enroll: self.enroll_calls.load(Ordering::Relaxed),
            retrieve: self.retrieve_calls.load(Ordering::Relaxed),
            verify: self.verify_calls.load(Ordering::Relaxed),
        }
    }

    /// Returns true if `identity` has an enrollment.
    pub fn is_enrolled(&self, identity: &str) -> bool {
        self.records().contains_key(identity)
    }

    /// When `identity` was enrolled.
    pub fn enrolled_at(&self, identity: &str) -> Option<DateTime<Utc>> {
        self.records().get(identity).map(|r| r.enrolled_at)
    }

    fn records(&self) -> MutexGuard<'_, HashMap<String, StoredCredential>> {
        // A panic while holding the lock cannot leave a half-written entry.
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn decode_key(identity: &str, key_hex: &str) -> Result<Vec<u8>, ServiceError> {
    if identity.is_empty() {
        return Err(ServiceError::InvalidRequest("username is required".into()));
    }
    let key = hex::decode(key_hex)
        .map_err(|e| ServiceError::InvalidRequest(format!("key must be a hex string: {e}")))?;
    if key.is_empty() {
        return Err(ServiceError::InvalidRequest("key is empty".into()));
    }
    Ok(key)
}

impl CredentialService for InMemoryCredentialService {
    fn enroll(&self, request: &EnrollRequest) -> Result<EnrollAck, ServiceError> {
        self.enroll_calls.fetch_add(1, Ordering::Relaxed);
        let key = decode_key(&request.identity, &request.key)?;
        let helper_json = serde_json::to_string(&request.helper)
            .map_err(|e| ServiceError::InvalidRequest(format!("invalid helper format: {e}")))?;

        let mut records = self.records();
        if records.contains_key(&request.identity) {
            return Err(ServiceError::AlreadyEnrolled(request.identity.clone()));
        }
        records.insert(
            request.identity.clone(),
            StoredCredential {
                helper_json,
                key_digest: self.digest.digest(&request.identity, &key),
                enrolled_at: Utc::now(),
            },
        );

        tracing::info!(identity = %request.identity, "Stored enrollment");
        Ok(EnrollAck {
            identity: request.identity.clone(),
            status: "success".to_string(),
            message: None,
        })
    }

    fn retrieve(&self, identity: &str) -> Result<SerializedHelper, ServiceError> {
        self.retrieve_calls.fetch_add(1, Ordering::Relaxed);
        let helper_json = self
            .records()
            .get(identity)
            .map(|r| r.helper_json.clone())
            .ok_or_else(|| ServiceError::IdentityNotFound(identity.to_string()))?;

        let body = serde_json::to_string(&RetrieveResponse {
            helper: helper_json,
        })
        .map_err(|e| ServiceError::InvalidResponse {
            endpoint: "retrieve",
            message: e.to_string(),
        })?;
        helper_from_retrieve_body(&body)
    }

    fn verify(&self, request: &VerifyRequest) -> Result<bool, ServiceError> {
        self.verify_calls.fetch_add(1, Ordering::Relaxed);
        let key = decode_key(&request.identity, &request.key)?;

        let records = self.records();
        let stored = records
            .get(&request.identity)
            .ok_or_else(|| ServiceError::IdentityNotFound(request.identity.clone()))?;

        let verified = digests_match(
            &stored.key_digest,
            &self.digest.digest(&request.identity, &key),
        );
        tracing::info!(identity = %request.identity, verified, "Verification decided");
        Ok(verified)
    }
}
