//! Blocking HTTP client for a remote credential service.

use super::{
    helper_from_retrieve_body, CredentialService, EnrollAck, EnrollRequest, ServiceError,
    VerifyRequest,
};
use crate::config::ServiceConfig;
use crate::helper::SerializedHelper;
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    status: String,
}

/// Credential service reached over HTTP.
///
/// Non-success statuses are surfaced as [`ServiceError::Status`] except
/// where the protocol gives them meaning: 404 from `/retrieve` is an
/// unknown identity and 401 from `/verify` is a negative decision.
#[derive(Debug, Clone)]
pub struct HttpCredentialService {
    client: Client,
    base_url: String,
}

impl HttpCredentialService {
    /// Builds a client for the configured endpoint.
    pub fn new(config: &ServiceConfig) -> Result<Self, ServiceError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.base_url)
    }
}

fn parse_json<T: DeserializeOwned>(
    endpoint: &'static str,
    response: Response,
) -> Result<T, ServiceError> {
    response
        .json::<T>()
        .map_err(|e| ServiceError::InvalidResponse {
            endpoint,
            message: e.to_string(),
        })
}

fn status_error(endpoint: &'static str, response: Response) -> ServiceError {
    let status = response.status().as_u16();
    let body = response.text().unwrap_or_default();
    ServiceError::Status {
        endpoint,
        status,
        body: body.trim().to_string(),
    }
}

impl CredentialService for HttpCredentialService {
    fn enroll(&self, request: &EnrollRequest) -> Result<EnrollAck, ServiceError> {
        tracing::debug!(identity = %request.identity, "Submitting enrollment");
        let response = self.client.post(self.url("enroll")).json(request).send()?;

        if !response.status().is_success() {
            return Err(status_error("enroll", response));
        }
        parse_json("enroll", response)
    }

    fn retrieve(&self, identity: &str) -> Result<SerializedHelper, ServiceError> {
        tracing::debug!(identity, "Retrieving helper");
        let response = self
            .client
            .get(self.url("retrieve"))
            .query(&[("username", identity)])
            .send()?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(ServiceError::IdentityNotFound(identity.to_string())),
            status if status.is_success() => helper_from_retrieve_body(&response.text()?),
            _ => Err(status_error("retrieve", response)),
        }
    }

    fn verify(&self, request: &VerifyRequest) -> Result<bool, ServiceError> {
        tracing::debug!(identity = %request.identity, "Requesting verification");
        let response = self.client.post(self.url("verify")).json(request).send()?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Ok(false),
            status if status.is_success() => {
                let body: VerifyResponse = parse_json("verify", response)?;
                Ok(body.status == "verified")
            }
            _ => Err(status_error("verify", response)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let config = ServiceConfig {
            base_url: "http://localhost:8080/".into(),
            ..Default::default()
        };
        let service = HttpCredentialService::new(&config).unwrap();
        assert_eq!(service.url("verify"), "http://localhost:8080/verify");
    }
}
