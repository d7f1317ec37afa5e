//! The request pipeline: structural checks, content filters, signature.
//!
//! Every stage can short-circuit. The order is fixed: cheap checks come
//! first, so a delivery nobody is interested in gets a quiet `200` without
//! ever reaching the HMAC comparison. Nothing is acted on before the
//! signature has been verified.

use std::sync::Arc;

use actix_web::http::{HeaderMap, Method};

use crate::{
    filters::{self, Filter},
    github::PushEvent,
    policy::{Policy, PolicyError, PolicyOptions},
    signature::{self, Algorithm},
};

pub const USER_AGENT_PREFIX: &str = "GitHub-Hookshot/";
pub const EVENT_HEADER: &str = "X-GitHub-Event";
pub const DELIVERY_HEADER: &str = "X-GitHub-Delivery";

#[derive(Debug, thiserror::Error)]
pub enum Rejection {
    #[error("invalid request method")]
    InvalidMethod,
    #[error("missing user agent header")]
    MissingUserAgent,
    #[error("invalid user agent")]
    InvalidUserAgent,
    #[error("missing request signature")]
    MissingSignature,
    #[error("missing event")]
    MissingEvent,
    #[error("missing body")]
    MissingBody,
    #[error("invalid body: {0}")]
    InvalidBody(#[from] serde_json::Error),
    #[error("{0} filtered out")]
    Ignored(Filter),
    #[error("invalid signature")]
    InvalidSignature(#[from] signature::Error),
    #[error("failed reading request data: {0}")]
    Payload(#[from] actix_web::Error),
    #[error("no gatekeeper is registered for this route")]
    NoGatekeeper,
}

/// Headers of a structurally valid delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub event: String,
    pub signature: String,
    pub signature_256: Option<String>,
    pub id: Option<String>,
}

/// A delivery that went through every stage.
#[derive(Debug, Clone)]
pub struct Accepted {
    pub delivery: Delivery,
    pub payload: PushEvent,
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}

/// Method and header checks, in order, stopping at the first failure.
pub fn check_headers(method: &Method, headers: &HeaderMap) -> Result<Delivery, Rejection> {
    if !method.as_str().eq_ignore_ascii_case("POST") {
        return Err(Rejection::InvalidMethod);
    }

    let user_agent = headers
        .get("User-Agent")
        .filter(|value| !value.is_empty())
        .ok_or(Rejection::MissingUserAgent)?
        .to_str()
        .map_err(|_| Rejection::InvalidUserAgent)?;
    if !user_agent.starts_with(USER_AGENT_PREFIX) {
        return Err(Rejection::InvalidUserAgent);
    }

    let signature =
        header(headers, Algorithm::Sha1.header()).ok_or(Rejection::MissingSignature)?;
    let event = header(headers, EVENT_HEADER).ok_or(Rejection::MissingEvent)?;

    Ok(Delivery {
        event: event.to_string(),
        signature: signature.to_string(),
        signature_256: header(headers, Algorithm::Sha256.header()).map(String::from),
        id: header(headers, DELIVERY_HEADER).map(String::from),
    })
}

pub fn check_body(body: &[u8]) -> Result<PushEvent, Rejection> {
    if body.is_empty() {
        return Err(Rejection::MissingBody);
    }
    Ok(serde_json::from_slice(body)?)
}

/// Every structural check: method, headers, then body.
pub fn check_request(
    method: &Method,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<(Delivery, PushEvent), Rejection> {
    let delivery = check_headers(method, headers)?;
    let payload = check_body(body)?;
    Ok((delivery, payload))
}

/// Passes trivially when the policy has no secret.
///
/// **Insecure mode**: without a secret anyone who can reach the endpoint can
/// forge deliveries.
pub fn verify_signature(
    policy: &Policy,
    delivery: &Delivery,
    body: &[u8],
) -> Result<(), signature::Error> {
    let secret = match policy.secret() {
        Some(secret) => secret.unsecure(),
        None => return Ok(()),
    };

    signature::verify(Algorithm::Sha1, secret, body, Some(&delivery.signature))?;
    if let Some(signature_256) = &delivery.signature_256 {
        signature::verify(Algorithm::Sha256, secret, body, Some(signature_256))?;
    }
    Ok(())
}

/// Cheap to clone; every clone shares the same policy.
#[derive(Debug, Clone, Default)]
pub struct Gatekeeper {
    policy: Arc<Policy>,
}

impl Gatekeeper {
    pub fn new(policy: Policy) -> Self {
        Self {
            policy: Arc::new(policy),
        }
    }

    pub fn from_options(options: PolicyOptions) -> Result<Self, PolicyError> {
        Policy::from_options(options).map(Self::new)
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Runs the whole pipeline over one request.
    pub fn inspect(
        &self,
        method: &Method,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<Accepted, Rejection> {
        let delivery = check_headers(method, headers)?;
        self.inspect_delivery(delivery, body)
    }

    /// The rest of the pipeline once the headers have been checked.
    pub fn inspect_delivery(
        &self,
        delivery: Delivery,
        body: &[u8],
    ) -> Result<Accepted, Rejection> {
        let payload = check_body(body)?;

        if let Err(filter) = filters::apply(&self.policy, &delivery.event, &payload) {
            tracing::debug!(
                event = delivery.event.as_str(),
                delivery = delivery.id.as_deref().unwrap_or("-"),
                "Ignoring delivery, dropped by {} filter",
                filter,
            );
            return Err(Rejection::Ignored(filter));
        }

        if let Err(err) = verify_signature(&self.policy, &delivery, body) {
            tracing::warn!(
                event = delivery.event.as_str(),
                delivery = delivery.id.as_deref().unwrap_or("-"),
                "Received webhook request with invalid signature: {}",
                err,
            );
            return Err(err.into());
        }

        Ok(Accepted { delivery, payload })
    }
}
