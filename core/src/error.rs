//! Error types for the Graph API client.
//!
//! # Design
//! `NotAuthorized` is kept apart from other API failures because callers
//! react to it differently (re-authenticate rather than report). It covers a
//! missing token, an HTTP 401, and the Graph "invalid OAuth access token"
//! error (code 190) which arrives on other 4xx statuses. 404 maps to
//! `ResourceNotFound`; every other non-2xx lands in `Api` with the parsed
//! Graph error payload when the body carried one.

use serde::Deserialize;
use thiserror::Error;

use crate::http::TransportError;

/// Graph error code for an invalid, expired or revoked access token.
pub const INVALID_TOKEN_CODE: i64 = 190;

/// The `error` object of a Graph API error response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GraphErrorPayload {
    pub message: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub code: Option<i64>,
    pub error_subcode: Option<i64>,
    pub fbtrace_id: Option<String>,
}

impl GraphErrorPayload {
    /// Parse `{"error": {...}}` out of a response body, if present.
    pub fn from_body(body: &str) -> Option<Self> {
        #[derive(Deserialize)]
        struct Envelope {
            error: GraphErrorPayload,
        }
        serde_json::from_str::<Envelope>(body).ok().map(|e| e.error)
    }

    pub fn is_invalid_token(&self) -> bool {
        self.code == Some(INVALID_TOKEN_CODE)
    }
}

/// Errors returned by Graph API operations.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The access token is missing, invalid or expired.
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    /// The server returned 404.
    #[error("resource not found")]
    ResourceNotFound { body: String },

    /// The server returned a non-2xx status other than 404.
    #[error("Graph API error {status}: {}", api_message(.error, .body))]
    Api {
        status: u16,
        error: Option<GraphErrorPayload>,
        body: String,
    },

    /// The response body did not match the expected shape.
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),

    /// A request payload could not be encoded.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The base URL or a path segment cannot form a request URL.
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),

    /// The request never produced a response.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl GraphError {
    pub fn is_not_authorized(&self) -> bool {
        matches!(self, GraphError::NotAuthorized(_))
    }
}

fn api_message<'a>(error: &'a Option<GraphErrorPayload>, body: &'a str) -> &'a str {
    error
        .as_ref()
        .and_then(|e| e.message.as_deref())
        .unwrap_or(body)
}

/// Result type for Graph API operations.
pub type GraphResult<T> = Result<T, GraphError>;
