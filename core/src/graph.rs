//! Generic Graph API request building, response parsing, and execution.
//!
//! # Design
//! `GraphRequests` is the stateless half: it turns a path and parameter list
//! into an authorized `HttpRequest` and turns an `HttpResponse` into a typed
//! value or a `GraphError`. `GraphClient` pairs it with a [`Transport`] and
//! is what resource clients such as [`PlacesClient`] run on.

use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::{form_urlencoded, Url};

use crate::config::GraphConfig;
use crate::error::{GraphError, GraphErrorPayload, GraphResult};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::json::list_from_value;
use crate::places::PlacesClient;
use crate::types::CreatedObject;

/// Ordered request parameters. Order is preserved on the wire.
pub type Params<'a> = [(&'a str, String)];

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Builds authorized requests and parses responses without doing any I/O.
#[derive(Debug, Clone)]
pub struct GraphRequests {
    config: GraphConfig,
}

impl GraphRequests {
    pub fn new(config: GraphConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// GET `/{segments...}` with `params` as the query string.
    ///
    /// Each segment is percent-encoded on its own, so an id can never add
    /// path components or query parameters.
    pub fn get(&self, segments: &[&str], params: &Params<'_>) -> GraphResult<HttpRequest> {
        let authorization = self.authorization()?;
        let mut url = self.url(segments)?;
        if !params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(params.iter().map(|(name, value)| (*name, value.as_str())));
        }
        Ok(HttpRequest {
            method: HttpMethod::Get,
            url: url.into(),
            headers: vec![authorization],
            body: None,
        })
    }

    /// POST `/{segments...}` with `params` as a form-encoded body.
    pub fn post_form(&self, segments: &[&str], params: &Params<'_>) -> GraphResult<HttpRequest> {
        let authorization = self.authorization()?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.url(segments)?.into(),
            headers: vec![
                authorization,
                ("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string()),
            ],
            body: Some(encode_form(params)),
        })
    }

    /// Decode a 2xx body into `T`, or map the failure status.
    pub fn parse<T: DeserializeOwned>(&self, response: HttpResponse) -> GraphResult<T> {
        check_status(&response)?;
        serde_json::from_str(&response.body).map_err(GraphError::Deserialization)
    }

    /// Decode a 2xx list body (`{"data": [...]}` or a bare array).
    pub fn parse_list<T: DeserializeOwned>(&self, response: HttpResponse) -> GraphResult<Vec<T>> {
        check_status(&response)?;
        let value: serde_json::Value =
            serde_json::from_str(&response.body).map_err(GraphError::Deserialization)?;
        list_from_value(&value).map_err(GraphError::Deserialization)
    }

    /// Decode the `{"id": "..."}` body of a publish call.
    pub fn parse_created(&self, response: HttpResponse) -> GraphResult<String> {
        self.parse::<CreatedObject>(response).map(|created| created.id)
    }

    fn url(&self, segments: &[&str]) -> GraphResult<Url> {
        let base = self.config.base_url();
        let mut url = Url::parse(base).map_err(|e| GraphError::InvalidUrl(format!("{base}: {e}")))?;
        if let Some(segment) = segments.iter().find(|s| matches!(**s, "" | "." | "..")) {
            return Err(GraphError::InvalidUrl(format!("path segment {segment:?}")));
        }
        url.path_segments_mut()
            .map_err(|()| GraphError::InvalidUrl(format!("{base}: cannot be a base")))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorization(&self) -> GraphResult<(String, String)> {
        let token = self
            .config
            .access_token()
            .ok_or_else(|| GraphError::NotAuthorized("no access token configured".to_string()))?;
        Ok(("Authorization".to_string(), format!("OAuth {token}")))
    }
}

/// `application/x-www-form-urlencoded` serialization in parameter order.
pub fn encode_form(params: &Params<'_>) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (name, value) in params {
        serializer.append_pair(name, value);
    }
    serializer.finish()
}

/// Map non-success status codes to the appropriate `GraphError` variant.
fn check_status(response: &HttpResponse) -> GraphResult<()> {
    if response.is_success() {
        return Ok(());
    }
    let error = GraphErrorPayload::from_body(&response.body);
    let invalid_token = error.as_ref().is_some_and(GraphErrorPayload::is_invalid_token);
    if response.status == 401 || (invalid_token && (400..500).contains(&response.status)) {
        let message = error
            .and_then(|e| e.message)
            .unwrap_or_else(|| format!("HTTP {}", response.status));
        return Err(GraphError::NotAuthorized(message));
    }
    if response.status == 404 {
        return Err(GraphError::ResourceNotFound {
            body: response.body.clone(),
        });
    }
    Err(GraphError::Api {
        status: response.status,
        error,
        body: response.body.clone(),
    })
}

/// Graph API client executing requests through a [`Transport`].
#[derive(Debug, Clone)]
pub struct GraphClient<T> {
    requests: GraphRequests,
    transport: T,
}

impl<T: Transport> GraphClient<T> {
    pub fn new(config: GraphConfig, transport: T) -> Self {
        Self {
            requests: GraphRequests::new(config),
            transport,
        }
    }

    pub fn requests(&self) -> &GraphRequests {
        &self.requests
    }

    pub fn is_authorized(&self) -> bool {
        self.requests.config().is_authorized()
    }

    /// Checkins and place search.
    pub fn places(&self) -> PlacesClient<'_, T> {
        PlacesClient::new(self)
    }

    /// Fetch any object by id, e.g. a `Photo` or a `Page`.
    #[instrument(skip(self))]
    pub fn fetch_object<D: DeserializeOwned>(&self, object_id: &str) -> GraphResult<D> {
        let request = self.requests.get(&[object_id], &[])?;
        let response = self.send(&request)?;
        self.requests.parse(response)
    }

    /// Fetch the list behind `/{object_id}/{connection}`.
    #[instrument(skip(self, params))]
    pub fn fetch_connections<D: DeserializeOwned>(
        &self,
        object_id: &str,
        connection: &str,
        params: &Params<'_>,
    ) -> GraphResult<Vec<D>> {
        let request = self.requests.get(&[object_id, connection], params)?;
        let response = self.send(&request)?;
        self.requests.parse_list(response)
    }

    /// POST to `/{object_id}/{connection}` and return the new object's id.
    #[instrument(skip(self, params))]
    pub fn publish(&self, object_id: &str, connection: &str, params: &Params<'_>) -> GraphResult<String> {
        let request = self
            .requests
            .post_form(&[object_id, connection], params)?;
        let response = self.send(&request)?;
        self.requests.parse_created(response)
    }

    pub(crate) fn send(&self, request: &HttpRequest) -> GraphResult<HttpResponse> {
        debug!(method = %request.method, url = %request.url, "sending Graph API request");
        let response = self.transport.execute(request)?;
        if response.is_success() {
            debug!(status = response.status, "Graph API request succeeded");
        } else {
            warn!(status = response.status, url = %request.url, "Graph API request failed");
        }
        Ok(response)
    }
}
