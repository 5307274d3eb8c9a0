//! Checkins and place search.
//!
//! # Design
//! `PlacesRequests` holds the pure `build_*`/`parse_*` pairs for every
//! operation so hosts that perform their own I/O can use them directly.
//! `PlacesClient` runs the same pairs through a `GraphClient` transport.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{GraphError, GraphResult};
use crate::graph::{GraphClient, GraphRequests};
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::types::{Checkin, Page};

pub const DEFAULT_OFFSET: u32 = 0;
pub const DEFAULT_LIMIT: u32 = 25;

/// The authenticated user, as a path segment.
pub const ME: &str = "me";

/// The `coordinates` form field of a checkin: a JSON document whose values
/// are decimal strings, e.g. `{"latitude":"32.9","longitude":"-96.6"}`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Serialize, Deserialize)]
struct CoordinatesWire {
    latitude: String,
    longitude: String,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Encode as the JSON text carried in the `coordinates` field.
    pub fn to_form_value(&self) -> GraphResult<String> {
        let wire = CoordinatesWire {
            latitude: decimal(self.latitude)?,
            longitude: decimal(self.longitude)?,
        };
        serde_json::to_string(&wire).map_err(GraphError::Serialization)
    }

    /// Decode the JSON text of a `coordinates` field.
    pub fn from_form_value(value: &str) -> GraphResult<Self> {
        let wire: CoordinatesWire = serde_json::from_str(value).map_err(GraphError::Deserialization)?;
        let parse = |s: &str| {
            s.parse::<f64>().map_err(|e| {
                GraphError::Deserialization(serde::de::Error::custom(format!("coordinate {s:?}: {e}")))
            })
        };
        Ok(Self {
            latitude: parse(&wire.latitude)?,
            longitude: parse(&wire.longitude)?,
        })
    }
}

/// Plain decimal notation with at least one fractional digit, e.g. `33.0`.
/// NaN and infinities have no wire form.
fn decimal(value: f64) -> GraphResult<String> {
    if !value.is_finite() {
        return Err(GraphError::Serialization(serde::ser::Error::custom(format!(
            "coordinate {value} is not finite"
        ))));
    }
    let mut text = value.to_string();
    if !text.contains('.') {
        text.push_str(".0");
    }
    Ok(text)
}

/// A checkin to publish. Message and tags are optional.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCheckin {
    pub place_id: String,
    pub coordinates: Coordinates,
    pub message: Option<String>,
    pub tags: Vec<String>,
}

impl NewCheckin {
    pub fn new(place_id: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            place_id: place_id.into(),
            coordinates: Coordinates::new(latitude, longitude),
            message: None,
            tags: Vec::new(),
        }
    }

    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Ids of the users to tag.
    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Form fields in wire order: place, coordinates, message, tags.
    fn form_params(&self) -> GraphResult<Vec<(&'static str, String)>> {
        let mut params = vec![
            ("place", self.place_id.clone()),
            ("coordinates", self.coordinates.to_form_value()?),
        ];
        if let Some(message) = &self.message {
            params.push(("message", message.clone()));
        }
        if !self.tags.is_empty() {
            params.push(("tags", self.tags.join(",")));
        }
        Ok(params)
    }
}

/// Request builders and response parsers for the places endpoints.
#[derive(Debug, Clone)]
pub struct PlacesRequests<'a> {
    graph: &'a GraphRequests,
}

impl<'a> PlacesRequests<'a> {
    pub fn new(graph: &'a GraphRequests) -> Self {
        Self { graph }
    }

    /// GET `/{user_id}/posts?offset=O&limit=L&with=location`.
    pub fn build_get_checkins(&self, user_id: &str, offset: u32, limit: u32) -> GraphResult<HttpRequest> {
        self.graph.get(
            &[user_id, "posts"],
            &[
                ("offset", offset.to_string()),
                ("limit", limit.to_string()),
                ("with", "location".to_string()),
            ],
        )
    }

    pub fn parse_get_checkins(&self, response: HttpResponse) -> GraphResult<Vec<Checkin>> {
        self.graph.parse_list(response)
    }

    pub fn build_get_checkin(&self, checkin_id: &str) -> GraphResult<HttpRequest> {
        self.graph.get(&[checkin_id], &[])
    }

    pub fn parse_get_checkin(&self, response: HttpResponse) -> GraphResult<Checkin> {
        self.graph.parse(response)
    }

    /// POST `/me/feed` with the checkin as form fields.
    pub fn build_checkin(&self, checkin: &NewCheckin) -> GraphResult<HttpRequest> {
        self.graph.post_form(&[ME, "feed"], &checkin.form_params()?)
    }

    pub fn parse_checkin(&self, response: HttpResponse) -> GraphResult<String> {
        self.graph.parse_created(response)
    }

    /// GET `/search?q=…&type=place&center=lat%2Clon&distance=m`.
    pub fn build_search(
        &self,
        query: &str,
        latitude: f64,
        longitude: f64,
        distance: u32,
    ) -> GraphResult<HttpRequest> {
        let center = format!("{},{}", decimal(latitude)?, decimal(longitude)?);
        self.graph.get(
            &["search"],
            &[
                ("q", query.to_string()),
                ("type", "place".to_string()),
                ("center", center),
                ("distance", distance.to_string()),
            ],
        )
    }

    pub fn parse_search(&self, response: HttpResponse) -> GraphResult<Vec<Page>> {
        self.graph.parse_list(response)
    }
}

/// Places operations executed through a `GraphClient`.
#[derive(Debug)]
pub struct PlacesClient<'a, T> {
    client: &'a GraphClient<T>,
}

impl<'a, T: Transport> PlacesClient<'a, T> {
    pub fn new(client: &'a GraphClient<T>) -> Self {
        Self { client }
    }

    fn requests(&self) -> PlacesRequests<'a> {
        PlacesRequests::new(self.client.requests())
    }

    /// The first page of the authenticated user's checkins.
    pub fn get_checkins(&self) -> GraphResult<Vec<Checkin>> {
        self.get_user_checkins_page(ME, DEFAULT_OFFSET, DEFAULT_LIMIT)
    }

    pub fn get_checkins_page(&self, offset: u32, limit: u32) -> GraphResult<Vec<Checkin>> {
        self.get_user_checkins_page(ME, offset, limit)
    }

    pub fn get_user_checkins(&self, user_id: &str) -> GraphResult<Vec<Checkin>> {
        self.get_user_checkins_page(user_id, DEFAULT_OFFSET, DEFAULT_LIMIT)
    }

    #[instrument(skip(self))]
    pub fn get_user_checkins_page(&self, user_id: &str, offset: u32, limit: u32) -> GraphResult<Vec<Checkin>> {
        let requests = self.requests();
        let request = requests.build_get_checkins(user_id, offset, limit)?;
        requests.parse_get_checkins(self.client.send(&request)?)
    }

    #[instrument(skip(self))]
    pub fn get_checkin(&self, checkin_id: &str) -> GraphResult<Checkin> {
        let requests = self.requests();
        let request = requests.build_get_checkin(checkin_id)?;
        requests.parse_get_checkin(self.client.send(&request)?)
    }

    /// Check in at a place without a message or tags. Returns the new id.
    pub fn checkin(&self, place_id: &str, latitude: f64, longitude: f64) -> GraphResult<String> {
        self.checkin_with(&NewCheckin::new(place_id, latitude, longitude))
    }

    #[instrument(skip(self), fields(place_id = %checkin.place_id))]
    pub fn checkin_with(&self, checkin: &NewCheckin) -> GraphResult<String> {
        let requests = self.requests();
        let request = requests.build_checkin(checkin)?;
        requests.parse_checkin(self.client.send(&request)?)
    }

    /// Places matching `query` within `distance` meters of the center.
    #[instrument(skip(self))]
    pub fn search(&self, query: &str, latitude: f64, longitude: f64, distance: u32) -> GraphResult<Vec<Page>> {
        let requests = self.requests();
        let request = requests.build_search(query, latitude, longitude, distance)?;
        requests.parse_search(self.client.send(&request)?)
    }
}
