//! Client for the Facebook Graph API: checkins, place search, and typed
//! decoding of Graph objects such as photos and pages.
//!
//! # Overview
//! Request building and response parsing are pure (`GraphRequests`,
//! `PlacesRequests`); the round-trip itself goes through the [`Transport`]
//! trait, so tests and hosts can swap the HTTP layer. [`GraphClient`] ties
//! the two together.
//!
//! ```no_run
//! use facebook_graph::{GraphClient, GraphConfig, UreqTransport};
//!
//! let client = GraphClient::new(GraphConfig::new("access-token"), UreqTransport::new());
//! let places = client.places().search("coffee", 33.050278, -96.745833, 5280)?;
//! for place in places {
//!     println!("{} {:?}", place.id, place.name);
//! }
//! # Ok::<(), facebook_graph::GraphError>(())
//! ```
//!
//! # Design
//! - Configuration (`GraphConfig`) is an immutable value handed to the
//!   client; there is no global state.
//! - Every request carries `Authorization: OAuth <token>`. A missing token,
//!   HTTP 401, or an invalid-token Graph error surfaces as
//!   `GraphError::NotAuthorized`.
//! - There are no retries; each call either fully succeeds or fails.

pub mod config;
pub mod error;
pub mod graph;
pub mod http;
pub mod json;
pub mod places;
pub mod types;

pub use config::GraphConfig;
pub use error::{GraphError, GraphErrorPayload, GraphResult};
pub use graph::{GraphClient, GraphRequests};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
#[cfg(feature = "ureq")]
pub use http::UreqTransport;
pub use places::{Coordinates, NewCheckin, PlacesClient, PlacesRequests};
pub use types::{Checkin, Comment, CreatedObject, Image, Location, Page, Photo, Reference, Tag};
