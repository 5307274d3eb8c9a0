//! Domain objects decoded from Graph API responses.
//!
//! # Design
//! Every entity is an owned value built once from a response body. `id` is
//! the only field the client insists on; everything else is `Option` so an
//! absent field is distinguishable from a real zero or empty string. Unknown
//! fields are ignored, which keeps older clients working as the API grows.
//! List fields accept every list shape the API emits (see
//! [`crate::json::list_from_value`]).
//!
//! The types derive `Serialize` as well, writing timestamps back in the Graph
//! format, so a decoded object re-encodes to JSON this module can read again.

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::json::{graph_list, graph_time};

/// A lightweight mention of another object: an actor, a liker, a tagged user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Reference {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
        }
    }
}

/// A tag on a photo. `x`/`y` are offsets in percent of the image size.
///
/// Tags for people without an account carry only a name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, with = "graph_time::option", skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,
}

/// One rendition of a photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub source: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, with = "graph_time::option", skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "graph_list::deserialize", skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<Image>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
    #[serde(default, with = "graph_time::option", skip_serializing_if = "Option::is_none")]
    pub updated_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "graph_list::deserialize", skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
}

/// A street address plus coordinates. Any part may be missing.
///
/// Some pages report their location as free text rather than an address;
/// that text lands in `description` with the other fields unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Location {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Deserialize)]
struct Address {
    #[serde(default)]
    street: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    zip: Option<String>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    description: Option<String>,
}

impl<'de> Deserialize<'de> for Location {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(description) => Ok(Location {
                description: Some(description),
                ..Location::default()
            }),
            value => {
                let Address {
                    street,
                    city,
                    state,
                    country,
                    zip,
                    latitude,
                    longitude,
                    description,
                } = Address::deserialize(value).map_err(<D::Error as de::Error>::custom)?;
                Ok(Location {
                    street,
                    city,
                    state,
                    country,
                    zip,
                    latitude,
                    longitude,
                    description,
                })
            }
        }
    }
}

/// A page. Places returned by search and attached to checkins are pages
/// with a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, with = "graph_time::option", skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub like_count: Option<u64>,
}

/// A post that places its author at a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkin {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place: Option<Page>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<Reference>,
    #[serde(default, with = "graph_time::option", skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "graph_list::deserialize", skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Reference>>,
    #[serde(default, deserialize_with = "graph_list::deserialize", skip_serializing_if = "Option::is_none")]
    pub likes: Option<Vec<Reference>>,
    #[serde(default, deserialize_with = "graph_list::deserialize", skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Comment>>,
}

/// Body of a successful publish call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedObject {
    pub id: String,
}
