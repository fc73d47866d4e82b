//! Wire shapes for the harbor batch body.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::HarborDraft;

/// One harbor record as submitted by clients.
///
/// Every field is optional on the wire so that validation can report all
/// missing fields at once. Unknown fields, including an inner `unloc`, are
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, ToSchema)]
pub struct HarborPayload {
    #[schema(example = "Los Angeles")]
    pub name: Option<String>,
    #[schema(example = "Los Angeles")]
    pub city: Option<String>,
    #[schema(example = "USA")]
    pub country: Option<String>,
    pub alias: Option<Vec<String>>,
    pub regions: Option<Vec<String>>,
    /// `[longitude, latitude]`.
    #[schema(example = json!([-118.2437, 34.0522]))]
    pub coordinates: Option<Vec<f64>>,
    #[schema(example = "California")]
    pub province: Option<String>,
    #[schema(example = "America/Los_Angeles")]
    pub timezone: Option<String>,
    pub unlocs: Option<Vec<String>>,
    /// Free-form code. The outer key remains the harbor identity.
    #[schema(example = "53001")]
    pub code: Option<String>,
}

impl From<HarborPayload> for HarborDraft {
    fn from(payload: HarborPayload) -> Self {
        Self {
            name: payload.name,
            city: payload.city,
            country: payload.country,
            alias: payload.alias.unwrap_or_default(),
            regions: payload.regions.unwrap_or_default(),
            coordinates: payload.coordinates.unwrap_or_default(),
            province: payload.province,
            timezone: payload.timezone,
            unlocs: payload.unlocs.unwrap_or_default(),
            code: payload.code,
        }
    }
}

/// Request body: harbor codes mapped to harbor records.
///
/// Only used to document the endpoint. The handler decodes the body
/// incrementally instead of deserializing this map.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[schema(example = json!({
    "USLAX": {
        "name": "Los Angeles",
        "city": "Los Angeles",
        "country": "USA",
        "alias": ["Port of LA"],
        "regions": ["West Coast"],
        "coordinates": [-118.2437, 34.0522],
        "province": "California",
        "timezone": "America/Los_Angeles",
        "unlocs": ["USLAX"],
        "code": "53001"
    }
}))]
pub struct HarborBatch(pub BTreeMap<String, HarborPayload>);
