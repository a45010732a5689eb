//! Wire representations of the remote geo-data API.

use serde::Deserialize;
use serde_json::Value;

use crate::model::{BoundingBox, LayerData, ShapeData};

/// One shape as returned by `GET /<base>/`.
#[derive(Debug, Clone, Deserialize)]
pub struct ShapeRecord {
    pub name: String,
    pub key: String,
    pub nuts_key: String,
    pub geojson: Value,
}

/// Response body of the shapes endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ShapesResponse {
    #[serde(rename = "box")]
    pub bounding_box: BoundingBox,
    pub shapes: Vec<ShapeRecord>,
}

impl From<ShapeRecord> for ShapeData {
    fn from(record: ShapeRecord) -> Self {
        ShapeData {
            name: record.name,
            key: record.key,
            nuts_key: record.nuts_key,
            geometry: record.geojson,
        }
    }
}

impl From<ShapesResponse> for LayerData {
    fn from(response: ShapesResponse) -> Self {
        LayerData {
            bounding_box: response.bounding_box,
            shapes: response.shapes.into_iter().map(Into::into).collect(),
        }
    }
}
