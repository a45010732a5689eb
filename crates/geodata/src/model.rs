use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Unique identifier of one spatial shape within a data source.
pub type ShapeKey = String;

/// Identifier referencing a named layer of spatial content.
pub type LayerId = String;

/// Four corner coordinates of a query result, as `[lon, lat]` pairs.
pub type BoundingBox = [[f64; 2]; 4];

/// One spatial shape. Immutable once fetched; identified by `key`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeData {
    pub name: String,
    pub key: ShapeKey,
    pub nuts_key: String,
    /// GeoJSON geometry, carried opaquely for the renderer.
    pub geometry: Value,
}

/// Full result of one resolved spatial query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerData {
    pub bounding_box: BoundingBox,
    pub shapes: Vec<ShapeData>,
}

/// Metadata of a named layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerInfo {
    pub id: LayerId,
    pub name: String,
    pub description: String,
    /// EPSG code of the coordinate reference system used in the layer.
    pub crs: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
}

/// One content item of a named layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerContent {
    pub name: String,
    pub key: ShapeKey,
    #[serde(rename = "additionalProperties", default)]
    pub additional_properties: Value,
    pub geometry: Value,
}

impl LayerContent {
    /// Whether the content's geometry is a GeoJSON point.
    pub fn is_point(&self) -> bool {
        self.geometry.get("type").and_then(Value::as_str) == Some("Point")
    }
}
