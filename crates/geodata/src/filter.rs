use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{LayerId, ShapeKey};

/// Spatial relation a filtered content item must satisfy.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Contains,
    Overlaps,
    Within,
}

/// Narrowing applied to a layer-contents request.
///
/// Maps an operator to the reference layers and shape keys the contents must
/// relate to, e.g. `within -> {"state": ["03"]}`. Sent verbatim as the POST
/// body of a filtered contents request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerFilter(pub BTreeMap<FilterOp, BTreeMap<LayerId, Vec<ShapeKey>>>);

impl LayerFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one operator clause, replacing any previous keys for the same
    /// operator and reference layer.
    pub fn with<L, I, K>(mut self, op: FilterOp, layer: L, keys: I) -> Self
    where
        L: Into<LayerId>,
        I: IntoIterator<Item = K>,
        K: Into<ShapeKey>,
    {
        self.0
            .entry(op)
            .or_default()
            .insert(layer.into(), keys.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{FilterOp, LayerFilter};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn serializes_operator_keyed_map() {
        let filter = LayerFilter::new().with(FilterOp::Within, "state", ["03"]);
        let value = serde_json::to_value(&filter).unwrap();
        assert_eq!(value, json!({"within": {"state": ["03"]}}));
    }

    #[test]
    fn empty_filter_is_an_empty_object() {
        let value = serde_json::to_value(LayerFilter::new()).unwrap();
        assert_eq!(value, json!({}));
    }
}
