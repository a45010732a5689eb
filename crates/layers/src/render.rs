use serde_json::Value;
use tracing::warn;

use geodata::{LayerId, ShapeKey};

use crate::config::{ConfigEntry, ControlSpec, Descriptor, GroupEntry, LayerConfig, RawHandle};
use crate::resolver::ResolvedLayers;

/// One renderable feature of a content-backed layer.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFeature {
    pub name: String,
    pub key: ShapeKey,
    pub geometry: Value,
    /// Tooltip text, present when the descriptor asked for names.
    pub tooltip: Option<String>,
    /// Output of the descriptor's style hook, if any.
    pub style: Option<Value>,
    /// Output of the descriptor's marker hook, if any.
    pub marker: Option<Value>,
}

/// What a planned layer renders.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerBody {
    /// Host-supplied pre-rendered layer, used verbatim.
    Raw(RawHandle),
    /// Features constructed from resolved layer contents.
    Features {
        layer: LayerId,
        /// Whether markers should be clustered.
        cluster: bool,
        attribution: Option<String>,
        features: Vec<RenderFeature>,
    },
}

/// One layer of the render plan.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedLayer {
    pub name: String,
    pub visible: bool,
    /// Whether the layer's shapes respond to user selection.
    pub selectable: bool,
    pub body: LayerBody,
    pub controls: Vec<ControlSpec>,
}

impl PlannedLayer {
    /// Keys of every rendered feature, empty for raw layers.
    pub fn feature_keys(&self) -> Vec<ShapeKey> {
        match &self.body {
            LayerBody::Raw(_) => Vec::new(),
            LayerBody::Features { features, .. } => {
                features.iter().map(|f| f.key.clone()).collect()
            }
        }
    }
}

/// Entry of the render plan, in configuration order.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanEntry {
    /// Always visible, never user-toggleable.
    Required(PlannedLayer),
    /// One selection control: mutually exclusive bases plus independently
    /// toggleable overlays.
    Group {
        bases: Vec<PlannedLayer>,
        overlays: Vec<PlannedLayer>,
    },
}

/// Flat render-tree description handed to the host renderer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderPlan {
    pub entries: Vec<PlanEntry>,
}

impl RenderPlan {
    /// Makes one base of a group visible and hides its siblings.
    ///
    /// No-op when the entry is not a group or the base index is out of
    /// range; overlay visibility is untouched.
    pub fn select_base(&mut self, entry: usize, base: usize) {
        let Some(PlanEntry::Group { bases, .. }) = self.entries.get_mut(entry) else {
            return;
        };
        if base >= bases.len() {
            return;
        }
        for (index, layer) in bases.iter_mut().enumerate() {
            layer.visible = index == base;
        }
    }
}

/// Error constructing a single layer, carrying the offending layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerBuildError {
    pub layer: String,
    pub detail: String,
}

impl std::fmt::Display for LayerBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cannot construct layer '{}': {}", self.layer, self.detail)
    }
}

impl std::error::Error for LayerBuildError {}

/// Builds the render-tree description for a resolved configuration.
///
/// Layers are constructed independently: a descriptor that fails, e.g. one
/// without resolved data, is reported in the error list and skipped without
/// aborting the rest of the plan.
pub fn build_render_plan(
    config: &LayerConfig,
    resolved: &ResolvedLayers,
) -> (RenderPlan, Vec<LayerBuildError>) {
    let mut plan = RenderPlan::default();
    let mut errors = Vec::new();

    for entry in &config.entries {
        match entry {
            ConfigEntry::Required(descriptor) => {
                match construct_layer(descriptor, resolved) {
                    Ok((mut layer, _show)) => {
                        // Required layers cannot be hidden.
                        layer.visible = true;
                        plan.entries.push(PlanEntry::Required(layer));
                    }
                    Err(error) => {
                        warn!(layer = %error.layer, "skipping unbuildable layer: {error}");
                        errors.push(error);
                    }
                }
            }
            ConfigEntry::Group(members) => {
                let mut bases: Vec<(PlannedLayer, Option<bool>)> = Vec::new();
                let mut overlays: Vec<PlannedLayer> = Vec::new();
                for member in members {
                    let (descriptor, is_overlay) = match member {
                        GroupEntry::Base(descriptor) => (descriptor, false),
                        GroupEntry::Overlay(descriptor) => (descriptor, true),
                    };
                    match construct_layer(descriptor, resolved) {
                        Ok((mut layer, show)) => {
                            if is_overlay {
                                // Overlays default to visible.
                                layer.visible = show.unwrap_or(true);
                                overlays.push(layer);
                            } else {
                                bases.push((layer, show));
                            }
                        }
                        Err(error) => {
                            warn!(layer = %error.layer, "skipping unbuildable layer: {error}");
                            errors.push(error);
                        }
                    }
                }

                // Exactly one base is visible: the first explicitly shown
                // one, else the first not explicitly hidden, else the first.
                let selected = bases
                    .iter()
                    .position(|(_, show)| *show == Some(true))
                    .or_else(|| bases.iter().position(|(_, show)| show.is_none()))
                    .unwrap_or(0);
                let bases = bases
                    .into_iter()
                    .enumerate()
                    .map(|(index, (mut layer, _))| {
                        layer.visible = index == selected;
                        layer
                    })
                    .collect();

                plan.entries.push(PlanEntry::Group { bases, overlays });
            }
        }
    }

    (plan, errors)
}

/// Constructs one planned layer.
///
/// Returns the layer plus the descriptor's explicit visibility flag; the
/// caller decides the positional default. Raw layers carry their name
/// verbatim and no features.
fn construct_layer(
    descriptor: &Descriptor,
    resolved: &ResolvedLayers,
) -> Result<(PlannedLayer, Option<bool>), LayerBuildError> {
    let descriptor = descriptor.clone().expand();
    let expanded = match descriptor {
        Descriptor::Raw(raw) => {
            let layer = PlannedLayer {
                name: raw.name,
                visible: false,
                selectable: false,
                body: LayerBody::Raw(raw.handle),
                controls: Vec::new(),
            };
            return Ok((layer, raw.show));
        }
        Descriptor::Expanded(expanded) => expanded,
        // expand() never leaves an id shorthand behind.
        Descriptor::Id(id) => {
            return Err(LayerBuildError {
                layer: id,
                detail: "unexpanded layer id".to_string(),
            });
        }
    };

    let Some(data) = resolved.get(&expanded.layer) else {
        return Err(LayerBuildError {
            layer: expanded.layer,
            detail: "no resolved data for layer".to_string(),
        });
    };

    // Cluster by default when the layer is made of points only.
    let cluster = expanded
        .cluster
        .unwrap_or_else(|| data.contents.iter().all(|content| content.is_point()));

    let features = data
        .contents
        .iter()
        .map(|content| RenderFeature {
            name: content.name.clone(),
            key: content.key.clone(),
            geometry: content.geometry.clone(),
            tooltip: expanded.show_names.then(|| content.name.clone()),
            style: expanded
                .style
                .as_ref()
                .map(|style| style(content, &data.contents, &data.info)),
            marker: expanded
                .marker
                .as_ref()
                .map(|marker| marker(content, &data.contents, &data.info)),
        })
        .collect();

    let layer = PlannedLayer {
        name: expanded.name.unwrap_or_else(|| data.info.name.clone()),
        visible: false,
        selectable: expanded.select,
        body: LayerBody::Features {
            layer: expanded.layer,
            cluster,
            attribution: data.info.attribution.clone(),
            features,
        },
        controls: expanded.controls,
    };
    Ok((layer, expanded.show))
}
