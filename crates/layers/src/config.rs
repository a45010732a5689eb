use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use geodata::{LayerContent, LayerFilter, LayerId, LayerInfo};

/// Opaque handle to a pre-rendered layer supplied by the host renderer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct RawHandle(pub u64);

/// Pre-constructed render layer, bypassing fetch and cache entirely.
///
/// The name is required: no server-provided name exists for raw layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLayer {
    pub handle: RawHandle,
    pub name: String,
    /// Initial visibility; `None` means "use the positional default".
    pub show: Option<bool>,
}

impl RawLayer {
    pub fn new(handle: RawHandle, name: impl Into<String>) -> Self {
        Self {
            handle,
            name: name.into(),
            show: None,
        }
    }

    pub fn with_show(mut self, show: bool) -> Self {
        self.show = Some(show);
        self
    }
}

/// Data-driven styling hook, invoked with one content item, all contents of
/// the layer, and the layer info. The returned value is handed opaquely to
/// the renderer.
pub type StyleFn = Arc<dyn Fn(&LayerContent, &[LayerContent], &LayerInfo) -> Value + Send + Sync>;

/// Marker construction hook for point contents, same calling convention as
/// [`StyleFn`].
pub type MarkerFn = Arc<dyn Fn(&LayerContent, &[LayerContent], &LayerInfo) -> Value + Send + Sync>;

/// Where a layer control is docked on the render surface.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ControlPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Host-interpreted control attached to a layer.
///
/// Carried opaquely through to the render plan; wiring the actual control is
/// the host's concern.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlSpec {
    pub id: String,
    pub position: ControlPosition,
    pub init: Value,
}

impl ControlSpec {
    pub fn new(id: impl Into<String>, position: ControlPosition) -> Self {
        Self {
            id: id.into(),
            position,
            init: Value::Null,
        }
    }

    pub fn with_init(mut self, init: Value) -> Self {
        self.init = init;
        self
    }
}

/// Fully specified descriptor for a content-backed layer.
#[derive(Clone, Default)]
pub struct ExpandedDescriptor {
    pub layer: LayerId,
    /// Override for the server-provided layer name, useful when filtered.
    pub name: Option<String>,
    /// Initial visibility; `None` means "use the positional default".
    pub show: Option<bool>,
    pub filter: Option<LayerFilter>,
    /// Whether the layer's shapes can be selected by user input.
    pub select: bool,
    /// Override for the default marker clustering behavior.
    pub cluster: Option<bool>,
    /// Bind content names as tooltips.
    pub show_names: bool,
    pub style: Option<StyleFn>,
    pub marker: Option<MarkerFn>,
    pub controls: Vec<ControlSpec>,
}

impl ExpandedDescriptor {
    pub fn new(layer: impl Into<LayerId>) -> Self {
        Self {
            layer: layer.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_show(mut self, show: bool) -> Self {
        self.show = Some(show);
        self
    }

    pub fn with_filter(mut self, filter: LayerFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn selectable(mut self) -> Self {
        self.select = true;
        self
    }

    pub fn with_cluster(mut self, cluster: bool) -> Self {
        self.cluster = Some(cluster);
        self
    }

    pub fn with_show_names(mut self) -> Self {
        self.show_names = true;
        self
    }

    pub fn with_style(
        mut self,
        style: impl Fn(&LayerContent, &[LayerContent], &LayerInfo) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.style = Some(Arc::new(style));
        self
    }

    pub fn with_marker(
        mut self,
        marker: impl Fn(&LayerContent, &[LayerContent], &LayerInfo) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.marker = Some(Arc::new(marker));
        self
    }

    pub fn with_control(mut self, control: ControlSpec) -> Self {
        self.controls.push(control);
        self
    }
}

impl fmt::Debug for ExpandedDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpandedDescriptor")
            .field("layer", &self.layer)
            .field("name", &self.name)
            .field("show", &self.show)
            .field("filter", &self.filter)
            .field("select", &self.select)
            .field("cluster", &self.cluster)
            .field("show_names", &self.show_names)
            .field("style", &self.style.as_ref().map(|_| "<fn>"))
            .field("marker", &self.marker.as_ref().map(|_| "<fn>"))
            .field("controls", &self.controls)
            .finish()
    }
}

/// A layer in the configuration: an id shorthand, a raw pre-rendered layer,
/// or a fully expanded descriptor.
#[derive(Debug, Clone)]
pub enum Descriptor {
    Id(LayerId),
    Raw(RawLayer),
    Expanded(ExpandedDescriptor),
}

impl Descriptor {
    /// Normalizes the id shorthand into an expanded descriptor; raw and
    /// already expanded descriptors pass through unchanged.
    pub fn expand(self) -> Descriptor {
        match self {
            Descriptor::Id(id) => Descriptor::Expanded(ExpandedDescriptor::new(id)),
            other => other,
        }
    }

    /// The referenced layer id; `None` for raw layers.
    pub fn layer_id(&self) -> Option<&str> {
        match self {
            Descriptor::Id(id) => Some(id),
            Descriptor::Expanded(expanded) => Some(&expanded.layer),
            Descriptor::Raw(_) => None,
        }
    }
}

impl From<&str> for Descriptor {
    fn from(id: &str) -> Self {
        Descriptor::Id(id.to_string())
    }
}

impl From<String> for Descriptor {
    fn from(id: String) -> Self {
        Descriptor::Id(id)
    }
}

impl From<RawLayer> for Descriptor {
    fn from(raw: RawLayer) -> Self {
        Descriptor::Raw(raw)
    }
}

impl From<ExpandedDescriptor> for Descriptor {
    fn from(expanded: ExpandedDescriptor) -> Self {
        Descriptor::Expanded(expanded)
    }
}

/// Member of a selection group.
///
/// Bases are mutually exclusive radio choices, useful for different
/// resolutions of the same layer; overlays toggle independently.
#[derive(Debug, Clone)]
pub enum GroupEntry {
    Base(Descriptor),
    Overlay(Descriptor),
}

impl GroupEntry {
    pub fn descriptor(&self) -> &Descriptor {
        match self {
            GroupEntry::Base(descriptor) | GroupEntry::Overlay(descriptor) => descriptor,
        }
    }
}

/// Top-level configuration entry.
#[derive(Debug, Clone)]
pub enum ConfigEntry {
    /// Always visible, never user-toggleable.
    Required(Descriptor),
    /// One selection control with its members.
    Group(Vec<GroupEntry>),
}

/// The configuration of a map's layers.
///
/// Order is significant: it fixes render order and the default base choice
/// of each group.
#[derive(Debug, Clone, Default)]
pub struct LayerConfig {
    pub entries: Vec<ConfigEntry>,
}

impl LayerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, descriptor: impl Into<Descriptor>) -> Self {
        self.entries.push(ConfigEntry::Required(descriptor.into()));
        self
    }

    pub fn group(mut self, members: Vec<GroupEntry>) -> Self {
        self.entries.push(ConfigEntry::Group(members));
        self
    }

    /// Every descriptor of the config in input order, groups flattened.
    pub fn descriptors(&self) -> Vec<&Descriptor> {
        let mut out = Vec::new();
        for entry in &self.entries {
            match entry {
                ConfigEntry::Required(descriptor) => out.push(descriptor),
                ConfigEntry::Group(members) => {
                    out.extend(members.iter().map(GroupEntry::descriptor));
                }
            }
        }
        out
    }
}
