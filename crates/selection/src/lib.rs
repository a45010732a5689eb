//! Per-layer selection state for rendered shapes.
//!
//! A `SelectionTracker` remembers which shapes of each selectable layer are
//! currently selected, keeps that state consistent with what is actually
//! rendered, and notifies subscribers synchronously on every change.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use geodata::{LayerId, ShapeKey};

/// Snapshot of one layer's selection, emitted on every change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionEvent {
    pub layer: LayerId,
    pub name: String,
    /// Selected keys in sorted order.
    pub keys: Vec<ShapeKey>,
}

/// Callback receiving selection events.
pub type Subscriber = Box<dyn FnMut(&SelectionEvent) + Send>;

#[derive(Debug, Default)]
struct LayerSelection {
    name: String,
    rendered: BTreeSet<ShapeKey>,
    selected: BTreeSet<ShapeKey>,
}

/// Tracks shape selection per layer.
///
/// Only rendered shapes can be selected; re-rendering a layer drops selected
/// keys that are no longer shown. All notification is synchronous, in the
/// caller's stack frame.
#[derive(Default)]
pub struct SelectionTracker {
    layers: BTreeMap<LayerId, LayerSelection>,
    subscribers: Vec<Subscriber>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a layer and the keys it currently renders.
    ///
    /// Previously selected keys survive as long as they are still rendered.
    pub fn set_rendered(
        &mut self,
        layer: impl Into<LayerId>,
        name: impl Into<String>,
        keys: impl IntoIterator<Item = ShapeKey>,
    ) {
        let layer = layer.into();
        let rendered: BTreeSet<ShapeKey> = keys.into_iter().collect();
        let entry = self.layers.entry(layer).or_default();
        entry.name = name.into();
        entry.selected.retain(|key| rendered.contains(key));
        entry.rendered = rendered;
    }

    /// Drops all layers and their selections. Subscribers stay registered.
    pub fn reset(&mut self) {
        debug!(layers = self.layers.len(), "selection state reset");
        self.layers.clear();
    }

    /// Registers a callback invoked synchronously on every selection change.
    pub fn subscribe(&mut self, subscriber: impl FnMut(&SelectionEvent) + Send + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Toggles one shape of a layer and notifies subscribers.
    ///
    /// Unknown layers and keys that are not rendered are ignored.
    pub fn toggle(&mut self, layer: &str, key: &str) {
        let Some(entry) = self.layers.get_mut(layer) else {
            return;
        };
        if !entry.rendered.contains(key) {
            return;
        }
        if !entry.selected.remove(key) {
            entry.selected.insert(key.to_string());
        }
        self.notify(layer);
    }

    /// Selects every rendered shape of a layer and notifies subscribers.
    pub fn select_all(&mut self, layer: &str) {
        let Some(entry) = self.layers.get_mut(layer) else {
            return;
        };
        entry.selected = entry.rendered.clone();
        self.notify(layer);
    }

    /// Inverts the selection of every rendered shape, as one change with a
    /// single notification.
    pub fn invert_all(&mut self, layer: &str) {
        let Some(entry) = self.layers.get_mut(layer) else {
            return;
        };
        entry.selected = entry
            .rendered
            .difference(&entry.selected)
            .cloned()
            .collect();
        self.notify(layer);
    }

    /// Clears the selection of a layer and notifies subscribers.
    pub fn clear(&mut self, layer: &str) {
        let Some(entry) = self.layers.get_mut(layer) else {
            return;
        };
        entry.selected.clear();
        self.notify(layer);
    }

    /// Currently selected keys of a layer, sorted. Empty for unknown layers.
    pub fn current_selection(&self, layer: &str) -> Vec<ShapeKey> {
        self.layers
            .get(layer)
            .map(|entry| entry.selected.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Whether a specific shape is selected.
    pub fn is_selected(&self, layer: &str, key: &str) -> bool {
        self.layers
            .get(layer)
            .is_some_and(|entry| entry.selected.contains(key))
    }

    fn notify(&mut self, layer: &str) {
        let Some(entry) = self.layers.get(layer) else {
            return;
        };
        let event = SelectionEvent {
            layer: layer.to_string(),
            name: entry.name.clone(),
            keys: entry.selected.iter().cloned().collect(),
        };
        for subscriber in &mut self.subscribers {
            subscriber(&event);
        }
    }
}
