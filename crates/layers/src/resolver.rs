use std::collections::{BTreeMap, BTreeSet};

use futures_util::future::{join_all, try_join};
use tracing::debug;

use geodata::{GeoError, GeoSource, LayerContent, LayerFilter, LayerId, LayerInfo};

use crate::config::{Descriptor, LayerConfig};

/// Resolved data for one configured layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLayer {
    pub info: LayerInfo,
    pub contents: Vec<LayerContent>,
}

/// Resolution result, keyed by layer id.
pub type ResolvedLayers = BTreeMap<LayerId, ResolvedLayer>;

/// Resolves every content-backed descriptor of `config` to its layer info
/// and contents.
///
/// Raw layers need no fetch and are skipped. Descriptors referencing the
/// same layer id are deduplicated, first occurrence wins (including its
/// filter). All fetches are issued concurrently; the result map is keyed by
/// layer id, so it is deterministic regardless of completion order. A layer
/// resolving to no info or contents is a hard configuration error naming
/// the offending layer.
pub async fn resolve_config(
    source: &(impl GeoSource + ?Sized),
    config: &LayerConfig,
) -> Result<ResolvedLayers, GeoError> {
    let mut seen: BTreeSet<LayerId> = BTreeSet::new();
    let mut targets: Vec<(LayerId, Option<LayerFilter>)> = Vec::new();
    for descriptor in config.descriptors() {
        let (layer, filter) = match descriptor {
            Descriptor::Id(id) => (id.clone(), None),
            Descriptor::Expanded(expanded) => (expanded.layer.clone(), expanded.filter.clone()),
            Descriptor::Raw(_) => continue,
        };
        if !seen.insert(layer.clone()) {
            continue;
        }
        targets.push((layer, filter));
    }

    let fetches = targets.iter().map(|(layer, filter)| async move {
        let (info, contents) = try_join(
            source.layer_info(layer),
            source.layer_contents(layer, filter.as_ref()),
        )
        .await?;
        let info = info.ok_or_else(|| GeoError::MissingLayer {
            layer: layer.clone(),
        })?;
        let contents = contents.ok_or_else(|| GeoError::MissingLayer {
            layer: layer.clone(),
        })?;
        Ok::<_, GeoError>((layer.clone(), ResolvedLayer { info, contents }))
    });

    // join_all keeps input order, so the first failing descriptor wins
    // deterministically even though completion order is arbitrary.
    let mut resolved = ResolvedLayers::new();
    for result in join_all(fetches).await {
        let (layer, data) = result?;
        resolved.insert(layer, data);
    }

    debug!(layers = resolved.len(), "layer configuration resolved");
    Ok(resolved)
}
