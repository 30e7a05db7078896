//! Total read accessors over the flattened tables.
//!
//! Every accessor here answers for any `NodeId`, recognized or not: an
//! unknown or null id gets a defined sentinel (empty string, zero range,
//! empty slice) instead of a failure. A renderer redrawing every frame can
//! query speculatively without guarding each call.

use crate::graph::{NodeGraph, NodeId, NodeKind};
use crate::item::ItemId;
use crate::time::{RationalTime, TimeRange};

impl NodeGraph {
    /// The document root, or `NodeId::NULL` when no document is indexed.
    pub fn root_node(&self) -> NodeId {
        if self.has_root { NodeId::ROOT } else { NodeId::NULL }
    }

    /// Cached name; `""` for unknown nodes.
    pub fn name(&self, node: NodeId) -> &str {
        self.names.get(&node).map(String::as_str).unwrap_or("")
    }

    /// Classification fixed at flatten time; `General` for unknown nodes.
    pub fn kind(&self, node: NodeId) -> NodeKind {
        self.kinds.get(&node).copied().unwrap_or_default()
    }

    /// Audio/video kind string, only populated for track nodes.
    pub fn track_kind(&self, node: NodeId) -> &str {
        self.track_kinds.get(&node).map(String::as_str).unwrap_or("")
    }

    /// Parent node; `NodeId::NULL` for the root and for unknown nodes.
    pub fn parent(&self, node: NodeId) -> NodeId {
        self.parents.get(&node).copied().unwrap_or(NodeId::NULL)
    }

    /// Cached range in document space. Zero range when the node is unknown
    /// or was skipped during range resolution.
    pub fn node_time_range(&self, node: NodeId) -> TimeRange {
        self.times.get(&node).copied().unwrap_or_default()
    }

    pub fn start_time(&self, node: NodeId) -> RationalTime {
        self.node_time_range(node).start_time()
    }

    pub fn duration(&self, node: NodeId) -> RationalTime {
        self.node_time_range(node).duration()
    }

    /// Children that begin in parallel (tracks under the root).
    pub fn sync_starts(&self, node: NodeId) -> &[NodeId] {
        self.sync_starts.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Children in strict sequential playback order (items in a track).
    pub fn seq_starts(&self, node: NodeId) -> &[NodeId] {
        self.seq_starts.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The whole document's range, cached at build time.
    pub fn timeline_time_range(&self) -> TimeRange {
        self.timeline_range
    }

    /// Aggregate linear time-warp scalar cached for the node; identity for
    /// unknown nodes and nodes without warps.
    pub fn time_scalar(&self, node: NodeId) -> f64 {
        self.time_scalars.get(&node).copied().unwrap_or(1.0)
    }

    /// End time with the node's warp aggregate applied to its duration;
    /// what a secondary ruler displays as the rendered end.
    pub fn warped_end_time(&self, node: NodeId) -> RationalTime {
        let range = self.node_time_range(node);
        let duration = range.duration();
        range.start_time()
            + RationalTime::new(duration.value() * self.time_scalar(node), duration.rate())
    }

    /// Identity of the underlying item, stable within a session even when
    /// the node graph is rebuilt. `0` for unknown nodes.
    pub fn stationary_id(&self, node: NodeId) -> u64 {
        self.node_items
            .get(&node)
            .map(|item| item.index() as u64 + 1)
            .unwrap_or(0)
    }

    /// Node standing for `item` in this pass; `NodeId::NULL` on miss.
    pub fn node_from_item(&self, item: ItemId) -> NodeId {
        self.reverse.get(&item).copied().unwrap_or(NodeId::NULL)
    }

    /// Arena item behind `node`, for selection metadata lookups.
    pub fn item_from_node(&self, node: NodeId) -> Option<ItemId> {
        self.node_items.get(&node).copied()
    }
}
