//! Flattening indexer: one pass from the composition tree to a flat node
//! graph expressed in the document coordinate space.
//!
//! Node ids are assigned during the pass and are only meaningful for that
//! pass; the counter restarts at the same constant on every rebuild, so
//! two builds of the same document hand out the same raw numbers to
//! different-but-matching nodes. Never persist a `NodeId` or compare ids
//! across rebuilds; use `stationary_id` for identity that survives one.
//!
//! Time resolution is one bulk [`range_of_all_children`] call per track
//! followed by a single per-track shift into document space, so nested
//! trims at intermediate levels cost nothing per item.
//!
//! [`range_of_all_children`]: crate::Composition::range_of_all_children

use std::collections::HashMap;

use log::{debug, trace};

use crate::composition::Composition;
use crate::item::{ItemId, ItemKind};
use crate::time::{RationalTime, TimeRange};

/// Identity of a flattened node, valid for one flatten pass.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NodeId(pub(crate) u64);

impl NodeId {
    pub const NULL: NodeId = NodeId(0);
    pub const ROOT: NodeId = NodeId(1);
    /// First id handed out to tracks and items; values below are reserved.
    pub(crate) const FIRST: NodeId = NodeId(3);

    pub fn is_null(self) -> bool {
        self == Self::NULL
    }
}

/// Classification assigned once at flatten time.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum NodeKind {
    Track,
    #[default]
    General,
    Gap,
    Transition,
}

/// Flat, queryable tables over one flatten pass.
///
/// Wholly cleared and rebuilt per document load; immutable between loads,
/// so a renderer can read it every frame without defensive branching (see
/// the accessors in [`crate::query`]).
#[derive(Clone, Debug, Default)]
pub struct NodeGraph {
    pub(crate) parents: HashMap<NodeId, NodeId>,
    pub(crate) names: HashMap<NodeId, String>,
    pub(crate) track_kinds: HashMap<NodeId, String>,
    pub(crate) kinds: HashMap<NodeId, NodeKind>,
    pub(crate) times: HashMap<NodeId, TimeRange>,
    pub(crate) time_scalars: HashMap<NodeId, f64>,
    pub(crate) sync_starts: HashMap<NodeId, Vec<NodeId>>,
    pub(crate) seq_starts: HashMap<NodeId, Vec<NodeId>>,
    pub(crate) node_items: HashMap<NodeId, ItemId>,
    pub(crate) reverse: HashMap<ItemId, NodeId>,
    pub(crate) timeline_range: TimeRange,
    pub(crate) has_root: bool,
    next_id: u64,
}

impl NodeGraph {
    /// The no-document graph: every query answers its sentinel.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Flatten `doc` into a fresh graph. Runs to completion in one pass,
    /// O(total items); treat as blocking in proportion to document size.
    pub fn build(doc: &Composition) -> Self {
        let mut graph = Self {
            next_id: NodeId::FIRST.0,
            ..Self::default()
        };

        // The root node stands for the track container itself.
        graph.has_root = true;
        graph.node_items.insert(NodeId::ROOT, doc.root());
        graph.reverse.insert(doc.root(), NodeId::ROOT);
        graph.names.insert(NodeId::ROOT, doc.name().to_string());
        graph.sync_starts.insert(NodeId::ROOT, Vec::new());

        for &track_id in doc.tracks() {
            graph.index_track(doc, track_id);
        }

        graph.timeline_range = doc.timeline_time_range();
        debug!(
            "flattened \"{}\": {} nodes, {} tracks",
            doc.name(),
            graph.node_items.len(),
            graph.sync_starts[&NodeId::ROOT].len(),
        );
        graph
    }

    pub(crate) fn node_count(&self) -> usize {
        self.node_items.len()
    }

    fn alloc(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Register one track and its direct children, then resolve every
    /// child range with one bulk computation and one coordinate shift.
    fn index_track(&mut self, doc: &Composition, track_id: ItemId) {
        let Some(track) = doc.item(track_id) else {
            return;
        };

        let track_node = self.alloc();
        self.node_items.insert(track_node, track_id);
        self.reverse.insert(track_id, track_node);
        self.parents.insert(track_node, NodeId::ROOT);
        self.names.insert(track_node, track.name.clone());
        self.kinds.insert(track_node, NodeKind::Track);
        if let ItemKind::Track { kind } = &track.kind {
            self.track_kinds.insert(track_node, kind.clone());
        }
        self.sync_starts
            .get_mut(&NodeId::ROOT)
            .expect("root registered before tracks")
            .push(track_node);
        self.seq_starts.insert(track_node, Vec::new());

        for &child_id in track.children() {
            let Some(child) = doc.item(child_id) else {
                continue;
            };
            let child_node = self.alloc();
            self.node_items.insert(child_node, child_id);
            self.reverse.insert(child_id, child_node);
            self.parents.insert(child_node, track_node);
            self.names.insert(child_node, child.name.clone());
            self.kinds.insert(
                child_node,
                match child.kind {
                    ItemKind::Gap => NodeKind::Gap,
                    ItemKind::Transition { .. } => NodeKind::Transition,
                    _ => NodeKind::General,
                },
            );
            self.time_scalars.insert(child_node, child.time_scalar());
            self.seq_starts
                .get_mut(&track_node)
                .expect("track registered before its children")
                .push(child_node);
        }

        // One bulk range computation for the whole track, then a single
        // shift from track space into document space.
        let ranges = doc.range_of_all_children(track_id);
        let zero = RationalTime::default();
        let offset = doc
            .transformed_time(zero, track_id, doc.root())
            .unwrap_or(zero);
        self.apply_track_ranges(ranges, offset);
    }

    /// Shift each computed range into document space and cache it on the
    /// matching node. An item missing from the reverse lookup is skipped:
    /// its node keeps name/kind/parent entries but no cached range.
    fn apply_track_ranges(&mut self, ranges: Vec<(ItemId, TimeRange)>, offset: RationalTime) {
        for (item_id, range) in ranges {
            let Some(&node) = self.reverse.get(&item_id) else {
                trace!("item {:?} has no node; dropping range {:?}", item_id, range);
                continue;
            };
            self.times.insert(
                node,
                TimeRange::new(range.start_time() + offset, range.duration()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{Effect, Item, TRACK_KIND_AUDIO, TRACK_KIND_VIDEO};

    fn clip(name: &str, dur_frames: f64) -> Item {
        Item::new(name, ItemKind::Clip { media: None }).with_source_range(TimeRange::new(
            RationalTime::new(0.0, 24.0),
            RationalTime::new(dur_frames, 24.0),
        ))
    }

    fn two_track_doc() -> Composition {
        let mut doc = Composition::new("doc");
        let v1 = doc.add_track("V1", TRACK_KIND_VIDEO);
        doc.add_item(v1, clip("a", 48.0));
        doc.add_item(v1, clip("b", 72.0));
        let a1 = doc.add_track("A1", TRACK_KIND_AUDIO);
        doc.add_item(a1, clip("dialog", 120.0));
        doc
    }

    #[test]
    fn test_empty_graph_has_null_root() {
        let graph = NodeGraph::empty();
        assert!(graph.root_node().is_null());
        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn test_tracks_are_sync_starts_of_root_in_order() {
        let graph = NodeGraph::build(&two_track_doc());
        let root = graph.root_node();
        assert_eq!(root, NodeId::ROOT);

        let tracks = graph.sync_starts(root);
        assert_eq!(tracks.len(), 2);
        assert_eq!(graph.name(tracks[0]), "V1");
        assert_eq!(graph.track_kind(tracks[0]), TRACK_KIND_VIDEO);
        assert_eq!(graph.name(tracks[1]), "A1");
        assert_eq!(graph.track_kind(tracks[1]), TRACK_KIND_AUDIO);
        assert_eq!(graph.kind(tracks[0]), NodeKind::Track);
    }

    #[test]
    fn test_seq_starts_preserve_source_order() {
        let graph = NodeGraph::build(&two_track_doc());
        let v1 = graph.sync_starts(graph.root_node())[0];
        let items = graph.seq_starts(v1);
        assert_eq!(items.len(), 2);
        assert_eq!(graph.name(items[0]), "a");
        assert_eq!(graph.name(items[1]), "b");
        assert_eq!(graph.parent(items[0]), v1);
        assert_eq!(graph.parent(items[1]), v1);
    }

    #[test]
    fn test_global_ranges_are_back_to_back() {
        let graph = NodeGraph::build(&two_track_doc());
        let v1 = graph.sync_starts(graph.root_node())[0];
        let items = graph.seq_starts(v1);
        assert_eq!(graph.start_time(items[0]), RationalTime::new(0.0, 24.0));
        assert_eq!(graph.start_time(items[1]), RationalTime::new(48.0, 24.0));
        assert_eq!(graph.duration(items[1]), RationalTime::new(72.0, 24.0));
    }

    #[test]
    fn test_transition_scenario_three_entries_with_overlap() {
        let mut doc = Composition::new("doc");
        let v1 = doc.add_track("V1", TRACK_KIND_VIDEO);
        doc.add_item(v1, clip("a", 48.0)); // 2.0s
        doc.add_item(
            v1,
            Item::new(
                "xfade",
                ItemKind::Transition {
                    in_offset: RationalTime::new(12.0, 24.0),
                    out_offset: RationalTime::new(12.0, 24.0),
                },
            ),
        );
        doc.add_item(v1, clip("b", 72.0)); // 3.0s

        let graph = NodeGraph::build(&doc);
        let track = graph.sync_starts(graph.root_node())[0];
        let items = graph.seq_starts(track);
        assert_eq!(items.len(), 3);
        assert_eq!(graph.kind(items[1]), NodeKind::Transition);

        // The transition's range reaches back across the cut by its
        // in-offset; the second clip begins at the cut itself.
        let t_range = graph.node_time_range(items[1]);
        assert_eq!(t_range.start_time(), RationalTime::new(36.0, 24.0));
        assert_eq!(t_range.duration(), RationalTime::new(24.0, 24.0));
        assert_eq!(graph.start_time(items[2]), RationalTime::new(48.0, 24.0));
    }

    #[test]
    fn test_nested_trim_composes_into_document_space() {
        let mut doc = Composition::new("doc");
        let v1 = doc.add_track("V1", TRACK_KIND_VIDEO);
        // Track trimmed 10s into its own content: every child shifts by -10s.
        doc.item_mut(v1).unwrap().source_range = Some(TimeRange::new(
            RationalTime::new(240.0, 24.0),
            RationalTime::new(120.0, 24.0),
        ));
        doc.add_item(v1, clip("a", 48.0));
        doc.add_item(v1, clip("b", 72.0));

        let graph = NodeGraph::build(&doc);
        let track = graph.sync_starts(graph.root_node())[0];
        let items = graph.seq_starts(track);

        // Manual composition: child start in track space (48 for "b"),
        // minus the track trim (240), plus the track placement (0).
        assert_eq!(graph.start_time(items[0]), RationalTime::new(-240.0, 24.0));
        assert_eq!(graph.start_time(items[1]), RationalTime::new(-192.0, 24.0));
    }

    #[test]
    fn test_reverse_lookup_miss_is_skipped_not_fatal() {
        let doc = two_track_doc();
        let mut graph = NodeGraph::build(&doc);
        let v1 = graph.sync_starts(graph.root_node())[0];
        let first = graph.seq_starts(v1)[0];

        // A range for an item the pass never registered is dropped on the
        // floor; existing tables stay intact.
        let phantom = ItemId(9999);
        graph.apply_track_ranges(
            vec![(
                phantom,
                TimeRange::new(RationalTime::new(0.0, 24.0), RationalTime::new(1.0, 24.0)),
            )],
            RationalTime::default(),
        );
        assert!(graph.node_from_item(phantom).is_null());
        assert_eq!(graph.name(first), "a");
        assert_eq!(graph.start_time(first), RationalTime::new(0.0, 24.0));
    }

    #[test]
    fn test_time_scalar_cached_per_node() {
        let mut doc = Composition::new("doc");
        let v1 = doc.add_track("V1", TRACK_KIND_VIDEO);
        let mut warped = clip("warped", 48.0);
        warped.effects.push(Effect::LinearTimeWarp { time_scalar: 2.0 });
        warped.effects.push(Effect::LinearTimeWarp { time_scalar: 1.5 });
        doc.add_item(v1, warped);

        let graph = NodeGraph::build(&doc);
        let track = graph.sync_starts(graph.root_node())[0];
        let node = graph.seq_starts(track)[0];
        assert_eq!(graph.time_scalar(node), 3.0);

        // Secondary-ruler end time: duration stretched by the aggregate.
        let end = graph.warped_end_time(node);
        assert_eq!(end, RationalTime::new(144.0, 24.0));
    }

    #[test]
    fn test_rebuild_matches_by_stationary_id_not_node_id() {
        let doc = two_track_doc();
        let first = NodeGraph::build(&doc);
        let second = NodeGraph::build(&doc);

        let walk = |g: &NodeGraph| -> Vec<(u64, String, NodeKind, u64)> {
            let mut out = Vec::new();
            for &track in g.sync_starts(g.root_node()) {
                out.push((
                    g.stationary_id(track),
                    g.name(track).to_string(),
                    g.kind(track),
                    g.stationary_id(g.parent(track)),
                ));
                for &item in g.seq_starts(track) {
                    out.push((
                        g.stationary_id(item),
                        g.name(item).to_string(),
                        g.kind(item),
                        g.stationary_id(g.parent(item)),
                    ));
                }
            }
            out
        };
        assert_eq!(walk(&first), walk(&second));
    }

    #[test]
    fn test_timeline_range_cached_with_global_start() {
        let mut doc = two_track_doc();
        doc.set_global_start_time(Some(RationalTime::new(86400.0, 24.0)));
        let graph = NodeGraph::build(&doc);
        let range = graph.timeline_time_range();
        assert_eq!(range.start_time(), RationalTime::new(86400.0, 24.0));
        assert_eq!(range.duration(), RationalTime::new(120.0, 24.0));
    }
}
