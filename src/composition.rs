//! Arena-owned composition document and its time algebra.
//!
//! The document is a tree of items held in one `Vec` arena; parents and
//! children are indices, so there is no shared ownership and no back
//! reference cycle to manage. The root is always a `Stack` holding the
//! tracks.
//!
//! The algebra here is what the flattening pass leans on: trimmed ranges,
//! the bulk per-track child range computation, and `transformed_time`,
//! which maps an instant from a nested item's coordinate space into an
//! ancestor's space by unwinding each level's trim and placement.

use serde::{Deserialize, Serialize};

use crate::item::{Item, ItemId, ItemKind};
use crate::time::{RationalTime, TimeRange};

/// A loaded editorial document: name, optional global start, item arena.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Composition {
    name: String,
    global_start_time: Option<RationalTime>,
    items: Vec<Item>,
    root: ItemId,
}

impl Composition {
    /// New document with an empty track container.
    pub fn new(name: impl Into<String>) -> Self {
        let root_item = Item::new("tracks", ItemKind::Stack);
        Self {
            name: name.into(),
            global_start_time: None,
            items: vec![root_item],
            root: ItemId(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The track container (a `Stack`), the document coordinate origin.
    pub fn root(&self) -> ItemId {
        self.root
    }

    pub fn global_start_time(&self) -> Option<RationalTime> {
        self.global_start_time
    }

    pub fn set_global_start_time(&mut self, t: Option<RationalTime>) {
        self.global_start_time = t;
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(id.index())
    }

    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.get_mut(id.index())
    }

    pub fn parent(&self, id: ItemId) -> Option<ItemId> {
        self.item(id).and_then(|i| i.parent)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        // The root stack is always present.
        self.items.len() <= 1
    }

    /// Tracks under the root container, in source order.
    pub fn tracks(&self) -> &[ItemId] {
        self.item(self.root).map(Item::children).unwrap_or(&[])
    }

    /// Append `item` under `parent`. Returns the new arena id.
    pub fn add_item(&mut self, parent: ItemId, mut item: Item) -> ItemId {
        let id = ItemId(self.items.len() as u32);
        item.parent = Some(parent);
        self.items.push(item);
        if let Some(p) = self.items.get_mut(parent.index()) {
            p.children.push(id);
        }
        id
    }

    /// Append a track under the root container.
    pub fn add_track(&mut self, name: impl Into<String>, kind: impl Into<String>) -> ItemId {
        let root = self.root;
        self.add_item(root, Item::new(name, ItemKind::Track { kind: kind.into() }))
    }

    // === time algebra ===

    /// The item's full content range in its own space, before trimming.
    ///
    /// Leaves answer with their source range (they have no other measure of
    /// content); tracks answer with the extent of their sequenced children;
    /// stacks with the longest child.
    pub fn available_range(&self, id: ItemId) -> TimeRange {
        let Some(item) = self.item(id) else {
            return TimeRange::default();
        };
        match &item.kind {
            ItemKind::Clip { .. } | ItemKind::Gap => item.source_range.unwrap_or_default(),
            ItemKind::Transition { in_offset, out_offset } => TimeRange::new(
                RationalTime::new(0.0, in_offset.rate()),
                *in_offset + *out_offset,
            ),
            ItemKind::Track { .. } => {
                let extent = self.track_extent(item);
                TimeRange::new(RationalTime::new(0.0, extent.rate()), extent)
            }
            ItemKind::Stack => {
                let mut longest = RationalTime::default();
                for &child in &item.children {
                    let d = self.trimmed_range(child).duration();
                    if d > longest {
                        longest = d;
                    }
                }
                TimeRange::new(RationalTime::new(0.0, longest.rate()), longest)
            }
        }
    }

    /// The item's range after its own trim, in its local space.
    pub fn trimmed_range(&self, id: ItemId) -> TimeRange {
        match self.item(id).and_then(|i| i.source_range) {
            Some(range) => range,
            None => self.available_range(id),
        }
    }

    pub fn duration(&self, id: ItemId) -> RationalTime {
        self.trimmed_range(id).duration()
    }

    /// Ranges of every direct child of `track`, in the track's own space,
    /// computed in one sequential sweep.
    ///
    /// Sequenced items land back to back; a transition does not advance the
    /// cursor, it straddles the cut it sits on: `[cut - in_offset,
    /// in_offset + out_offset)`.
    pub fn range_of_all_children(&self, track: ItemId) -> Vec<(ItemId, TimeRange)> {
        let Some(track_item) = self.item(track) else {
            return Vec::new();
        };
        let rate = self.sequence_rate(track_item);
        let mut result = Vec::with_capacity(track_item.children.len());
        let mut last_end = RationalTime::new(0.0, rate);
        for &child in &track_item.children {
            let Some(child_item) = self.item(child) else {
                continue;
            };
            match &child_item.kind {
                ItemKind::Transition { in_offset, out_offset } => {
                    result.push((
                        child,
                        TimeRange::new(last_end - *in_offset, *in_offset + *out_offset),
                    ));
                }
                _ => {
                    let range = TimeRange::new(last_end, self.trimmed_range(child).duration());
                    last_end = range.end_time_exclusive();
                    result.push((child, range));
                }
            }
        }
        result
    }

    /// Range of `child` inside `parent`'s space, or `None` if `child` is
    /// not a direct child.
    pub fn range_of_child(&self, parent: ItemId, child: ItemId) -> Option<TimeRange> {
        let parent_item = self.item(parent)?;
        match parent_item.kind {
            ItemKind::Track { .. } => self
                .range_of_all_children(parent)
                .into_iter()
                .find(|(id, _)| *id == child)
                .map(|(_, range)| range),
            ItemKind::Stack => {
                if !parent_item.children.contains(&child) {
                    return None;
                }
                // Stack children all begin together at the stack origin.
                let d = self.trimmed_range(child).duration();
                Some(TimeRange::new(RationalTime::new(0.0, d.rate()), d))
            }
            _ => None,
        }
    }

    /// Map instant `t` from `from`'s coordinate space into ancestor `to`'s
    /// space, unwinding each intermediate level's trim and placement.
    /// `None` when `to` is not an ancestor of `from`.
    pub fn transformed_time(
        &self,
        t: RationalTime,
        from: ItemId,
        to: ItemId,
    ) -> Option<RationalTime> {
        let mut t = t;
        let mut cur = from;
        while cur != to {
            let parent = self.parent(cur)?;
            let placed = self.range_of_child(parent, cur)?;
            t = t - self.trimmed_range(cur).start_time() + placed.start_time();
            cur = parent;
        }
        Some(t)
    }

    /// The whole document's range: global start (when the document names
    /// one) plus the track container's duration.
    pub fn timeline_time_range(&self) -> TimeRange {
        TimeRange::new(
            self.global_start_time.unwrap_or_default(),
            self.duration(self.root),
        )
    }

    /// Total sequenced extent of a track (transitions take no time).
    fn track_extent(&self, track_item: &Item) -> RationalTime {
        let mut extent = RationalTime::new(0.0, self.sequence_rate(track_item));
        for &child in &track_item.children {
            if let Some(item) = self.item(child) {
                if !item.is_transition() {
                    extent = extent + self.trimmed_range(child).duration();
                }
            }
        }
        extent
    }

    /// Rate a track sequences at: the rate of its first timed child.
    fn sequence_rate(&self, track_item: &Item) -> f64 {
        for &child in &track_item.children {
            if let Some(item) = self.item(child) {
                if !item.is_transition() {
                    let d = self.trimmed_range(child).duration();
                    if d.is_valid() {
                        return d.rate();
                    }
                }
            }
        }
        1.0
    }
}
