//! Composition items: the closed variant the flattening pass switches over.
//!
//! Clip/Gap/Transition/Track/Stack are one tagged enum rather than a
//! dynamic type hierarchy, so kind dispatch is exhaustive and checked at
//! compile time. Effects and markers ride along as plain payload on the
//! item; they are not addressable timeline elements of their own.

use serde::{Deserialize, Serialize};

use crate::time::{RationalTime, TimeRange};

pub const TRACK_KIND_VIDEO: &str = "Video";
pub const TRACK_KIND_AUDIO: &str = "Audio";

/// Arena index of an item inside a [`Composition`](crate::Composition).
///
/// Stable for the lifetime of one loaded document; this is what
/// `stationary_id` is derived from.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct ItemId(pub(crate) u32);

impl ItemId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What an item is. Transitions carry their overlap split; tracks carry
/// their audio/video kind string.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ItemKind {
    Clip {
        /// Media reference target, when the document names one.
        media: Option<String>,
    },
    Gap,
    Transition {
        in_offset: RationalTime,
        out_offset: RationalTime,
    },
    Track {
        kind: String,
    },
    Stack,
}

/// Per-item effect. Only linear time warps affect time arithmetic; any
/// other schema is kept by name for inspection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Effect {
    LinearTimeWarp { time_scalar: f64 },
    Other { effect_name: String },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Marker {
    pub name: String,
    pub color: String,
    pub marked_range: TimeRange,
}

/// One element of the composition tree.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub kind: ItemKind,
    /// Trim applied to the item's own content, in its local space.
    pub source_range: Option<TimeRange>,
    pub effects: Vec<Effect>,
    pub markers: Vec<Marker>,
    pub(crate) children: Vec<ItemId>,
    pub(crate) parent: Option<ItemId>,
}

impl Item {
    pub fn new(name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            name: name.into(),
            kind,
            source_range: None,
            effects: Vec::new(),
            markers: Vec::new(),
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn with_source_range(mut self, range: TimeRange) -> Self {
        self.source_range = Some(range);
        self
    }

    pub fn children(&self) -> &[ItemId] {
        &self.children
    }

    /// Aggregate warp applied by this item's effects: the product of every
    /// linear time-warp scalar, not just the first one found.
    pub fn time_scalar(&self) -> f64 {
        let mut time_scalar = 1.0;
        for effect in &self.effects {
            if let Effect::LinearTimeWarp { time_scalar: s } = effect {
                time_scalar *= s;
            }
        }
        time_scalar
    }

    /// Tracks and stacks contain other items; everything else is a leaf.
    pub fn is_composition(&self) -> bool {
        matches!(self.kind, ItemKind::Track { .. } | ItemKind::Stack)
    }

    pub fn is_transition(&self) -> bool {
        matches!(self.kind, ItemKind::Transition { .. })
    }
}
