//! Playhead, zoom and seek state over a flattened graph.
//!
//! The harness owns the graph and replaces it wholesale on load; the
//! composition arena stays with the caller and is only read during the
//! build. Seek and zoom are idempotent state updates with no effect on the
//! indexed tables, so the input-handling path can call them freely.
//!
//! Caller contract after a load (and inside zoom-to-fit): invoke
//! [`set_playhead_limit_from_graph`](TimelineHarness::set_playhead_limit_from_graph),
//! otherwise stale limits keep clamping the playhead to the previous
//! document's range.

use log::info;

use crate::composition::Composition;
use crate::graph::{NodeGraph, NodeId};
use crate::time::{RationalTime, TimeRange};

/// Floor for the zoom scale; time-to-pixel conversion divides by it.
pub const MIN_SCALE: f32 = 0.0001;

/// Navigation state threaded between the indexer and the renderer.
#[derive(Clone, Debug)]
pub struct TimelineHarness {
    graph: NodeGraph,
    /// Current time cursor, always inside `playhead_limit` once seeked.
    pub playhead: RationalTime,
    playhead_limit: TimeRange,
    /// Zoom, in pixels per second. Strictly positive.
    scale: f32,
    pub track_height: f32,
    pub timeline_width: f32,
    /// Snap the playhead to whole frames at its rate.
    pub snap_to_frames: bool,
    scroll_to_playhead: bool,
    selected: NodeId,
}

impl TimelineHarness {
    pub fn new() -> Self {
        Self {
            graph: NodeGraph::empty(),
            playhead: RationalTime::default(),
            playhead_limit: TimeRange::default(),
            scale: 100.0,
            track_height: 30.0,
            timeline_width: 100.0,
            snap_to_frames: true,
            scroll_to_playhead: false,
            selected: NodeId::NULL,
        }
    }

    pub fn graph(&self) -> &NodeGraph {
        &self.graph
    }

    /// Rebuild and swap in the graph for `doc`. Selection is dropped
    /// because node ids do not survive a rebuild. Limits are NOT updated
    /// here; that stays an explicit caller step.
    pub fn load_document(&mut self, doc: &Composition) {
        self.graph = NodeGraph::build(doc);
        self.selected = NodeId::NULL;
        info!("timeline \"{}\" indexed", doc.name());
    }

    /// Drop back to the no-document state (the load-failure path).
    pub fn clear(&mut self) {
        self.graph = NodeGraph::empty();
        self.selected = NodeId::NULL;
    }

    pub fn playhead_limit(&self) -> TimeRange {
        self.playhead_limit
    }

    /// Recompute the playhead limit from the indexed document range.
    pub fn set_playhead_limit_from_graph(&mut self) {
        self.playhead_limit = self.graph.timeline_time_range();
    }

    /// Move the playhead to `seconds`, clamped into
    /// `[limit.start, limit.end_exclusive)` and converted at the playhead's
    /// native rate. Out-of-range targets clamp silently. Does not request
    /// a scroll by itself.
    pub fn seek(&mut self, seconds: f64) {
        let lower = self.playhead_limit.start_time().to_seconds();
        let upper = self.playhead_limit.end_time_exclusive().to_seconds();
        let clamped = seconds.clamp(lower, upper.max(lower));

        let rate = if self.playhead.is_valid() {
            self.playhead.rate()
        } else {
            self.playhead_limit.duration().rate()
        };
        let mut target = RationalTime::from_seconds(clamped, rate);
        if self.snap_to_frames {
            target = target.round();
        }

        // Half-open range: never land on the exclusive end itself.
        let start = self.playhead_limit.start_time().rescaled_to(rate);
        let end = self.playhead_limit.end_time_exclusive().rescaled_to(rate);
        if target.value() >= end.value() && end.value() > start.value() {
            target = RationalTime::new(end.value() - 1.0, rate);
            if self.snap_to_frames {
                target = target.floor();
            }
        }
        if target.value() < start.value() {
            target = start;
        }
        self.playhead = target;
    }

    /// Re-round the playhead to its nearest whole frame (the snap toggle
    /// applies it immediately).
    pub fn snap_playhead(&mut self) {
        if self.snap_to_frames {
            self.playhead = self.playhead.round();
        }
    }

    /// Adopt the limit's rate when a load changed document rates, keeping
    /// the same instant (re-snapped when enabled).
    pub fn rescale_playhead(&mut self) {
        let rate = self.playhead_limit.duration().rate();
        if rate > 0.0 && self.playhead.rate() != rate {
            self.playhead = self.playhead.rescaled_to(rate);
            self.snap_playhead();
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Set the zoom scale; values at or below zero clamp to the floor so
    /// time/pixel conversion never divides by zero.
    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale.max(MIN_SCALE);
    }

    /// Re-detect limits, then pick the scale that shows the whole document
    /// inside `timeline_width`.
    pub fn zoom_to_fit(&mut self) {
        self.set_playhead_limit_from_graph();
        let seconds = self.playhead_limit.duration().to_seconds();
        if seconds > 0.0 {
            self.set_scale(self.timeline_width / seconds as f32);
        } else {
            self.set_scale(MIN_SCALE);
        }
    }

    /// Ask the next render pass to recenter on the playhead.
    pub fn request_scroll_to_playhead(&mut self) {
        self.scroll_to_playhead = true;
    }

    /// One-shot consumption by the render pass: returns the flag and
    /// clears it so it can never leak into a following frame.
    pub fn take_scroll_to_playhead(&mut self) -> bool {
        std::mem::take(&mut self.scroll_to_playhead)
    }

    pub fn selected(&self) -> NodeId {
        self.selected
    }

    pub fn select(&mut self, node: NodeId) {
        self.selected = node;
    }
}

impl Default for TimelineHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{Item, ItemKind, TRACK_KIND_VIDEO};

    fn doc_5s() -> Composition {
        let mut doc = Composition::new("doc");
        let v1 = doc.add_track("V1", TRACK_KIND_VIDEO);
        doc.add_item(
            v1,
            Item::new("a", ItemKind::Clip { media: None }).with_source_range(TimeRange::new(
                RationalTime::new(0.0, 24.0),
                RationalTime::new(120.0, 24.0),
            )),
        );
        doc
    }

    fn loaded_harness() -> TimelineHarness {
        let _ = env_logger::builder().is_test(true).try_init();
        let doc = doc_5s();
        let mut h = TimelineHarness::new();
        h.load_document(&doc);
        h.set_playhead_limit_from_graph();
        h.rescale_playhead();
        h
    }

    #[test]
    fn test_seek_clamps_below_start() {
        let mut h = loaded_harness();
        h.seek(-10.0);
        assert_eq!(h.playhead, RationalTime::new(0.0, 24.0));
    }

    #[test]
    fn test_seek_stays_short_of_exclusive_end() {
        let mut h = loaded_harness();
        h.seek(100.0);
        assert_eq!(h.playhead, RationalTime::new(119.0, 24.0));
        assert!(h.playhead < h.playhead_limit().end_time_exclusive());

        h.seek(5.0); // exactly the exclusive end
        assert_eq!(h.playhead, RationalTime::new(119.0, 24.0));
    }

    #[test]
    fn test_seek_snaps_to_nearest_frame() {
        let mut h = loaded_harness();
        h.seek(1.49);
        // round(1.49 * 24) / 24
        assert_eq!(h.playhead, RationalTime::new(36.0, 24.0));
    }

    #[test]
    fn test_seek_without_snap_keeps_fraction() {
        let mut h = loaded_harness();
        h.snap_to_frames = false;
        h.seek(1.49);
        assert!((h.playhead.to_seconds() - 1.49).abs() < 1e-9);
    }

    #[test]
    fn test_snap_toggle_applies_immediately() {
        let mut h = loaded_harness();
        h.snap_to_frames = false;
        h.seek(1.49);
        h.snap_to_frames = true;
        h.snap_playhead();
        assert_eq!(h.playhead, RationalTime::new(36.0, 24.0));
    }

    #[test]
    fn test_scale_never_reaches_zero() {
        let mut h = TimelineHarness::new();
        h.set_scale(-5.0);
        assert_eq!(h.scale(), MIN_SCALE);
        h.set_scale(0.0);
        assert_eq!(h.scale(), MIN_SCALE);
        h.set_scale(250.0);
        assert_eq!(h.scale(), 250.0);
    }

    #[test]
    fn test_zoom_to_fit_redetects_limits_and_scale() {
        let mut h = loaded_harness();
        h.timeline_width = 500.0;
        h.zoom_to_fit();
        assert_eq!(h.scale(), 100.0); // 500 px over 5 seconds
        assert_eq!(
            h.playhead_limit().duration(),
            RationalTime::new(120.0, 24.0)
        );
    }

    #[test]
    fn test_scroll_to_playhead_is_one_shot() {
        let mut h = TimelineHarness::new();
        assert!(!h.take_scroll_to_playhead());
        h.request_scroll_to_playhead();
        assert!(h.take_scroll_to_playhead());
        // Consumed: must not survive into a following frame.
        assert!(!h.take_scroll_to_playhead());
    }

    #[test]
    fn test_load_resets_selection_and_keeps_limit_stale() {
        let doc = doc_5s();
        let mut h = TimelineHarness::new();
        h.load_document(&doc);
        let track = h.graph().sync_starts(h.graph().root_node())[0];
        h.select(track);
        assert_eq!(h.selected(), track);

        // Reload: selection drops, limit untouched until the caller asks.
        h.load_document(&doc);
        assert!(h.selected().is_null());
        assert_eq!(h.playhead_limit(), TimeRange::default());

        h.set_playhead_limit_from_graph();
        assert_eq!(
            h.playhead_limit().duration(),
            RationalTime::new(120.0, 24.0)
        );
    }

    #[test]
    fn test_clear_returns_to_null_root() {
        let doc = doc_5s();
        let mut h = TimelineHarness::new();
        h.load_document(&doc);
        assert!(!h.graph().root_node().is_null());
        h.clear();
        assert!(h.graph().root_node().is_null());
    }

    #[test]
    fn test_rescale_adopts_limit_rate() {
        let mut h = loaded_harness();
        assert_eq!(h.playhead.rate(), 24.0);
        h.seek(2.0);
        assert_eq!(h.playhead.value(), 48.0);
    }

    #[test]
    fn test_seek_with_empty_limit_pins_to_start() {
        let mut h = TimelineHarness::new();
        h.seek(3.0);
        assert_eq!(h.playhead.to_seconds(), 0.0);
    }
}
