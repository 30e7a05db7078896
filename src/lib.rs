//! weft - flattened timeline graph and playhead navigation for
//! hierarchical editorial compositions.
//!
//! A loaded document (tracks holding clips, gaps and transitions, with
//! effects and markers riding along) is flattened in one pass into a
//! [`NodeGraph`]: a flat table set in a single document time coordinate
//! space, cheap enough to query on every rendered frame. The
//! [`TimelineHarness`] carries the playhead/zoom/seek state a renderer
//! drives through its input events.
//!
//! Typical wiring:
//!
//! ```no_run
//! use weft::{document, TimelineHarness};
//!
//! let mut harness = TimelineHarness::new();
//! match document::from_json_file("cut.otio") {
//!     Ok(doc) => {
//!         harness.load_document(&doc);
//!         harness.set_playhead_limit_from_graph();
//!         harness.rescale_playhead();
//!     }
//!     Err(err) => {
//!         eprintln!("{err}");
//!         harness.clear();
//!     }
//! }
//! ```

pub mod composition;
pub mod document;
pub mod graph;
pub mod harness;
pub mod item;
pub mod query;
pub mod time;

pub use composition::Composition;
pub use document::LoadError;
pub use graph::{NodeGraph, NodeId, NodeKind};
pub use harness::{MIN_SCALE, TimelineHarness};
pub use item::{Effect, Item, ItemId, ItemKind, Marker};
pub use time::{RationalTime, TimeRange};
