pub mod break_resolver;
pub mod caret;
pub mod cluster_map;
pub mod collection;
pub mod composed_line;
pub mod frame;
pub mod line_resolver;
pub mod run;
pub mod typesetter;

mod shape_resolver;
mod token;

pub use break_resolver::BreakMode;
pub use caret::{CaretEdges, CaretEdgesBuilder};
pub use cluster_map::ClusterMap;
pub use collection::{ParagraphCollection, RunCollection};
pub use composed_line::{ComposedLine, GlyphRun};
pub use frame::{CancellationToken, ComposedFrame, FrameResolver, TextAlignment};
pub use line_resolver::TruncationPlace;
pub use run::{IntrinsicRun, JustifiedRun, ReplacementRun, RunSlice, TextRun};
pub use typesetter::Typesetter;
