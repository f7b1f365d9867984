//! Built-in compilation passes.

pub mod desugar;
pub mod fold;
pub mod inline;
pub mod mapping;
pub mod resources;
pub mod resynth;
pub mod simplify;

pub use desugar::Desugar;
pub use fold::FoldRotations;
pub use inline::{Inline, InlineConfig};
pub use mapping::{ApplyLayout, SteinerMap, SwapMap};
pub use resources::{Resources, estimate};
pub use resynth::ResynthesizeCnots;
pub use simplify::Simplify;
