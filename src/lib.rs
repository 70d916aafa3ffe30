//! Batch image variation generator.
//!
//! One source image goes in; for every variation index a worker draws the
//! configured text overlays onto a copy, runs the compiled operation steps
//! against it, and writes the baseline plus one PNG per step.

#![forbid(unsafe_code)]

pub mod batch;
pub mod content;
pub mod error;
pub mod filters;
pub mod model;
pub mod ops;
pub mod overlay;
pub mod pipeline;

pub use batch::{BatchOpts, BatchStats, run_batch};
pub use error::{ImprintError, ImprintResult};
pub use model::{
    BatchSpec, Bounds, FixedContent, FromFileContent, FromRegexContent, TextSpec, VariationStep,
};
pub use ops::{CompiledStep, Operation, Registry};
pub use pipeline::Variation;
