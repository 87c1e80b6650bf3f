//! Context Pipeline: chunks, prioritizes, and condenses heterogeneous input
//! into one or more blocks that fit a provider's context window (§4.5).

pub mod chunk;
pub mod condense;
pub mod inputs;
pub mod multi_turn;
pub mod pipeline;
pub mod strategy;
pub mod tokens;

pub use chunk::{Chunk, ChunkKind};
pub use inputs::{CodebaseOverview, ContextInputs};
pub use multi_turn::Turn;
pub use pipeline::{BuiltContext, build_chunks, build_context, is_preserved_verbatim};
pub use strategy::ContextStrategy;
pub use tokens::estimate_tokens;
