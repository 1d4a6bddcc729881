//! Model-agnostic interpretation.
//!
//! Two methods are available per input slot: leave-one-out scoring over the
//! neighbors a component proposes, and Shapley attribution over the units a
//! component decomposes into. Both treat the wrapped function as a black box.

pub mod distance;
mod engine;
pub mod scores;
pub mod shapley;

pub use distance::{coalition_value, quantify_difference};
pub use engine::{CustomInterpreter, Interface, Interpretation, InterpretationMethod};
pub use scores::SlotScores;
