//! Exercise definitions, ordering rules, and the flow that records them

mod definition;
mod flow;
mod sequencer;

pub use definition::ExerciseDefinition;
pub use flow::{ExerciseFlow, FlowError};
pub use sequencer::{Completion, ExerciseSequencer, SequenceError};
