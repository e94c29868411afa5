use crate::pipeline::EngineState;

/// A message popped off the engine's bus, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineMessage {
    StateChanged {
        old: EngineState,
        new: EngineState,
        /// False when the change was reported by a child element rather than
        /// the top-level pipeline.
        from_pipeline: bool,
    },
    DurationChanged,
    EndOfStream,
    Error {
        message: String,
        debug: Option<String>,
    },
    Warning {
        message: String,
    },
    /// Anything the player has no use for (buffering, tags, clock, ...).
    Other(String),
}
