use crate::pipeline::{EngineMessage, EngineState, PipelineFacade};
use crate::player::StateSynchronizer;

/// Internal event kinds the synchronizer reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    StateChanged(EngineState, EngineState),
    DurationInvalidated,
    EndOfStream,
    FatalError(String),
}

/// Drains the engine's event channel once per tick and hands each event to
/// the synchronizer in arrival order. Holds no state of its own.
pub struct MessagePump;

impl MessagePump {
    /// Returns how many events were dispatched.
    pub fn pump<P: PipelineFacade>(sync: &mut StateSynchronizer<P>) -> usize {
        let mut dispatched = 0;
        for message in sync.drain_engine_messages() {
            if let Some(event) = Self::classify(message) {
                sync.apply_event(event);
                dispatched += 1;
            }
        }
        dispatched
    }

    /// `None` for messages the player ignores.
    pub fn classify(message: EngineMessage) -> Option<PlayerEvent> {
        match message {
            EngineMessage::StateChanged { old, new, from_pipeline: true } => {
                Some(PlayerEvent::StateChanged(old, new))
            }
            EngineMessage::StateChanged { .. } => None,
            EngineMessage::DurationChanged => Some(PlayerEvent::DurationInvalidated),
            EngineMessage::EndOfStream => Some(PlayerEvent::EndOfStream),
            EngineMessage::Error { message, debug } => {
                if let Some(debug) = debug {
                    log::error!("Debugging information: {}", debug);
                }
                Some(PlayerEvent::FatalError(message))
            }
            EngineMessage::Warning { message } => {
                log::warn!("Pipeline warning: {}", message);
                None
            }
            EngineMessage::Other(kind) => {
                log::trace!("Ignoring {} message", kind);
                None
            }
        }
    }
}
