//! Event dispatcher implementations

mod broadcast;
mod recording;

pub use broadcast::BroadcastEventDispatcher;
pub use recording::RecordingEventDispatcher;
