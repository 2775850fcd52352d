//! Capturing live traffic into the in-memory session log

mod recorder;

pub use recorder::InteractionRecorder;
