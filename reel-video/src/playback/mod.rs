//! Playback module
//!
//! Timed presentation of a loaded frame sequence:
//! - The play/stop state machine
//! - The scheduler task that owns it and drives the frame timer
//! - The render consumer boundary
//! - Sessions tying assembly to the scheduler

pub mod consumer;
pub mod scheduler;
pub mod session;
pub mod state;

pub use consumer::{FrameUpdate, RenderConsumer};
pub use scheduler::{
    Centering, LoadOutcome, LoadTicket, PlaybackScheduler, SchedulerConfig, SchedulerHandle,
};
pub use session::{LoadError, PlaybackSession};
pub use state::{Playback, PlaybackError, PlaybackPhase, PlaybackState};
