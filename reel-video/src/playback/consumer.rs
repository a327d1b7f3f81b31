//! Render consumer interface: where presented frames go.

use reel_data::Frame;
use tokio::sync::{mpsc, watch};
use tracing::trace;

/// One normalized frame handed to the renderer.
#[derive(Debug, Clone)]
pub struct FrameUpdate {
    /// Index of the frame within its sequence.
    pub index: usize,
    /// Length of the sequence the frame belongs to.
    pub frame_count: usize,
    /// Normalized points, a snapshot independent of the held sequence.
    pub frame: Frame,
}

/// Receives frames from the playback scheduler.
///
/// `present` is called on the scheduler task, so it must not block. Hand the
/// frame off to the render loop and return.
pub trait RenderConsumer: Send + 'static {
    fn present(&mut self, update: FrameUpdate);
}

/// Every presented frame is queued, in order.
impl RenderConsumer for mpsc::UnboundedSender<FrameUpdate> {
    fn present(&mut self, update: FrameUpdate) {
        if self.send(update).is_err() {
            trace!("Render consumer receiver dropped");
        }
    }
}

/// Only the latest frame is kept; a slow render loop skips frames.
impl RenderConsumer for watch::Sender<Option<FrameUpdate>> {
    fn present(&mut self, update: FrameUpdate) {
        self.send_replace(Some(update));
    }
}
