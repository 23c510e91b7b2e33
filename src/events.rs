use std::sync::mpsc::{self, Receiver, Sender};

#[allow(unused_imports)]
use log::{debug, info, warn, error};

/// Host-facing carousel events, drained with `CarouselRenderer::take_events`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverFlowEvent {
    /// The centered tile changed (fires once per change, and once for the
    /// initial tile after the first frame).
    TileCentered(usize),
    /// The user tapped the centered tile.
    TileTapped(usize),
}

/// Why the host should produce a frame. Rendering is on-demand: no request,
/// no frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepaintRequest {
    /// Redraw (touch move, selection change, centered transition).
    Frame,
    /// An async load finished for this tile; redraw if it is visible.
    Tile(usize),
    /// Drive the momentum animation one step. The payload is the animation
    /// generation; stale steps are ignored.
    AnimationStep(u64),
}

/// Cloneable sender half of the repaint channel. The gesture controller
/// and load completions post through this; the host owns the receiver and
/// feeds each request back into `CarouselRenderer::update`.
#[derive(Debug, Clone)]
pub struct RepaintHandle {
    sender: Sender<RepaintRequest>,
}

impl RepaintHandle {
    /// Create the channel; the receiver side belongs to the host's loop.
    pub fn channel() -> (RepaintHandle, Receiver<RepaintRequest>) {
        let (sender, receiver) = mpsc::channel();
        (RepaintHandle { sender }, receiver)
    }

    pub fn request_frame(&self) {
        self.send(RepaintRequest::Frame);
    }

    pub fn request_tile(&self, index: usize) {
        self.send(RepaintRequest::Tile(index));
    }

    pub fn request_animation_step(&self, generation: u64) {
        self.send(RepaintRequest::AnimationStep(generation));
    }

    fn send(&self, request: RepaintRequest) {
        // A dropped receiver just means the host loop is gone; nothing to
        // repaint for anymore.
        if self.sender.send(request).is_err() {
            debug!("RepaintHandle: receiver dropped, ignoring {:?}", request);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repaint_channel_delivers_in_order() {
        let (handle, receiver) = RepaintHandle::channel();
        handle.request_frame();
        handle.request_tile(3);
        handle.request_animation_step(7);

        assert_eq!(receiver.recv().unwrap(), RepaintRequest::Frame);
        assert_eq!(receiver.recv().unwrap(), RepaintRequest::Tile(3));
        assert_eq!(receiver.recv().unwrap(), RepaintRequest::AnimationStep(7));
    }

    #[test]
    fn test_send_after_receiver_dropped_does_not_panic() {
        let (handle, receiver) = RepaintHandle::channel();
        drop(receiver);
        handle.request_frame();
    }
}
