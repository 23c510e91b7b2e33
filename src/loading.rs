use std::io;
use std::sync::mpsc::{self, Receiver, Sender};

use image::RgbaImage;

#[allow(unused_imports)]
use log::{debug, info, warn, error};

use crate::events::RepaintHandle;

/// Outcome of one asynchronous image fetch, delivered back to the UI
/// context through the load channel.
#[derive(Debug)]
pub struct LoadEvent {
    pub index: usize,
    pub result: Result<RgbaImage, io::Error>,
}

/// Completion handle given to the image provider for one tile fetch.
///
/// The provider's worker may call `complete` from any thread: the decoded
/// image travels over a channel and the UI context is woken with a
/// tile-scoped repaint request. No renderer state is touched here — the
/// receiving side applies the result on the UI context.
#[derive(Debug, Clone)]
pub struct LoadReply {
    index: usize,
    sender: Sender<LoadEvent>,
    repaint: RepaintHandle,
}

impl LoadReply {
    pub(crate) fn new(index: usize, sender: Sender<LoadEvent>, repaint: RepaintHandle) -> Self {
        Self { index, sender, repaint }
    }

    /// The tile index this reply is scoped to.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Deliver the decoded image (or the failure) for this tile.
    pub fn complete(self, result: Result<RgbaImage, io::Error>) {
        let index = self.index;
        if self.sender.send(LoadEvent { index, result }).is_err() {
            // Renderer dropped; the image has nowhere to go.
            debug!("LoadReply: load channel closed, dropping result for tile {}", index);
            return;
        }
        self.repaint.request_tile(index);
    }
}

/// Creates the load channel pair; the receiver is drained by the renderer
/// on the UI context before it decides whether to repaint.
pub(crate) fn load_channel() -> (Sender<LoadEvent>, Receiver<LoadEvent>) {
    mpsc::channel()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{RepaintHandle, RepaintRequest};

    #[test]
    fn test_complete_sends_payload_then_wakeup() {
        let (repaint, wakeups) = RepaintHandle::channel();
        let (sender, events) = load_channel();

        let reply = LoadReply::new(4, sender, repaint);
        reply.complete(Ok(RgbaImage::new(2, 2)));

        let event = events.recv().unwrap();
        assert_eq!(event.index, 4);
        assert!(event.result.is_ok());
        assert_eq!(wakeups.recv().unwrap(), RepaintRequest::Tile(4));
    }

    #[test]
    fn test_complete_from_worker_thread() {
        let (repaint, wakeups) = RepaintHandle::channel();
        let (sender, events) = load_channel();
        let reply = LoadReply::new(9, sender, repaint);

        std::thread::spawn(move || {
            reply.complete(Err(io::Error::new(io::ErrorKind::Other, "decode failed")));
        })
        .join()
        .unwrap();

        let event = events.recv().unwrap();
        assert_eq!(event.index, 9);
        assert!(event.result.is_err());
        assert_eq!(wakeups.recv().unwrap(), RepaintRequest::Tile(9));
    }

    #[test]
    fn test_complete_with_closed_channel_does_not_panic() {
        let (repaint, _wakeups) = RepaintHandle::channel();
        let (sender, events) = load_channel();
        drop(events);

        let reply = LoadReply::new(0, sender, repaint);
        reply.complete(Ok(RgbaImage::new(1, 1)));
    }
}
