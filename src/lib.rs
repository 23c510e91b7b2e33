//! A coverflow carousel core: inertial gesture physics, bounded tile
//! virtualization and per-frame draw ordering for image collections.
//!
//! The crate owns the algorithmic middle of a coverflow widget and nothing
//! else. The host supplies the outside world through three seams:
//!
//! - [`surface::DrawSurface`] — texture upload/release and quad drawing on
//!   whatever GPU backend the host runs;
//! - [`provider::ImageProvider`] — decoding, fetching and caching of the
//!   actual images;
//! - a touch source feeding down/move/up events with timestamps.
//!
//! Rendering is on-demand: every state change posts a [`events::RepaintRequest`]
//! on the channel created with [`events::RepaintHandle::channel`], and the
//! host produces a frame only when [`render::CarouselRenderer::update`]
//! says one is needed. Async load completions are marshalled back onto the
//! host's loop the same way; nothing in the core runs on its own thread.

pub mod cache;
pub mod config;
pub mod events;
pub mod gesture;
pub mod loading;
pub mod provider;
pub mod render;
pub mod surface;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::TileCache;
pub use config::{Config, Quality};
pub use events::{CoverFlowEvent, RepaintHandle, RepaintRequest};
pub use gesture::GestureController;
pub use loading::LoadReply;
pub use provider::{letterbox_to_square, Fetch, ImageProvider};
pub use render::{CarouselRenderer, LoadOutcome, TileResource};
pub use surface::{DrawSurface, Quad, TextureId};
