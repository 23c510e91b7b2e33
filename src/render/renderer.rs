use std::sync::mpsc::{Receiver, Sender};
use std::time::Instant;

use image::RgbaImage;

#[allow(unused_imports)]
use log::{debug, info, warn, error};

use crate::cache::TileCache;
use crate::config::Config;
use crate::events::{CoverFlowEvent, RepaintHandle, RepaintRequest};
use crate::gesture::GestureController;
use crate::loading::{load_channel, LoadEvent, LoadReply};
use crate::provider::ImageProvider;
use crate::render::resource::{
    BackgroundResource, CoverResource, LoadOutcome, PlaceholderResource, TileResource,
};
use crate::surface::DrawSurface;

/// Per-frame orchestrator: resolves the visible tile window, keeps the tile
/// cache warm, issues draw calls in stacking order and reports carousel
/// events to the host.
///
/// Rendering is on-demand. The host forwards each `RepaintRequest` from the
/// repaint channel into `update`; when that returns true it produces one
/// frame with `draw_frame`. Nothing here runs on a clock.
pub struct CarouselRenderer {
    config: Config,
    items: Vec<String>,
    cache: TileCache,
    controller: GestureController,
    placeholder: PlaceholderResource,
    background: Option<BackgroundResource>,
    provider: Box<dyn ImageProvider>,
    repaint: RepaintHandle,
    load_sender: Sender<LoadEvent>,
    load_receiver: Receiver<LoadEvent>,
    events: Vec<CoverFlowEvent>,
    last_centered: Option<usize>,
    viewport_width: f32,
    viewport_height: f32,
    // Item list changed while no surface was in scope; clear before the
    // next draw.
    pending_clear: bool,
}

impl CarouselRenderer {
    pub fn new(config: Config, provider: Box<dyn ImageProvider>, repaint: RepaintHandle) -> Self {
        let (load_sender, load_receiver) = load_channel();
        let placeholder = PlaceholderResource::new(config.image_size());
        let cache = TileCache::new(config.max_tiles);
        let controller = GestureController::new(repaint.clone());

        Self {
            config,
            items: Vec::new(),
            cache,
            controller,
            placeholder,
            background: None,
            provider,
            repaint,
            load_sender,
            load_receiver,
            events: Vec::new(),
            last_centered: None,
            viewport_width: 0.0,
            viewport_height: 0.0,
            pending_clear: false,
        }
    }

    pub fn offset(&self) -> f32 {
        self.controller.offset()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn is_animating(&self) -> bool {
        self.controller.is_animating()
    }

    /// Replace the tile list. Cancels any animation, clamps the offset and
    /// schedules a cache clear for the next draw.
    pub fn set_items(&mut self, items: Vec<String>) {
        info!("CarouselRenderer: set_items ({} tiles)", items.len());
        self.items = items;
        self.controller.set_item_count(self.items.len());
        self.last_centered = None;
        self.pending_clear = true;
        self.repaint.request_frame();
    }

    /// Jump to a tile immediately. Out-of-range indices clamp; a running
    /// animation is cancelled deterministically.
    pub fn set_selection(&mut self, index: usize) {
        self.controller.jump_to(index);
        self.repaint.request_frame();
    }

    /// Image drawn in place of tiles that are not ready yet.
    pub fn set_placeholder_image(&mut self, image: RgbaImage) {
        self.placeholder.set_image(image);
        self.repaint.request_frame();
    }

    /// Optional full-viewport backdrop, drawn beneath all tiles.
    pub fn set_background_image(&mut self, image: RgbaImage) {
        self.background = Some(BackgroundResource::new(image));
        self.repaint.request_frame();
    }

    /// The rendering surface was created, resized or recreated. All cached
    /// textures are released (their geometry is baked against the old
    /// viewport) and everything reloads lazily on the next draw.
    pub fn surface_changed(&mut self, surface: &mut dyn DrawSurface, width: u32, height: u32) {
        info!("CarouselRenderer: surface changed to {}x{}", width, height);
        self.viewport_width = width as f32;
        self.viewport_height = height as f32;
        self.controller.set_viewport(self.viewport_width, self.viewport_height);

        self.cache.clear(surface);
        self.pending_clear = false;
        self.placeholder.release(surface);
        if let Some(background) = self.background.as_mut() {
            background.release(surface);
        }
        self.repaint.request_frame();
    }

    pub fn touch_began(&mut self, x: f32, y: f32, timestamp: Instant) {
        self.controller.touch_began(x, y, timestamp);
    }

    pub fn touch_moved(&mut self, x: f32, y: f32, timestamp: Instant) {
        self.controller.touch_moved(x, y, timestamp);
    }

    pub fn touch_ended(&mut self, x: f32, y: f32, timestamp: Instant) {
        if let Some(index) = self.controller.touch_ended(x, y, timestamp) {
            debug!("CarouselRenderer: tile {} tapped", index);
            self.events.push(CoverFlowEvent::TileTapped(index));
        }
    }

    /// Process one repaint request; returns whether a frame should be
    /// drawn. Load completions are applied here (on the UI context) and
    /// only repaint when the finished tile is inside the visible window.
    pub fn update(&mut self, request: RepaintRequest, now: Instant) -> bool {
        match request {
            RepaintRequest::Frame => true,
            RepaintRequest::AnimationStep(generation) => {
                self.controller.animation_step(generation, now)
            }
            RepaintRequest::Tile(index) => {
                self.drain_loads();
                self.is_tile_visible(index)
            }
        }
    }

    /// Draw one frame: background, then the visible window with the
    /// centered tile last.
    pub fn draw_frame(&mut self, surface: &mut dyn DrawSurface) {
        if self.pending_clear {
            self.cache.clear(surface);
            self.pending_clear = false;
        }
        self.drain_loads();

        let (vw, vh) = (self.viewport_width, self.viewport_height);
        if let Some(background) = self.background.as_mut() {
            background.ensure_texture(surface, vw, vh);
            background.draw(surface, 0.0, 0.0);
        }

        if self.items.is_empty() {
            return;
        }
        self.placeholder.ensure_texture(surface, vw, vh);

        let offset = self.controller.offset();
        let visible = self.config.visible_tiles;
        let mid = offset.round() as usize;
        let start = mid.saturating_sub(visible);
        let end = (mid + visible).min(self.items.len() - 1);

        // Left side ascending, then right side descending down to the
        // center: nearer tiles draw later, the centered tile draws last.
        for index in start..mid {
            self.draw_tile(index, offset, surface);
        }
        for index in (mid..=end).rev() {
            self.draw_tile(index, offset, surface);
        }

        if self.last_centered != Some(mid) {
            self.events.push(CoverFlowEvent::TileCentered(mid));
            self.last_centered = Some(mid);
        }
    }

    /// Re-request a tile that previously failed. No-op for tiles that are
    /// loaded, in flight, or outside the cache.
    pub fn reload_tile(&mut self, index: usize) {
        let Some(resource) = self.cache.get(index) else {
            return;
        };
        if !resource.is_failed() {
            return;
        }
        resource.reset_for_reload();
        let reply = LoadReply::new(index, self.load_sender.clone(), self.repaint.clone());
        match resource.begin_load(&mut *self.provider, reply) {
            LoadOutcome::Failed => warn!("CarouselRenderer: reload of tile {} failed", index),
            _ => self.repaint.request_tile(index),
        }
    }

    /// Drain events accumulated since the last call (taps, centered-tile
    /// changes).
    pub fn take_events(&mut self) -> Vec<CoverFlowEvent> {
        std::mem::take(&mut self.events)
    }

    fn draw_tile(&mut self, index: usize, offset: f32, surface: &mut dyn DrawSurface) {
        if !self.cache.contains(index) {
            let Some(url) = self.items.get(index) else {
                return;
            };
            let mut resource =
                CoverResource::new(url.clone(), self.config.image_size(), self.config.show_black_bars);
            let reply = LoadReply::new(index, self.load_sender.clone(), self.repaint.clone());
            // Admit the entry even while the fetch is pending so repeated
            // misses in this frame cannot re-request.
            resource.begin_load(&mut *self.provider, reply);
            self.cache.put(index, resource, surface);
        }

        let (vw, vh) = (self.viewport_width, self.viewport_height);
        let Some(resource) = self.cache.get(index) else {
            return;
        };
        resource.ensure_texture(surface, vw, vh);

        let ready = resource.is_ready();
        let size = if ready {
            resource.desired_size()
        } else {
            self.placeholder.desired_size()
        };
        let spread = (vw - size) * 0.5 / self.config.visible_tiles as f32;
        let translate = (index as f32 - offset) * spread;
        let scale = 1.0 - (index as f32 - offset).abs() / (self.config.visible_tiles as f32 + 1.0);

        if ready {
            resource.draw(surface, translate, scale);
        } else {
            self.placeholder.draw(surface, translate, scale);
        }
    }

    fn drain_loads(&mut self) {
        for event in self.load_receiver.try_iter() {
            match self.cache.get(event.index) {
                Some(resource) => resource.finish_load(event.result),
                // Evicted while the fetch was in flight; the image has no
                // slot to land in.
                None => debug!("CarouselRenderer: dropping load result for evicted tile {}", event.index),
            }
        }
    }

    fn is_tile_visible(&self, index: usize) -> bool {
        let offset = self.controller.offset();
        let visible = self.config.visible_tiles as f32;
        let index = index as f32;
        offset - visible <= index && index <= offset + visible
    }
}
