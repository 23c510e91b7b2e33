use std::io;

use image::RgbaImage;
use once_cell::sync::Lazy;

#[allow(unused_imports)]
use log::{debug, info, warn, error};

use crate::loading::LoadReply;
use crate::provider::{Fetch, ImageProvider};
use crate::surface::{DrawSurface, Quad, TextureId};

/// Shared fallback for a placeholder when the host never supplied one.
static FALLBACK_PIXEL: Lazy<RgbaImage> = Lazy::new(|| RgbaImage::new(1, 1));

/// Result of kicking off a tile load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The provider had the image cached; it will draw on the next frame.
    Ready,
    /// The fetch was dispatched; completion arrives through the load channel.
    Pending,
    /// The fetch failed synchronously.
    Failed,
}

/// Tile image lifecycle. The texture upload is deferred to the draw pass,
/// where a surface is in scope.
#[derive(Debug)]
enum LoadState {
    Unloaded,
    Pending,
    Decoded(RgbaImage),
    Ready,
    Failed,
}

/// Quad placement baked once per texture upload: the square edge length a
/// tile occupies on screen, inset 10% from the viewport fit.
#[derive(Debug, Clone, Copy)]
struct QuadGeometry {
    desired_size: f32,
    viewport_width: f32,
    viewport_height: f32,
    baked: bool,
}

impl QuadGeometry {
    fn new() -> Self {
        Self {
            desired_size: 0.0,
            viewport_width: 0.0,
            viewport_height: 0.0,
            baked: false,
        }
    }

    fn bake(&mut self, image_size: u32, viewport_width: f32, viewport_height: f32) {
        let sx = (viewport_width / image_size as f32).abs();
        let sy = (viewport_height / image_size as f32).abs();
        let fit = sx.min(sy);

        let mut desired = image_size as f32 * fit;
        desired -= desired * 0.1; // inset from the edge of the screen

        self.desired_size = desired;
        self.viewport_width = viewport_width;
        self.viewport_height = viewport_height;
        self.baked = true;
    }

    /// Screen rectangle for this tile at `translate` offset and `scale`.
    /// The shift terms crowd the receding side toward the center, which is
    /// what produces the parallax stacking.
    fn quad(&self, translate: f32, scale: f32) -> Quad {
        let d = self.desired_size;
        let shift_y = (d - d * scale) * 0.5;
        let shift_x = if translate > 0.0 { d - d * scale } else { 0.0 };

        Quad {
            x: self.viewport_width * 0.5 - d * 0.5 + translate + shift_x,
            y: self.viewport_height * 0.5 - d * 0.5 + shift_y,
            width: d * scale,
            height: d * scale,
        }
    }
}

/// The one drawable capability every carousel resource implements:
/// a cover tile, the shared placeholder, or the background layer.
pub trait TileResource {
    fn desired_size(&self) -> f32;

    /// Draw at the given transform. Must be a no-op until the texture is
    /// uploaded and the geometry baked, so callers can invoke it
    /// speculatively every frame.
    fn draw(&self, surface: &mut dyn DrawSurface, translate: f32, scale: f32);

    /// Release the GPU texture. Idempotent.
    fn release(&mut self, surface: &mut dyn DrawSurface);
}

/// One carousel tile: a URL, at most one GPU texture, and the load state
/// in between.
#[derive(Debug)]
pub struct CoverResource {
    url: String,
    image_size: u32,
    show_black_bars: bool,
    state: LoadState,
    texture: Option<TextureId>,
    geometry: QuadGeometry,
}

impl CoverResource {
    pub fn new(url: impl Into<String>, image_size: u32, show_black_bars: bool) -> Self {
        Self {
            url: url.into(),
            image_size,
            show_black_bars,
            state: LoadState::Unloaded,
            texture: None,
            geometry: QuadGeometry::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Ask the provider for this tile's image. A provider cache hit means
    /// the tile draws on the next frame; otherwise the completion comes in
    /// through `finish_load` on the UI context.
    pub fn begin_load(
        &mut self,
        provider: &mut dyn ImageProvider,
        reply: LoadReply,
    ) -> LoadOutcome {
        match provider.fetch(&self.url, self.image_size, self.show_black_bars, reply) {
            Fetch::Cached(image) => {
                debug!("CoverResource: provider cache hit for {}", self.url);
                self.state = LoadState::Decoded(image);
                LoadOutcome::Ready
            }
            Fetch::Pending => {
                self.state = LoadState::Pending;
                LoadOutcome::Pending
            }
        }
    }

    /// Apply an async load result. UI context only.
    pub fn finish_load(&mut self, result: Result<RgbaImage, io::Error>) {
        match result {
            Ok(image) => {
                self.state = LoadState::Decoded(image);
            }
            Err(err) => {
                warn!("CoverResource: load failed for {}: {}", self.url, err);
                self.state = LoadState::Failed;
            }
        }
    }

    /// Upload a decoded image if one is waiting. Called from the draw pass.
    pub fn ensure_texture(
        &mut self,
        surface: &mut dyn DrawSurface,
        viewport_width: f32,
        viewport_height: f32,
    ) {
        if !matches!(self.state, LoadState::Decoded(_)) {
            return;
        }

        // A reload may race a still-live texture; retire it first.
        if let Some(texture) = self.texture.take() {
            surface.release_texture(texture);
        }

        let state = std::mem::replace(&mut self.state, LoadState::Ready);
        if let LoadState::Decoded(image) = state {
            self.texture = Some(surface.upload_texture(&image));
            self.geometry.bake(self.image_size, viewport_width, viewport_height);
        }
    }

    /// Ready to draw: texture uploaded and geometry baked.
    pub fn is_ready(&self) -> bool {
        self.texture.is_some() && self.geometry.baked
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, LoadState::Pending)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, LoadState::Failed)
    }

    /// Forget the failure so the next `begin_load` can retry.
    pub fn reset_for_reload(&mut self) {
        if matches!(self.state, LoadState::Failed) {
            self.state = LoadState::Unloaded;
        }
    }
}

impl TileResource for CoverResource {
    fn desired_size(&self) -> f32 {
        self.geometry.desired_size
    }

    fn draw(&self, surface: &mut dyn DrawSurface, translate: f32, scale: f32) {
        let texture = match self.texture {
            Some(texture) => texture,
            None => return,
        };
        if !self.geometry.baked {
            return;
        }
        surface.draw_quad(texture, self.geometry.quad(translate, scale));
    }

    fn release(&mut self, surface: &mut dyn DrawSurface) {
        if let Some(texture) = self.texture.take() {
            surface.release_texture(texture);
        }
        self.geometry.baked = false;
        if matches!(self.state, LoadState::Ready) {
            self.state = LoadState::Unloaded;
        }
    }
}

/// Shared stand-in drawn for any tile whose image is not ready yet (or
/// failed). Same quad math as a cover, host-supplied image or a built-in
/// transparent pixel.
#[derive(Debug)]
pub struct PlaceholderResource {
    image: RgbaImage,
    image_size: u32,
    texture: Option<TextureId>,
    geometry: QuadGeometry,
}

impl PlaceholderResource {
    pub fn new(image_size: u32) -> Self {
        Self {
            image: FALLBACK_PIXEL.clone(),
            image_size,
            texture: None,
            geometry: QuadGeometry::new(),
        }
    }

    /// Replace the placeholder image; the texture re-uploads on next draw.
    pub fn set_image(&mut self, image: RgbaImage) {
        self.image = image;
        self.geometry.baked = false;
        // Old texture is released lazily by ensure_texture.
    }

    pub fn ensure_texture(
        &mut self,
        surface: &mut dyn DrawSurface,
        viewport_width: f32,
        viewport_height: f32,
    ) {
        if self.texture.is_some() && self.geometry.baked {
            return;
        }
        if let Some(texture) = self.texture.take() {
            surface.release_texture(texture);
        }
        self.texture = Some(surface.upload_texture(&self.image));
        self.geometry.bake(self.image_size, viewport_width, viewport_height);
    }
}

impl TileResource for PlaceholderResource {
    fn desired_size(&self) -> f32 {
        self.geometry.desired_size
    }

    fn draw(&self, surface: &mut dyn DrawSurface, translate: f32, scale: f32) {
        let texture = match self.texture {
            Some(texture) => texture,
            None => return,
        };
        if !self.geometry.baked {
            return;
        }
        surface.draw_quad(texture, self.geometry.quad(translate, scale));
    }

    fn release(&mut self, surface: &mut dyn DrawSurface) {
        if let Some(texture) = self.texture.take() {
            surface.release_texture(texture);
        }
        self.geometry.baked = false;
    }
}

/// Optional backdrop, stretched across the whole viewport and drawn before
/// any tile.
#[derive(Debug)]
pub struct BackgroundResource {
    image: RgbaImage,
    texture: Option<TextureId>,
    viewport_width: f32,
    viewport_height: f32,
}

impl BackgroundResource {
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image,
            texture: None,
            viewport_width: 0.0,
            viewport_height: 0.0,
        }
    }

    pub fn ensure_texture(
        &mut self,
        surface: &mut dyn DrawSurface,
        viewport_width: f32,
        viewport_height: f32,
    ) {
        self.viewport_width = viewport_width;
        self.viewport_height = viewport_height;
        if self.texture.is_none() {
            self.texture = Some(surface.upload_texture(&self.image));
        }
    }
}

impl TileResource for BackgroundResource {
    fn desired_size(&self) -> f32 {
        self.viewport_width.max(self.viewport_height)
    }

    /// The transform is ignored; the background always fills the viewport.
    fn draw(&self, surface: &mut dyn DrawSurface, _translate: f32, _scale: f32) {
        let texture = match self.texture {
            Some(texture) => texture,
            None => return,
        };
        if self.viewport_width <= 0.0 || self.viewport_height <= 0.0 {
            return;
        }
        surface.draw_quad(
            texture,
            Quad {
                x: 0.0,
                y: 0.0,
                width: self.viewport_width,
                height: self.viewport_height,
            },
        );
    }

    fn release(&mut self, surface: &mut dyn DrawSurface) {
        if let Some(texture) = self.texture.take() {
            surface.release_texture(texture);
        }
    }
}
