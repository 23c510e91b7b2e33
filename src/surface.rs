use image::RgbaImage;

/// Identifier for a texture owned by the host's GPU surface.
///
/// The surface hands one out per upload and takes it back in
/// `release_texture`. The core never fabricates ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Screen-space rectangle a texture is drawn into, in surface pixels.
/// The origin is the bottom-left corner, matching the ortho projection
/// the carousel math assumes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// The rendering backend seam. The host owns the actual GPU context
/// (surface creation, resizing, frame pacing) and implements this trait;
/// the carousel only uploads, draws and releases through it.
///
/// All calls happen on the UI context during a draw pass or an explicit
/// cache clear, in submission order. Draw order is meaningful: quads are
/// alpha-blended back to front.
pub trait DrawSurface {
    /// Upload a decoded RGBA image and return its texture id.
    fn upload_texture(&mut self, image: &RgbaImage) -> TextureId;

    /// Release a texture previously returned by `upload_texture`.
    fn release_texture(&mut self, texture: TextureId);

    /// Draw a textured quad at the given screen rectangle.
    fn draw_quad(&mut self, texture: TextureId, quad: Quad);
}
