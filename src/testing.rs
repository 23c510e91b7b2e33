//! Shared fakes for unit tests: a recording surface and a scriptable
//! provider.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use image::RgbaImage;

use crate::loading::LoadReply;
use crate::provider::{Fetch, ImageProvider};
use crate::surface::{DrawSurface, Quad, TextureId};

/// Records uploads, releases and draw calls; hands out sequential ids.
pub(crate) struct FakeSurface {
    next_id: u32,
    pub uploaded: Vec<TextureId>,
    pub released: Vec<TextureId>,
    pub quads: Vec<(TextureId, Quad)>,
}

impl FakeSurface {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            uploaded: Vec::new(),
            released: Vec::new(),
            quads: Vec::new(),
        }
    }

    pub fn live_textures(&self) -> usize {
        self.uploaded.len() - self.released.len()
    }
}

impl DrawSurface for FakeSurface {
    fn upload_texture(&mut self, _image: &RgbaImage) -> TextureId {
        let id = TextureId(self.next_id);
        self.next_id += 1;
        self.uploaded.push(id);
        id
    }

    fn release_texture(&mut self, texture: TextureId) {
        assert!(
            self.uploaded.contains(&texture),
            "released a texture that was never uploaded: {:?}",
            texture
        );
        assert!(
            !self.released.contains(&texture),
            "double release of {:?}",
            texture
        );
        self.released.push(texture);
    }

    fn draw_quad(&mut self, texture: TextureId, quad: Quad) {
        self.quads.push((texture, quad));
    }
}

enum ProviderMode {
    Cached,
    Pending,
}

/// A provider that either answers synchronously from "cache" or parks the
/// reply for the test to complete later. The counters are shared handles
/// so tests keep visibility after the provider is boxed away.
pub(crate) struct FakeProvider {
    mode: ProviderMode,
    pub fetch_count: Rc<Cell<usize>>,
    pub parked: Rc<RefCell<Vec<LoadReply>>>,
}

impl FakeProvider {
    pub fn cached() -> Self {
        Self {
            mode: ProviderMode::Cached,
            fetch_count: Rc::new(Cell::new(0)),
            parked: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn pending() -> Self {
        Self {
            mode: ProviderMode::Pending,
            fetch_count: Rc::new(Cell::new(0)),
            parked: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn test_image() -> RgbaImage {
        RgbaImage::new(4, 4)
    }
}

impl ImageProvider for FakeProvider {
    fn fetch(
        &mut self,
        _url: &str,
        _target_size: u32,
        _show_black_bars: bool,
        reply: LoadReply,
    ) -> Fetch {
        self.fetch_count.set(self.fetch_count.get() + 1);
        match self.mode {
            ProviderMode::Cached => Fetch::Cached(Self::test_image()),
            ProviderMode::Pending => {
                self.parked.borrow_mut().push(reply);
                Fetch::Pending
            }
        }
    }
}
