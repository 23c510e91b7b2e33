use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};

#[allow(unused_imports)]
use log::{debug, info, warn, error};

use crate::loading::LoadReply;

/// Synchronous half of a fetch: either the provider already had the image
/// cached, or the fetch was dispatched and `reply` will be completed later.
#[derive(Debug)]
pub enum Fetch {
    Cached(RgbaImage),
    Pending,
}

/// The image source seam. Implementations own decoding, network fetching
/// and any disk/memory caching; the carousel only asks for letterboxed,
/// size-normalized square images.
///
/// `fetch` runs on the UI context. When the image is not cached the
/// provider dispatches the work to its own worker and returns
/// `Fetch::Pending`; the worker hands the decoded image (or the failure)
/// to `reply.complete`, which marshals it back to the UI context.
pub trait ImageProvider {
    fn fetch(
        &mut self,
        url: &str,
        target_size: u32,
        show_black_bars: bool,
        reply: LoadReply,
    ) -> Fetch;
}

/// Letterbox a decoded image onto a `target` x `target` canvas.
///
/// The image is scaled to fit while keeping its aspect ratio and centered;
/// the remaining bars are opaque black when `show_black_bars` is set,
/// transparent otherwise.
pub fn letterbox_to_square(image: &DynamicImage, target: u32, show_black_bars: bool) -> RgbaImage {
    let (w, h) = (image.width(), image.height());
    if w == 0 || h == 0 || target == 0 {
        warn!("letterbox_to_square: degenerate input {}x{} -> {}", w, h, target);
        return RgbaImage::new(target.max(1), target.max(1));
    }

    let scale = (target as f32 / w as f32).min(target as f32 / h as f32);
    let scaled_w = ((w as f32 * scale).round() as u32).clamp(1, target);
    let scaled_h = ((h as f32 * scale).round() as u32).clamp(1, target);

    let resized = if (scaled_w, scaled_h) == (w, h) {
        image.to_rgba8()
    } else {
        image
            .resize_exact(scaled_w, scaled_h, FilterType::Triangle)
            .to_rgba8()
    };

    let bar = if show_black_bars {
        Rgba([0, 0, 0, 255])
    } else {
        Rgba([0, 0, 0, 0])
    };
    let mut canvas = RgbaImage::from_pixel(target, target, bar);

    let left = (target - scaled_w) / 2;
    let top = (target - scaled_h) / 2;
    image::imageops::overlay(&mut canvas, &resized, left as i64, top as i64);

    canvas
}
