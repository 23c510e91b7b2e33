pub mod renderer;
pub mod resource;

pub use renderer::CarouselRenderer;
pub use resource::{
    BackgroundResource, CoverResource, LoadOutcome, PlaceholderResource, TileResource,
};
