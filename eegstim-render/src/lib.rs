pub mod render;

pub use render::{FrameStats, RenderError, SkiaTextRenderer, blit_premultiplied, stack_layout};
