pub mod layout;
mod metrics;
pub(crate) mod typst;
pub mod watermark;

pub use layout::{render, PageGeometry, RenderOptions, RenderedDocument};
pub use typst::{typst_source, TypstCompiler};
pub use watermark::{FileWatermark, NoWatermark, WatermarkOutcome, WatermarkSource};
