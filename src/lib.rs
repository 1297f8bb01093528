pub mod blockmap;
pub mod common;
pub mod diagnostics;
pub mod helpers;
pub mod image_buffer;
pub mod persist;
pub mod projection;
pub mod tileset;

pub use blockmap::{render, Blockmap, RenderStats};
pub use common::{Block, Flip, Palette, Tile, TileAttributes};
pub use diagnostics::{Diagnostic, DiagnosticSink, LogSink};
pub use image_buffer::ImageBuffer;
pub use projection::{
    GridProjection, IsometricProjection, OrthogonalProjection, PixelPoint, TilePoint, TilePoint3D,
    Viewport,
};
pub use tileset::{TileSource, Tileset};
