// Rendering a grid of blocks through a projection into an ImageBuffer.
use anyhow::{ensure, Result};
use itertools::Itertools;
use log::{debug, info};

use crate::{
    common::{Block, PaletteIdx},
    image_buffer::ImageBuffer,
    projection::{GridProjection, TileCoord, TilePoint, TilePoint3D},
    tileset::TileSource,
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Blockmap {
    pub width: usize,
    pub height: usize,
    pub palette: PaletteIdx,
    pub blocks: Vec<Block>,       // row-major, width * height
    pub heights: Option<Vec<u8>>, // elevation per cell
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub drawn: usize,
    pub skipped: usize,
}

impl Blockmap {
    pub fn new(
        width: usize,
        height: usize,
        palette: PaletteIdx,
        blocks: Vec<Block>,
        heights: Option<Vec<u8>>,
    ) -> Result<Self> {
        ensure!(
            blocks.len() == width * height,
            "block map is {} x {} but has {} blocks",
            width,
            height,
            blocks.len()
        );
        if let Some(h) = &heights {
            ensure!(
                h.len() == width * height,
                "block map is {} x {} but has {} heights",
                width,
                height,
                h.len()
            );
        }
        Ok(Blockmap {
            width,
            height,
            palette,
            blocks,
            heights,
        })
    }

    pub fn get_block(&self, x: usize, y: usize) -> Option<&Block> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.blocks.get(y * self.width + x)
    }

    pub fn get_height(&self, x: usize, y: usize) -> u8 {
        match &self.heights {
            Some(h) if x < self.width && y < self.height => h[y * self.width + x],
            _ => 0,
        }
    }

    pub fn max_height(&self) -> u8 {
        self.heights
            .as_ref()
            .and_then(|h| h.iter().copied().max())
            .unwrap_or(0)
    }

    fn cell_point(&self, x: usize, y: usize) -> TilePoint3D {
        TilePoint3D::new(
            x as TileCoord,
            y as TileCoord,
            self.get_height(x, y) as TileCoord,
        )
    }
}

/// Draws every cell of `map` at its projected position. Cells are drawn back
/// to front (by the screen row of their ground position, then column) so
/// nearer cells overwrite farther ones. Cells projected to negative
/// coordinates, or that do not fit the buffer, are skipped.
pub fn render(
    buffer: &mut ImageBuffer,
    projection: &dyn GridProjection,
    map: &Blockmap,
    tiles: &impl TileSource,
) -> RenderStats {
    let mut stats = RenderStats::default();
    let cells = (0..map.height)
        .cartesian_product(0..map.width)
        .map(|(y, x)| {
            let ground = projection.tile_to_screen(TilePoint::new(x as TileCoord, y as TileCoord));
            (ground.y, ground.x, x, y)
        })
        .sorted();

    for (_, _, x, y) in cells {
        let Some(block) = map.get_block(x, y) else {
            continue;
        };
        let p = projection.tile_to_screen_3d(map.cell_point(x, y));
        if p.x < 0 || p.y < 0 {
            debug!("Cell {}, {} projects off-canvas at {}, {}", x, y, p.x, p.y);
            stats.skipped += 1;
            continue;
        }
        match buffer.insert_block(p.x as usize, p.y as usize, map.palette, block, tiles) {
            Ok(()) => stats.drawn += 1,
            Err(_) => stats.skipped += 1,
        }
    }
    info!(
        "Rendered {} x {} block map: {} drawn, {} skipped",
        map.width, map.height, stats.drawn, stats.skipped
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::{Tile, TILE_PIXELS},
        projection::{IsometricProjection, OrthogonalProjection, Viewport},
        tileset::Tileset,
    };

    // Tile n is filled with color n.
    fn solid_tileset() -> Tileset {
        Tileset::new((0..16u8).map(|n| [n; TILE_PIXELS]).collect())
    }

    fn solid_block(n: u16) -> Block {
        Block::new([Tile::new(n); 4])
    }

    #[test]
    fn test_new_checks_sizes() {
        assert!(Blockmap::new(2, 2, 0, vec![Block::default(); 3], None).is_err());
        assert!(Blockmap::new(2, 2, 0, vec![Block::default(); 4], Some(vec![0; 2])).is_err());
        let map = Blockmap::new(2, 1, 0, vec![solid_block(1), solid_block(2)], None).unwrap();
        assert_eq!(map.get_block(1, 0), Some(&solid_block(2)));
        assert_eq!(map.get_block(2, 0), None);
        assert_eq!(map.max_height(), 0);
    }

    #[test]
    fn test_render_orthogonal() {
        let ts = solid_tileset();
        let blocks = (1..=4).map(solid_block).collect();
        let map = Blockmap::new(2, 2, 3, blocks, None).unwrap();
        let proj = OrthogonalProjection::new(Viewport::new(2, 2, 0, 0));
        let mut buf = ImageBuffer::new(proj.canvas_width(), proj.canvas_height());
        let stats = render(&mut buf, &proj, &map, &ts);
        assert_eq!(stats, RenderStats { drawn: 4, skipped: 0 });
        assert_eq!(buf.pixels()[0], 0x31);
        assert_eq!(buf.pixels()[31], 0x32);
        assert_eq!(buf.pixels()[16 * 32], 0x33);
        assert_eq!(buf.pixels()[32 * 32 - 1], 0x34);
    }

    #[test]
    fn test_render_isometric() {
        let ts = solid_tileset();
        let blocks = (1..=4).map(solid_block).collect();
        let map = Blockmap::new(2, 2, 1, blocks, None).unwrap();
        let proj = IsometricProjection::new(Viewport::new(2, 2, 0, 0));
        let mut buf = ImageBuffer::new(proj.canvas_width(), proj.canvas_height());
        assert_eq!((buf.width(), buf.height()), (64, 40));
        let stats = render(&mut buf, &proj, &map, &ts);
        assert_eq!(stats.drawn, 4);
        // (0,0) at (16,0); (1,0) at (32,8); (0,1) at (0,8); (1,1) at (16,16).
        assert_eq!(buf.pixels()[16], 0x11);
        assert_eq!(buf.pixels()[8 * 64 + 40], 0x12);
        assert_eq!(buf.pixels()[8 * 64 + 4], 0x13);
        assert_eq!(buf.pixels()[20 * 64 + 20], 0x14);
        assert_eq!(buf.pixels()[39 * 64], 0);
    }

    #[test]
    fn test_render_elevation_offscreen_is_skipped() {
        let ts = solid_tileset();
        let blocks = (1..=4).map(solid_block).collect();
        let map = Blockmap::new(2, 2, 0, blocks, Some(vec![1, 0, 0, 0])).unwrap();
        let proj = IsometricProjection::new(Viewport::new(2, 2, 0, 0));
        let mut buf = ImageBuffer::new(proj.canvas_width(), proj.canvas_height());
        let stats = render(&mut buf, &proj, &map, &ts);
        assert_eq!(stats, RenderStats { drawn: 3, skipped: 1 });

        let top = map.max_height() as i32 * 16;
        let proj = IsometricProjection::new(Viewport::new(2, 2, 0, top));
        let mut buf = ImageBuffer::new(proj.canvas_width(), proj.canvas_height() + top as usize);
        let stats = render(&mut buf, &proj, &map, &ts);
        assert_eq!(stats.drawn, 4);
        assert_eq!(buf.pixels()[16], 0x01);
    }
}
