use anyhow::{ensure, Result};
use log::warn;

use crate::common::{ColorIdx, Tile, TileBitmap, TILE_PIXELS, TILE_SIZE};

/// Read-only lookup from a tile reference to its 8x8 bitmap, with the
/// tile's flip already applied.
pub trait TileSource {
    fn get_tile(&self, tile: &Tile) -> TileBitmap;
}

#[derive(Clone, Debug, Default)]
pub struct Tileset {
    tiles: Vec<TileBitmap>,
}

impl Tileset {
    pub fn new(tiles: Vec<TileBitmap>) -> Self {
        Tileset { tiles }
    }

    /// Builds a tileset from bitmaps given as loose pixel lists, masking
    /// every value to 4 bits.
    pub fn from_pixel_lists(lists: &[Vec<ColorIdx>]) -> Result<Self> {
        let mut tiles = Vec::with_capacity(lists.len());
        for (i, list) in lists.iter().enumerate() {
            ensure!(
                list.len() == TILE_PIXELS,
                "tile {} has {} pixels, expected {}",
                i,
                list.len(),
                TILE_PIXELS
            );
            let mut bits = [0; TILE_PIXELS];
            for (dst, &c) in bits.iter_mut().zip(list.iter()) {
                *dst = c & 0x0F;
            }
            tiles.push(bits);
        }
        Ok(Tileset { tiles })
    }

    /// Decodes SNES 4bpp planar graphics: 32 bytes per tile, bitplanes 0/1
    /// interleaved per row in the first 16 bytes and 2/3 in the last 16.
    pub fn from_planar_4bpp(data: &[u8]) -> Result<Self> {
        ensure!(
            data.len() % 32 == 0,
            "Unexpected 4bpp graphics length: {}",
            data.len()
        );
        let mut tiles = Vec::with_capacity(data.len() / 32);
        for chunk in data.chunks_exact(32) {
            let mut tile: TileBitmap = [0; TILE_PIXELS];
            for y in 0..TILE_SIZE {
                for x in 0..TILE_SIZE {
                    let c0 = (chunk[y * 2] >> (7 - x)) & 1;
                    let c1 = (chunk[y * 2 + 1] >> (7 - x)) & 1;
                    let c2 = (chunk[y * 2 + 16] >> (7 - x)) & 1;
                    let c3 = (chunk[y * 2 + 17] >> (7 - x)) & 1;
                    tile[y * TILE_SIZE + x] = c0 | (c1 << 1) | (c2 << 2) | (c3 << 3);
                }
            }
            tiles.push(tile);
        }
        Ok(Tileset { tiles })
    }

    pub fn extend(&mut self, other: Tileset) {
        self.tiles.extend(other.tiles);
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

impl TileSource for Tileset {
    fn get_tile(&self, tile: &Tile) -> TileBitmap {
        match self.tiles.get(tile.idx as usize) {
            Some(&bits) => tile.attributes.flip.apply_to_pixels(bits),
            None => {
                warn!(
                    "Tile index {} out of range ({} tiles loaded)",
                    tile.idx,
                    self.tiles.len()
                );
                [0; TILE_PIXELS]
            }
        }
    }
}
