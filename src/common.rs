use serde::{Deserialize, Serialize};

use crate::helpers::scale_color;

pub type ColorValue = u8; // Color channel value (0-255)
pub type ColorIdx = u8; // Index into 4bpp palette (0-15)
pub type PaletteIdx = u8; // Index into palette set (0-15)
pub type TileIdx = u16; // Index into tileset
pub type ColorRGB = [ColorValue; 3];
pub type ColorRGBA = [ColorValue; 4];

pub const TILE_SIZE: usize = 8;
pub const TILE_PIXELS: usize = TILE_SIZE * TILE_SIZE;
pub const PALETTE_COLORS: usize = 16;
pub const MAX_PALETTES: usize = 16;

// Row-major 8x8 bitmap of color indices; 0 is transparent.
pub type TileBitmap = [ColorIdx; TILE_PIXELS];

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    pub colors: [ColorRGBA; PALETTE_COLORS],
}

impl Default for Palette {
    fn default() -> Self {
        Palette {
            colors: [[0, 0, 0, 255]; PALETTE_COLORS],
        }
    }
}

impl Palette {
    pub fn new(colors: [ColorRGBA; PALETTE_COLORS]) -> Self {
        Palette { colors }
    }

    /// Expands 15-bit SNES color words (`0bbbbbgg gggrrrrr`) into an opaque
    /// palette. Entry 0 is the backdrop slot and is made fully transparent.
    pub fn from_bgr555(words: &[u16; PALETTE_COLORS]) -> Self {
        let mut colors = [[0, 0, 0, 255]; PALETTE_COLORS];
        for (dst, &c) in colors.iter_mut().zip(words.iter()) {
            let r = (c & 31) as u8;
            let g = ((c >> 5) & 31) as u8;
            let b = ((c >> 10) & 31) as u8;
            *dst = [scale_color(r), scale_color(g), scale_color(b), 255];
        }
        colors[0][3] = 0;
        Palette { colors }
    }

    pub fn color(&self, idx: ColorIdx) -> ColorRGB {
        let [r, g, b, _] = self.colors[idx as usize];
        [r, g, b]
    }

    pub fn alpha(&self, idx: ColorIdx) -> ColorValue {
        self.colors[idx as usize][3]
    }
}

#[derive(Serialize, Deserialize, Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Flip {
    #[default]
    None,
    Horizontal,
    Vertical,
    Both,
}

impl Flip {
    pub fn from_bits(h: bool, v: bool) -> Self {
        match (h, v) {
            (false, false) => Flip::None,
            (true, false) => Flip::Horizontal,
            (false, true) => Flip::Vertical,
            (true, true) => Flip::Both,
        }
    }

    pub fn apply_to_pixels(self, pixels: TileBitmap) -> TileBitmap {
        let mut out = pixels;
        for y in 0..TILE_SIZE {
            for x in 0..TILE_SIZE {
                let (sx, sy) = match self {
                    Flip::None => (x, y),
                    Flip::Horizontal => (TILE_SIZE - 1 - x, y),
                    Flip::Vertical => (x, TILE_SIZE - 1 - y),
                    Flip::Both => (TILE_SIZE - 1 - x, TILE_SIZE - 1 - y),
                };
                out[y * TILE_SIZE + x] = pixels[sy * TILE_SIZE + sx];
            }
        }
        out
    }
}

#[derive(Serialize, Deserialize, Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TileAttributes {
    pub priority: bool,
    pub flip: Flip,
}

#[derive(Serialize, Deserialize, Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Tile {
    pub idx: TileIdx,
    pub attributes: TileAttributes,
}

impl Tile {
    pub fn new(idx: TileIdx) -> Self {
        Tile {
            idx,
            attributes: TileAttributes::default(),
        }
    }

    pub fn with_priority(mut self, priority: bool) -> Self {
        self.attributes.priority = priority;
        self
    }

    pub fn with_flip(mut self, flip: Flip) -> Self {
        self.attributes.flip = flip;
        self
    }

    /// Decodes a VRAM tilemap word (`vhopppcc cccccccc`), returning the tile
    /// and the palette number stored in its `ppp` bits.
    pub fn from_tilemap_word(w: u16) -> (Self, PaletteIdx) {
        let tile = Tile {
            idx: w & 0x3FF,
            attributes: TileAttributes {
                priority: (w >> 13) & 1 == 1,
                flip: Flip::from_bits((w >> 14) & 1 == 1, (w >> 15) & 1 == 1),
            },
        };
        (tile, ((w >> 10) & 7) as PaletteIdx)
    }

    pub fn priority_value(&self) -> u8 {
        self.attributes.priority as u8
    }
}

// Four tiles forming a 16x16 unit: top-left, top-right, bottom-left, bottom-right.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Block {
    pub tiles: [Tile; 4],
}

impl Block {
    pub fn new(tiles: [Tile; 4]) -> Self {
        Block { tiles }
    }

    // The palette bits of the words are dropped; blocks are drawn with a
    // single palette supplied by the caller.
    pub fn from_tilemap_words(words: [u16; 4]) -> Self {
        Block {
            tiles: words.map(|w| Tile::from_tilemap_word(w).0),
        }
    }

    pub fn get_tile(&self, i: usize) -> &Tile {
        &self.tiles[i]
    }
}
