// Indexed-color raster that tiles and blocks are composited into.
use std::{fs::File, io::BufWriter, path::Path};

use anyhow::{Context, Result};
use itertools::izip;
use log::{error, info};

use crate::{
    common::{Block, Palette, PaletteIdx, Tile, MAX_PALETTES, PALETTE_COLORS, TILE_SIZE},
    diagnostics::{Diagnostic, DiagnosticSink, LogSink},
    tileset::TileSource,
};

// Export buffers kept between calls to avoid reallocating. Dropped on resize.
#[derive(Default)]
struct Scratch {
    rgb: Vec<u8>,
    alpha: Vec<u8>,
}

/// A `width` x `height` raster of palette-indexed pixels (high nibble is the
/// palette row, low nibble the color within it) with a parallel priority
/// raster (0 = low, nonzero = high). Both rasters always share dimensions.
pub struct ImageBuffer {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
    priority: Vec<u8>,
    scratch: Scratch,
    sink: Box<dyn DiagnosticSink>,
}

impl Default for ImageBuffer {
    fn default() -> Self {
        ImageBuffer::new(0, 0)
    }
}

impl std::fmt::Debug for ImageBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl ImageBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        ImageBuffer {
            width,
            height,
            pixels: vec![0; width * height],
            priority: vec![0; width * height],
            scratch: Scratch::default(),
            sink: Box::new(LogSink),
        }
    }

    pub fn with_sink(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.set_sink(sink);
        self
    }

    pub fn set_sink(&mut self, sink: impl DiagnosticSink + 'static) {
        self.sink = Box::new(sink);
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn priorities(&self) -> &[u8] {
        &self.priority
    }

    pub fn clear(&mut self) {
        self.pixels.fill(0);
        self.priority.fill(0);
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixels = vec![0; width * height];
        self.priority = vec![0; width * height];
        self.scratch = Scratch::default();
    }

    fn report(&mut self, diagnostic: Diagnostic) -> Result<(), Diagnostic> {
        self.sink.report(&diagnostic);
        Err(diagnostic)
    }

    /// Draws an 8x8 tile with its top-left corner at (`x`, `y`). Zero-valued
    /// source pixels are transparent and leave both color and priority
    /// untouched. A tile that would not fit is skipped and reported.
    pub fn insert_tile(
        &mut self,
        x: usize,
        y: usize,
        palette_index: PaletteIdx,
        tile: &Tile,
        tileset: &impl TileSource,
    ) -> Result<(), Diagnostic> {
        let max_x = x.saturating_add(TILE_SIZE - 1);
        let max_y = y.saturating_add(TILE_SIZE - 1);
        if max_x >= self.width || max_y >= self.height {
            return self.report(Diagnostic::TileOutOfRange {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }

        let tile_bits = tileset.get_tile(tile);
        let pal_bits = (palette_index & 0x0F) << 4;
        let priority = tile.priority_value();
        for (row, src) in tile_bits.chunks_exact(TILE_SIZE).enumerate() {
            let begin = (y + row) * self.width + x;
            let dest = &mut self.pixels[begin..begin + TILE_SIZE];
            let pri_dest = &mut self.priority[begin..begin + TILE_SIZE];
            for (&c, d, p) in izip!(src, dest, pri_dest) {
                if c != 0 {
                    *d = c | pal_bits;
                    *p = priority;
                }
            }
        }
        Ok(())
    }

    /// Draws the four tiles of a block at (0,0), (8,0), (0,8), (8,8) relative
    /// to (`x`, `y`). The block is skipped when `(y+7)*width + x+7` does not
    /// address the raster. Quadrants that fail their own range check are
    /// skipped individually; the first such failure is returned.
    pub fn insert_block(
        &mut self,
        x: usize,
        y: usize,
        palette_index: PaletteIdx,
        block: &Block,
        tileset: &impl TileSource,
    ) -> Result<(), Diagnostic> {
        let last = y
            .checked_add(TILE_SIZE - 1)
            .and_then(|r| r.checked_mul(self.width))
            .and_then(|r| r.checked_add(x))
            .and_then(|r| r.checked_add(TILE_SIZE - 1));
        if !matches!(last, Some(i) if i < self.pixels.len()) {
            return self.report(Diagnostic::BlockOutOfRange {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }

        let offsets = [(0, 0), (TILE_SIZE, 0), (0, TILE_SIZE), (TILE_SIZE, TILE_SIZE)];
        let mut result = Ok(());
        for (i, (dx, dy)) in offsets.into_iter().enumerate() {
            let r = self.insert_tile(x + dx, y + dy, palette_index, block.get_tile(i), tileset);
            if result.is_ok() {
                result = r;
            }
        }
        result
    }

    /// Interleaved RGB triplets, row-major, `width * height * 3` bytes.
    ///
    /// # Panics
    /// If a pixel references a palette row past the end of `palettes`.
    pub fn get_rgb(&mut self, palettes: &[Palette]) -> &[u8] {
        let rgb = &mut self.scratch.rgb;
        rgb.resize(self.width * self.height * 3, 0);
        for (&pixel, out) in self.pixels.iter().zip(rgb.chunks_exact_mut(3)) {
            out.copy_from_slice(&palettes[(pixel >> 4) as usize].color(pixel & 0x0F));
        }
        &self.scratch.rgb
    }

    /// One alpha byte per pixel: the palette alpha, capped by
    /// `high_pri_max_opacity` for high-priority pixels and by
    /// `low_pri_max_opacity` for the rest.
    ///
    /// # Panics
    /// If a pixel references a palette row past the end of `palettes`.
    pub fn get_alpha(
        &mut self,
        palettes: &[Palette],
        low_pri_max_opacity: u8,
        high_pri_max_opacity: u8,
    ) -> &[u8] {
        let alpha = &mut self.scratch.alpha;
        alpha.resize(self.width * self.height, 0);
        for (&pixel, &pri, out) in izip!(&self.pixels, &self.priority, alpha.iter_mut()) {
            let a = palettes[(pixel >> 4) as usize].alpha(pixel & 0x0F);
            let max_opacity = if pri != 0 {
                high_pri_max_opacity
            } else {
                low_pri_max_opacity
            };
            *out = a.min(max_opacity);
        }
        &self.scratch.alpha
    }

    /// Interleaved RGBA for hosts that build a single displayable image.
    /// Without `use_alpha` every pixel is opaque.
    pub fn to_rgba(
        &mut self,
        palettes: &[Palette],
        use_alpha: bool,
        low_pri_max_opacity: u8,
        high_pri_max_opacity: u8,
    ) -> Vec<u8> {
        let rgb = self.get_rgb(palettes).to_vec();
        let alpha: Vec<u8> = if use_alpha {
            self.get_alpha(palettes, low_pri_max_opacity, high_pri_max_opacity)
                .to_vec()
        } else {
            vec![255; self.width * self.height]
        };
        let mut data = Vec::with_capacity(alpha.len() * 4);
        for (c, &a) in rgb.chunks_exact(3).zip(alpha.iter()) {
            data.extend_from_slice(c);
            data.push(a);
        }
        data
    }

    /// Writes the raster as an 8-bit indexed PNG. The PLTE and tRNS chunks
    /// always hold 256 entries: palette row `n` fills entries `16n..16n+16`,
    /// rows beyond the supplied palettes are black and transparent.
    pub fn write_png(&self, path: &Path, palettes: &[Palette]) -> Result<()> {
        info!("Saving {}", path.display());
        let mut plte = vec![0u8; MAX_PALETTES * PALETTE_COLORS * 3];
        let mut trns = vec![0u8; MAX_PALETTES * PALETTE_COLORS];
        for (entry, pal) in palettes.iter().take(MAX_PALETTES).enumerate() {
            for i in 0..PALETTE_COLORS {
                let [r, g, b, a] = pal.colors[i];
                let n = entry * PALETTE_COLORS + i;
                plte[n * 3..n * 3 + 3].copy_from_slice(&[r, g, b]);
                trns[n] = a;
            }
        }

        let file = match File::create(path) {
            Ok(f) => f,
            Err(e) => {
                error!("Unable to open PNG {}: {}", path.display(), e);
                return Err(e).with_context(|| format!("Unable to open {}", path.display()));
            }
        };

        let mut encoder = png::Encoder::new(
            BufWriter::new(file),
            self.width as u32,
            self.height as u32,
        );
        encoder.set_color(png::ColorType::Indexed);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_palette(plte);
        encoder.set_trns(trns);
        let mut writer = encoder
            .write_header()
            .with_context(|| format!("Writing PNG header to {}", path.display()))?;
        writer
            .write_image_data(&self.pixels)
            .with_context(|| format!("Writing PNG data to {}", path.display()))?;
        writer.finish()?;
        Ok(())
    }
}
