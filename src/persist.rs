use std::{fs, path::Path};

use anyhow::{bail, ensure, Context, Result};
use hashbrown::HashMap;
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    blockmap::Blockmap,
    common::{Block, ColorIdx, ColorRGBA, Palette, PaletteIdx, MAX_PALETTES, PALETTE_COLORS},
    projection::{
        GridProjection, IsometricProjection, OrthogonalProjection, PixelCoord, Viewport,
        DEFAULT_TILE_HEIGHT, DEFAULT_TILE_WIDTH,
    },
    tileset::Tileset,
};

#[derive(Serialize, Deserialize, Copy, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionKind {
    #[default]
    Orthogonal,
    Isometric,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct RenderConfig {
    pub projection: ProjectionKind,
    pub left: PixelCoord,
    pub top: PixelCoord,
    pub tile_width: PixelCoord,
    pub tile_height: PixelCoord,
    pub low_priority_max_opacity: u8,
    pub high_priority_max_opacity: u8,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            projection: ProjectionKind::Orthogonal,
            left: 0,
            top: 0,
            tile_width: DEFAULT_TILE_WIDTH,
            tile_height: DEFAULT_TILE_HEIGHT,
            low_priority_max_opacity: 255,
            high_priority_max_opacity: 255,
        }
    }
}

impl RenderConfig {
    pub fn projection_for(&self, width: usize, height: usize) -> Result<Box<dyn GridProjection>> {
        let viewport = Viewport::new(width, height, self.left, self.top)
            .with_tile_size(self.tile_width, self.tile_height)?;
        Ok(match self.projection {
            ProjectionKind::Orthogonal => Box::new(OrthogonalProjection::new(viewport)),
            ProjectionKind::Isometric => Box::new(IsometricProjection::new(viewport)),
        })
    }
}

#[derive(Deserialize)]
struct PaletteEntry {
    name: String,
    #[serde(default)]
    colors: Option<[ColorRGBA; PALETTE_COLORS]>,
    #[serde(default)]
    bgr555: Option<[u16; PALETTE_COLORS]>,
}

#[derive(Deserialize)]
struct MapEntry {
    width: usize,
    height: usize,
    palette: String,
    blocks: Vec<[u16; 4]>,
    #[serde(default)]
    heights: Option<Vec<u8>>,
}

#[derive(Deserialize)]
struct SceneFile {
    palettes: Vec<PaletteEntry>,
    #[serde(default)]
    tiles: Vec<Vec<ColorIdx>>,
    // Raw SNES 4bpp graphics, appended after `tiles`.
    #[serde(default)]
    tiles_4bpp: Vec<u8>,
    map: MapEntry,
    #[serde(default)]
    config: RenderConfig,
}

#[derive(Debug)]
pub struct Scene {
    pub palette_names: Vec<String>,
    pub palettes: Vec<Palette>,
    pub tileset: Tileset,
    pub map: Blockmap,
    pub config: RenderConfig,
}

pub fn save_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    info!("Saving {}", path.display());
    let data_bytes = serde_json::to_vec_pretty(data)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, &data_bytes)?;
    Ok(())
}

pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    info!("Loading {}", path.display());
    let data_bytes =
        fs::read(path).with_context(|| format!("Unable to read {}", path.display()))?;
    let data: T = serde_json::from_slice(&data_bytes)
        .with_context(|| format!("Unable to parse {}", path.display()))?;
    Ok(data)
}

fn build_palettes(entries: Vec<PaletteEntry>) -> Result<(Vec<String>, Vec<Palette>)> {
    ensure!(
        entries.len() <= MAX_PALETTES,
        "Scene has {} palettes, at most {} are supported",
        entries.len(),
        MAX_PALETTES
    );
    let mut names = vec![];
    let mut palettes = vec![];
    for entry in entries {
        let pal = match (entry.colors, entry.bgr555) {
            (Some(colors), None) => Palette::new(colors),
            (None, Some(words)) => Palette::from_bgr555(&words),
            _ => bail!(
                "Palette {} must have exactly one of `colors` or `bgr555`",
                entry.name
            ),
        };
        names.push(entry.name);
        palettes.push(pal);
    }
    Ok((names, palettes))
}

fn resolve_palette(names: &[String], wanted: &str) -> Result<PaletteIdx> {
    let mut palette_name_idx_map: HashMap<&str, PaletteIdx> = HashMap::new();
    for (i, name) in names.iter().enumerate() {
        if palette_name_idx_map
            .insert(name.as_str(), i as PaletteIdx)
            .is_some()
        {
            bail!("Palette name {} already exists.", name);
        }
    }
    let idx = *palette_name_idx_map
        .get(wanted)
        .with_context(|| format!("Unknown palette {}", wanted))?;
    Ok(idx)
}

pub fn parse_scene(data: &[u8]) -> Result<Scene> {
    let file: SceneFile = serde_json::from_slice(data)?;
    let (palette_names, palettes) = build_palettes(file.palettes)?;

    let palette = resolve_palette(&palette_names, &file.map.palette)?;

    let mut tileset = Tileset::from_pixel_lists(&file.tiles)?;
    if !file.tiles_4bpp.is_empty() {
        tileset.extend(Tileset::from_planar_4bpp(&file.tiles_4bpp)?);
    }
    let blocks = file
        .map
        .blocks
        .into_iter()
        .map(Block::from_tilemap_words)
        .collect();
    let map = Blockmap::new(
        file.map.width,
        file.map.height,
        palette,
        blocks,
        file.map.heights,
    )?;

    Ok(Scene {
        palette_names,
        palettes,
        tileset,
        map,
        config: file.config,
    })
}

pub fn load_scene(path: &Path) -> Result<Scene> {
    info!("Loading scene {}", path.display());
    let data = fs::read(path).with_context(|| format!("Unable to read {}", path.display()))?;
    parse_scene(&data).with_context(|| format!("Invalid scene {}", path.display()))
}
