use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{info, warn};

use tilemap_raster::{
    blockmap,
    image_buffer::ImageBuffer,
    persist::{self, ProjectionKind, RenderConfig},
};

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ProjectionArg {
    Ortho,
    Iso,
}

#[derive(Parser, Debug)]
#[command(about = "Render a block map scene to an indexed PNG")]
struct Args {
    /// Scene JSON file (palettes, tiles and block map)
    scene: PathBuf,

    /// Output PNG path
    #[arg(short, long)]
    output: PathBuf,

    /// Render config JSON, replacing the scene's `config` section
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    projection: Option<ProjectionArg>,

    /// Opacity ceiling for low-priority pixels in the raw alpha output
    #[arg(long)]
    low_opacity: Option<u8>,

    /// Opacity ceiling for high-priority pixels in the raw alpha output
    #[arg(long)]
    high_opacity: Option<u8>,

    /// Also write interleaved RGB bytes to this path
    #[arg(long)]
    rgb: Option<PathBuf>,

    /// Also write per-pixel alpha bytes to this path
    #[arg(long)]
    alpha: Option<PathBuf>,

    /// Save the effective render config to this path
    #[arg(long)]
    write_config: Option<PathBuf>,
}

fn effective_config(args: &Args, scene_config: RenderConfig) -> Result<RenderConfig> {
    let mut config = match &args.config {
        Some(path) => persist::load_json(path)?,
        None => scene_config,
    };
    if let Some(p) = args.projection {
        config.projection = match p {
            ProjectionArg::Ortho => ProjectionKind::Orthogonal,
            ProjectionArg::Iso => ProjectionKind::Isometric,
        };
    }
    if let Some(o) = args.low_opacity {
        config.low_priority_max_opacity = o;
    }
    if let Some(o) = args.high_opacity {
        config.high_priority_max_opacity = o;
    }
    Ok(config)
}

pub fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let scene = persist::load_scene(&args.scene)?;
    let config = effective_config(&args, scene.config.clone())?;
    if let Some(path) = &args.write_config {
        persist::save_json(path, &config)?;
    }

    // Raised cells are lifted by one tile height per level; push the grid
    // down so the highest ones stay on the canvas.
    let lift = scene.map.max_height() as i32 * config.tile_height;
    let mut placed = config.clone();
    placed.top += lift;
    let projection = placed.projection_for(scene.map.width, scene.map.height)?;

    let width = projection.canvas_width() + config.left.max(0) as usize;
    let height = projection.canvas_height() + placed.top.max(0) as usize;
    info!("Canvas is {} x {} pixels", width, height);
    let mut buffer = ImageBuffer::new(width, height);
    let stats = blockmap::render(&mut buffer, projection.as_ref(), &scene.map, &scene.tileset);
    if stats.skipped > 0 {
        warn!("{} cells did not fit on the canvas", stats.skipped);
    }

    buffer
        .write_png(&args.output, &scene.palettes)
        .context("Unable to write PNG")?;
    if let Some(path) = &args.rgb {
        info!("Saving {}", path.display());
        std::fs::write(path, buffer.get_rgb(&scene.palettes))?;
    }
    if let Some(path) = &args.alpha {
        info!("Saving {}", path.display());
        let alpha = buffer.get_alpha(
            &scene.palettes,
            config.low_priority_max_opacity,
            config.high_priority_max_opacity,
        );
        std::fs::write(path, alpha)?;
    }
    Ok(())
}
