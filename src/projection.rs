// Mapping between screen pixels and logical tile-grid coordinates.
use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use crate::helpers::floor_div;

pub const DEFAULT_TILE_WIDTH: i32 = 16;
pub const DEFAULT_TILE_HEIGHT: i32 = 16;

pub type PixelCoord = i32;
pub type TileCoord = i32;

#[derive(Serialize, Deserialize, Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PixelPoint {
    pub x: PixelCoord,
    pub y: PixelCoord,
}

impl PixelPoint {
    pub fn new(x: PixelCoord, y: PixelCoord) -> Self {
        PixelPoint { x, y }
    }
}

#[derive(Serialize, Deserialize, Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TilePoint {
    pub x: TileCoord,
    pub y: TileCoord,
}

impl TilePoint {
    pub fn new(x: TileCoord, y: TileCoord) -> Self {
        TilePoint { x, y }
    }
}

// `z` counts elevation layers; higher values are drawn further up the screen.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TilePoint3D {
    pub x: TileCoord,
    pub y: TileCoord,
    pub z: TileCoord,
}

impl TilePoint3D {
    pub fn new(x: TileCoord, y: TileCoord, z: TileCoord) -> Self {
        TilePoint3D { x, y, z }
    }
}

/// Placement of a `width` x `height` logical grid on a rendering surface.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub left: PixelCoord,
    pub top: PixelCoord,
    pub width: usize,
    pub height: usize,
    pub tile_width: PixelCoord,
    pub tile_height: PixelCoord,
}

impl Viewport {
    pub fn new(width: usize, height: usize, left: PixelCoord, top: PixelCoord) -> Self {
        Viewport {
            left,
            top,
            width,
            height,
            tile_width: DEFAULT_TILE_WIDTH,
            tile_height: DEFAULT_TILE_HEIGHT,
        }
    }

    pub fn with_tile_size(
        mut self,
        tile_width: PixelCoord,
        tile_height: PixelCoord,
    ) -> Result<Self> {
        ensure!(
            tile_width > 0 && tile_height > 0,
            "Invalid tile size {} x {}",
            tile_width,
            tile_height
        );
        self.tile_width = tile_width;
        self.tile_height = tile_height;
        Ok(self)
    }
}

pub trait GridProjection {
    fn screen_to_tile(&self, point: PixelPoint) -> TilePoint;
    fn tile_to_screen(&self, tile: TilePoint) -> PixelPoint;
    fn tile_to_screen_3d(&self, tile: TilePoint3D) -> PixelPoint;
    fn canvas_width(&self) -> usize;
    fn canvas_height(&self) -> usize;
}

/// Diamond projection. Logical (0,0) sits at the top vertex, which is pushed
/// right by `height - 1` tile widths so the whole grid stays on-canvas.
///
/// All divisions round toward negative infinity, so points left of or above
/// the grid map to negative tile coordinates instead of collapsing onto row
/// or column zero.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct IsometricProjection {
    viewport: Viewport,
}

impl IsometricProjection {
    pub fn new(viewport: Viewport) -> Self {
        IsometricProjection { viewport }
    }

    fn grid_offset(&self) -> i32 {
        self.viewport.height as i32 - 1
    }

    pub fn required_canvas_width(&self, grid_width: usize, grid_height: usize) -> usize {
        (grid_width + grid_height) * self.viewport.tile_width as usize
    }

    pub fn required_canvas_height(&self, grid_width: usize, grid_height: usize) -> usize {
        (grid_width + grid_height + 1) * self.viewport.tile_height as usize / 2
    }
}

impl GridProjection for IsometricProjection {
    fn screen_to_tile(&self, point: PixelPoint) -> TilePoint {
        let vp = &self.viewport;
        let xgrid = floor_div(point.x - vp.left, vp.tile_width);
        let ygrid = floor_div(2 * (point.y - vp.top), vp.tile_height);
        TilePoint {
            x: floor_div(ygrid + xgrid - self.grid_offset(), 2),
            y: floor_div(ygrid - xgrid + self.grid_offset(), 2),
        }
    }

    fn tile_to_screen(&self, tile: TilePoint) -> PixelPoint {
        self.tile_to_screen_3d(TilePoint3D::new(tile.x, tile.y, 0))
    }

    fn tile_to_screen_3d(&self, tile: TilePoint3D) -> PixelPoint {
        let vp = &self.viewport;
        PixelPoint {
            x: (tile.x - tile.y + self.grid_offset()) * vp.tile_width + vp.left,
            y: floor_div((tile.x + tile.y - 2 * tile.z) * vp.tile_height, 2) + vp.top,
        }
    }

    fn canvas_width(&self) -> usize {
        self.required_canvas_width(self.viewport.width, self.viewport.height)
    }

    fn canvas_height(&self) -> usize {
        self.required_canvas_height(self.viewport.width, self.viewport.height)
    }
}

/// Plain row/column layout. Elevation shifts a cell up by whole tile heights.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OrthogonalProjection {
    viewport: Viewport,
}

impl OrthogonalProjection {
    pub fn new(viewport: Viewport) -> Self {
        OrthogonalProjection { viewport }
    }
}

impl GridProjection for OrthogonalProjection {
    fn screen_to_tile(&self, point: PixelPoint) -> TilePoint {
        let vp = &self.viewport;
        TilePoint {
            x: floor_div(point.x - vp.left, vp.tile_width),
            y: floor_div(point.y - vp.top, vp.tile_height),
        }
    }

    fn tile_to_screen(&self, tile: TilePoint) -> PixelPoint {
        self.tile_to_screen_3d(TilePoint3D::new(tile.x, tile.y, 0))
    }

    fn tile_to_screen_3d(&self, tile: TilePoint3D) -> PixelPoint {
        let vp = &self.viewport;
        PixelPoint {
            x: tile.x * vp.tile_width + vp.left,
            y: (tile.y - tile.z) * vp.tile_height + vp.top,
        }
    }

    fn canvas_width(&self) -> usize {
        self.viewport.width * self.viewport.tile_width as usize
    }

    fn canvas_height(&self) -> usize {
        self.viewport.height * self.viewport.tile_height as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iso10() -> IsometricProjection {
        let vp = Viewport::new(10, 10, 0, 0).with_tile_size(16, 16).unwrap();
        IsometricProjection::new(vp)
    }

    #[test]
    fn test_iso_tile_to_screen() {
        let iso = iso10();
        assert_eq!(iso.tile_to_screen(TilePoint::new(3, 4)), PixelPoint::new(128, 56));
        assert_eq!(iso.tile_to_screen(TilePoint::new(0, 0)), PixelPoint::new(144, 0));
        assert_eq!(iso.tile_to_screen(TilePoint::new(9, 9)), PixelPoint::new(144, 144));
    }

    #[test]
    fn test_iso_round_trip() {
        let iso = iso10();
        let points = [
            (3, 4),
            (0, 0),
            (9, 0),
            (0, 9),
            (9, 9),
            (5, 5),
            (-1, 0),
            (0, -1),
            (-3, -2),
            (12, -4),
        ];
        for (x, y) in points {
            let tile = TilePoint::new(x, y);
            let p = iso.tile_to_screen(tile);
            assert_eq!(iso.screen_to_tile(p), tile, "tile {:?} at {:?}", tile, p);
        }
    }

    #[test]
    fn test_iso_round_trip_over_footprint() {
        let iso = iso10();
        for (x, y) in [(3, 4), (0, 0), (-2, 1)] {
            let tile = TilePoint::new(x, y);
            let p = iso.tile_to_screen(tile);
            for dy in 0..8 {
                for dx in 0..16 {
                    let q = PixelPoint::new(p.x + dx, p.y + dy);
                    assert_eq!(iso.screen_to_tile(q), tile, "point {:?}", q);
                }
            }
        }
    }

    #[test]
    fn test_iso_floor_rounding_near_origin() {
        let iso = iso10();
        // Just left of tile (0,0)'s anchor: truncating division would give (0,0).
        assert_eq!(iso.screen_to_tile(PixelPoint::new(143, 0)), TilePoint::new(-1, 0));
        // Just above it.
        assert_eq!(iso.screen_to_tile(PixelPoint::new(144, -1)), TilePoint::new(-1, -1));
        // Right-hand neighbor cell.
        assert_eq!(iso.screen_to_tile(PixelPoint::new(160, 0)), TilePoint::new(0, -1));
        // Far outside the surface.
        assert_eq!(iso.screen_to_tile(PixelPoint::new(-1, -1)), TilePoint::new(-6, 4));
    }

    #[test]
    fn test_iso_elevation_moves_up_only() {
        let iso = iso10();
        let flat = iso.tile_to_screen(TilePoint::new(3, 4));
        let raised = iso.tile_to_screen_3d(TilePoint3D::new(3, 4, 1));
        assert_eq!(raised, PixelPoint::new(flat.x, flat.y - 16));
        let z0 = iso.tile_to_screen_3d(TilePoint3D::new(3, 4, 0));
        assert_eq!(z0, flat);
    }

    #[test]
    fn test_iso_viewport_offset() {
        let vp = Viewport::new(4, 6, 10, 20).with_tile_size(32, 16).unwrap();
        let iso = IsometricProjection::new(vp);
        let tile = TilePoint::new(2, 1);
        let p = iso.tile_to_screen(tile);
        assert_eq!(p, PixelPoint::new((2 - 1 + 5) * 32 + 10, 3 * 8 + 20));
        assert_eq!(iso.screen_to_tile(p), tile);
    }

    #[test]
    fn test_iso_canvas_size() {
        let iso = iso10();
        assert_eq!(iso.canvas_width(), 320);
        assert_eq!(iso.canvas_height(), 168);
        assert_eq!(iso.required_canvas_width(10, 10), 320);
        assert_eq!(iso.required_canvas_height(10, 10), 168);
        assert_eq!(iso.required_canvas_width(3, 5), 128);
        assert_eq!(iso.required_canvas_height(3, 5), 72);
    }

    #[test]
    fn test_tile_size_must_be_positive() {
        assert!(Viewport::new(1, 1, 0, 0).with_tile_size(0, 16).is_err());
        assert!(Viewport::new(1, 1, 0, 0).with_tile_size(16, -8).is_err());
        let vp = Viewport::new(1, 1, 0, 0).with_tile_size(32, 8).unwrap();
        assert_eq!((vp.tile_width, vp.tile_height), (32, 8));
    }

    #[test]
    fn test_orthogonal_projection() {
        let ortho = OrthogonalProjection::new(Viewport::new(8, 4, 2, 3));
        let p = ortho.tile_to_screen(TilePoint::new(3, 2));
        assert_eq!(p, PixelPoint::new(50, 35));
        assert_eq!(ortho.screen_to_tile(p), TilePoint::new(3, 2));
        assert_eq!(ortho.screen_to_tile(PixelPoint::new(1, 2)), TilePoint::new(-1, -1));
        assert_eq!(
            ortho.tile_to_screen_3d(TilePoint3D::new(3, 2, 1)),
            PixelPoint::new(50, 19)
        );
        assert_eq!(ortho.canvas_width(), 128);
        assert_eq!(ortho.canvas_height(), 64);
    }
}
