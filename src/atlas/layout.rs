use crate::atlas::AtlasError;
use crate::config::MAX_ATLAS_DIMENSION;

/// Grid geometry shared by the image and label atlases.
///
/// `grid_side = ceil(sqrt(item_count))`; item `i` sits at column `i % grid_side`,
/// row `i / grid_side`. Cells past `item_count` stay empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasLayout {
    item_count: usize,
    grid_side: u32,
    cell_size_px: u32,
}

impl AtlasLayout {
    pub fn new(item_count: usize, cell_size_px: u32) -> Result<Self, AtlasError> {
        if item_count == 0 {
            return Err(AtlasError::EmptyItemSet);
        }

        let grid_side = Self::grid_side_for(item_count);
        let side = u64::from(grid_side) * u64::from(cell_size_px);
        if side == 0 || side > u64::from(MAX_ATLAS_DIMENSION) {
            return Err(AtlasError::SurfaceTooLarge { side, limit: MAX_ATLAS_DIMENSION });
        }

        Ok(Self { item_count, grid_side, cell_size_px })
    }

    /// Smallest side whose square holds `item_count` cells.
    pub fn grid_side_for(item_count: usize) -> u32 {
        let n = item_count as u64;
        let mut side = (n as f64).sqrt().ceil() as u64;
        // Correct for float rounding on large counts
        while side * side < n {
            side += 1;
        }
        while side > 1 && (side - 1) * (side - 1) >= n {
            side -= 1;
        }
        side as u32
    }

    pub fn item_count(&self) -> usize {
        self.item_count
    }

    pub fn grid_side(&self) -> u32 {
        self.grid_side
    }

    pub fn cell_size_px(&self) -> u32 {
        self.cell_size_px
    }

    pub fn canvas_size_px(&self) -> u32 {
        self.grid_side * self.cell_size_px
    }

    /// `(column, row)` of item `index`.
    pub fn cell(&self, index: usize) -> (u32, u32) {
        let side = self.grid_side as usize;
        ((index % side) as u32, (index / side) as u32)
    }

    /// Top-left pixel of item `index`'s cell.
    pub fn cell_origin(&self, index: usize) -> (u32, u32) {
        let (col, row) = self.cell(index);
        (col * self.cell_size_px, row * self.cell_size_px)
    }

    /// Trailing cells with no item.
    pub fn empty_cells(&self) -> usize {
        (self.grid_side as usize).pow(2) - self.item_count
    }
}
