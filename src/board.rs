//! Board: grid dimensions, landed blocks, collision and the sticky row-clear pass.

use crate::rng::Dice;

/// Default playfield size (columns × rows).
pub const DEFAULT_COLS: i32 = 15;
pub const DEFAULT_ROWS: i32 = 25;
/// Largest board edge accepted from the command line.
pub const MAX_EDGE: i32 = 200;

/// Segment colour. `Sticky` marks a block that survived a row clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tint {
    /// Green channel of an `rgb(0, g, 0)` shade.
    Green(u8),
    Sticky,
}

/// Head colour: rgb(0, 220, 0).
pub const HEAD_TINT: Tint = Tint::Green(220);

/// Position of a landed block within the chain it came from. Display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Head,
    Body,
    Tail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LandedBlock {
    pub col: i32,
    pub row: i32,
    pub shape: Shape,
    pub tint: Tint,
}

impl LandedBlock {
    #[inline]
    pub fn is_sticky(&self) -> bool {
        self.tint == Tint::Sticky
    }
}

/// Result of one row-clear pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearReport {
    /// Row indices found full, in scan order (bottom first).
    pub rows: Vec<i32>,
    /// Blocks that turned sticky during the pass.
    pub stuck: u32,
}

impl ClearReport {
    pub fn count(&self) -> u32 {
        self.rows.len() as u32
    }
}

/// Playfield of landed blocks. Row 0 is the top.
#[derive(Debug, Clone)]
pub struct Board {
    pub cols: i32,
    pub rows: i32,
    blocks: Vec<LandedBlock>,
}

impl Board {
    pub fn new(cols: i32, rows: i32) -> Self {
        Self {
            cols,
            rows,
            blocks: Vec::new(),
        }
    }

    pub fn blocks(&self) -> &[LandedBlock] {
        &self.blocks
    }

    #[inline]
    pub fn in_bounds(&self, col: i32, row: i32) -> bool {
        (0..self.cols).contains(&col) && (0..self.rows).contains(&row)
    }

    pub fn block_at(&self, col: i32, row: i32) -> Option<&LandedBlock> {
        self.blocks.iter().find(|b| b.col == col && b.row == row)
    }

    /// Floor or an occupied cell. Columns are not checked; walls are handled by the mover.
    pub fn collides(&self, col: i32, row: i32) -> bool {
        row >= self.rows || self.block_at(col, row).is_some()
    }

    pub fn push(&mut self, block: LandedBlock) {
        self.blocks.push(block);
    }

    pub fn extend(&mut self, blocks: impl IntoIterator<Item = LandedBlock>) {
        self.blocks.extend(blocks);
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    pub fn row_is_full(&self, row: i32) -> bool {
        (0..self.cols).all(|col| self.block_at(col, row).is_some())
    }

    /// Single bottom-to-top pass over the rows. Each full row loses its blocks
    /// except the ones that roll under `stick_chance` and turn sticky; sticky
    /// blocks are always removed. Everything above then drops one row unless its
    /// column holds a fresh sticky block. Rows shifted below the scan position
    /// are not looked at again.
    pub fn clear_full_rows<D: Dice + ?Sized>(
        &mut self,
        dice: &mut D,
        stick_chance: f64,
    ) -> ClearReport {
        let mut report = ClearReport::default();
        for row in (0..self.rows).rev() {
            if !self.row_is_full(row) {
                continue;
            }
            report.rows.push(row);

            let mut blocked = vec![false; self.cols as usize];
            let mut survivors = Vec::new();
            for col in 0..self.cols {
                let Some(idx) = self
                    .blocks
                    .iter()
                    .position(|b| b.col == col && b.row == row)
                else {
                    continue;
                };
                let mut block = self.blocks.remove(idx);
                if block.is_sticky() {
                    continue;
                }
                if dice.roll() < stick_chance {
                    block.tint = Tint::Sticky;
                    survivors.push(block);
                    blocked[col as usize] = true;
                    report.stuck += 1;
                }
            }
            self.blocks.extend(survivors);

            for block in &mut self.blocks {
                let in_blocked_col = usize::try_from(block.col)
                    .ok()
                    .and_then(|c| blocked.get(c).copied())
                    .unwrap_or(false);
                if block.row < row && !in_blocked_col {
                    block.row += 1;
                }
            }
        }
        report
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new(DEFAULT_COLS, DEFAULT_ROWS)
    }
}

/// Points for clearing `rows` rows in one pass.
pub fn clear_points(rows: u32) -> u32 {
    rows * rows * 100
}

#[cfg(test)]
pub(crate) fn block(col: i32, row: i32) -> LandedBlock {
    LandedBlock {
        col,
        row,
        shape: Shape::Body,
        tint: Tint::Green(180),
    }
}
