use tracing::debug;

use crate::error::{Error, Result};
use super::stream::TileStream;
use super::tile::{Cell, TilePos, TileRecord};

/// Fully decoded world, stored column-major like the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldGrid {
    width: u32,
    height: u32,
    cells: Vec<TileRecord>,
}

impl WorldGrid {
    /// Decode a fresh stream into a grid.
    ///
    /// The stream must not have been advanced. Storage grows with the
    /// decoded runs, so a header claiming more cells than the data holds
    /// fails on the data instead of on the allocation. Any decode error
    /// discards the partially built grid.
    pub fn from_stream(stream: TileStream<'_>) -> Result<Self> {
        if !stream.is_fresh() {
            let pos = stream.position();
            return Err(Error::StreamInProgress { x: pos.x, y: pos.y });
        }
        let width = stream.width();
        let height = stream.height();
        let expected = width as u64 * height as u64;
        let mut cells: Vec<TileRecord> = Vec::new();

        for run in stream.runs() {
            let run = run?;
            cells
                .try_reserve(run.count as usize)
                .map_err(|_| Error::GridTooLarge { cells: expected })?;
            cells.extend(std::iter::repeat(run.record).take(run.count as usize));
        }
        if cells.len() as u64 != expected {
            return Err(Error::IncompleteGrid { expected, decoded: cells.len() as u64 });
        }
        debug!(width, height, "materialized world grid");

        Ok(Self { width, height, cells })
    }

    /// Build a grid from column-major records. Returns `None` when the
    /// record count does not match the dimensions.
    pub fn from_columns(width: u32, height: u32, cells: Vec<TileRecord>) -> Option<Self> {
        if cells.len() != width as usize * height as usize {
            return None;
        }
        Some(Self { width, height, cells })
    }

    /// A grid of air.
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![TileRecord::air(); width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, x: u32, y: u32) -> Option<&TileRecord> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    /// Replace a cell. Used when assembling grids to encode.
    pub(crate) fn set(&mut self, x: u32, y: u32, record: TileRecord) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.cells[i] = record;
                true
            }
            None => false,
        }
    }

    pub fn column(&self, x: u32) -> Option<&[TileRecord]> {
        if x >= self.width {
            return None;
        }
        let start = x as usize * self.height as usize;
        Some(&self.cells[start..start + self.height as usize])
    }

    /// All cells in column-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        let height = self.height as usize;
        self.cells.iter().enumerate().map(move |(i, record)| Cell {
            pos: TilePos::new((i / height) as u32, (i % height) as u32),
            record: *record,
        })
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(x as usize * self.height as usize + y as usize)
        } else {
            None
        }
    }
}
