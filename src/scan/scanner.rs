use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::world::{Cell, TilePos, TileStream, WorldGrid};

/// Outcome of searching a world for one tile type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectionResult {
    pub target: u16,
    pub count: u64,
    /// Topmost match: smallest y, ties broken by smaller x.
    pub first_coordinate: Option<TilePos>,
    /// First match in column-major scan order.
    pub scan_first: Option<TilePos>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matches: Option<Vec<TilePos>>,
    pub min_matches: u64,
}

impl DetectionResult {
    pub fn found(&self) -> bool {
        self.count >= self.min_matches.max(1)
    }

    pub fn highest_point(&self) -> Option<TilePos> {
        self.first_coordinate
    }
}

/// Searches decoded tiles for blocks of one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileScanner {
    target: u16,
    collect_matches: bool,
    min_matches: u64,
}

impl TileScanner {
    pub fn new(target: u16) -> Self {
        Self { target, collect_matches: false, min_matches: 1 }
    }

    /// Keep every match coordinate in the result.
    pub fn collect_matches(mut self, collect: bool) -> Self {
        self.collect_matches = collect;
        self
    }

    /// Matches needed before [`DetectionResult::found`] reports true.
    pub fn min_matches(mut self, min: u64) -> Self {
        self.min_matches = min;
        self
    }

    pub fn target(&self) -> u16 {
        self.target
    }

    pub fn scan_grid(&self, grid: &WorldGrid) -> DetectionResult {
        self.scan_cells(grid.cells())
    }

    pub fn scan_cells(&self, cells: impl IntoIterator<Item = Cell>) -> DetectionResult {
        let mut acc = Accumulator::new(self);
        for cell in cells {
            if cell.record.has_block(self.target) {
                acc.observe(cell.pos, 1);
            }
        }
        acc.finish()
    }

    /// Scan straight off the decoder without building a grid. A decode
    /// error anywhere in the stream fails the whole scan.
    pub fn scan_stream(&self, stream: TileStream<'_>) -> Result<DetectionResult> {
        let mut acc = Accumulator::new(self);
        for run in stream.runs() {
            let run = run?;
            if run.record.has_block(self.target) {
                acc.observe(TilePos::new(run.x, run.y), run.count);
            }
        }
        let result = acc.finish();
        debug!(target = result.target, count = result.count, "stream scan finished");
        Ok(result)
    }
}

struct Accumulator {
    target: u16,
    min_matches: u64,
    count: u64,
    highest: Option<TilePos>,
    first: Option<TilePos>,
    matches: Option<Vec<TilePos>>,
}

impl Accumulator {
    fn new(scanner: &TileScanner) -> Self {
        Self {
            target: scanner.target,
            min_matches: scanner.min_matches,
            count: 0,
            highest: None,
            first: None,
            matches: scanner.collect_matches.then(Vec::new),
        }
    }

    /// Record `len` matches running down from `top`.
    fn observe(&mut self, top: TilePos, len: u32) {
        self.count += len as u64;
        self.first.get_or_insert(top);
        let higher = match self.highest {
            Some(best) => (top.y, top.x) < (best.y, best.x),
            None => true,
        };
        if higher {
            self.highest = Some(top);
        }
        if let Some(matches) = &mut self.matches {
            matches.extend((top.y..top.y + len).map(|y| TilePos::new(top.x, y)));
        }
    }

    fn finish(self) -> DetectionResult {
        DetectionResult {
            target: self.target,
            count: self.count,
            first_coordinate: self.highest,
            scan_first: self.first,
            matches: self.matches,
            min_matches: self.min_matches,
        }
    }
}

/// Block counts for every tile type in a world.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileCensus {
    counts: Vec<u64>,
    cells: u64,
}

impl TileCensus {
    pub fn from_grid(grid: &WorldGrid) -> Self {
        let mut census = Self::default();
        for cell in grid.cells() {
            census.add(cell.record.block_id(), 1);
        }
        census
    }

    pub fn from_stream(stream: TileStream<'_>) -> Result<Self> {
        let mut census = Self::default();
        for run in stream.runs() {
            let run = run?;
            census.add(run.record.block_id(), run.count as u64);
        }
        Ok(census)
    }

    fn add(&mut self, id: Option<u16>, n: u64) {
        self.cells += n;
        if let Some(id) = id {
            let id = id as usize;
            if id >= self.counts.len() {
                self.counts.resize(id + 1, 0);
            }
            self.counts[id] += n;
        }
    }

    pub fn count(&self, id: u16) -> u64 {
        self.counts.get(id as usize).copied().unwrap_or(0)
    }

    /// Cells visited, including those without a block.
    pub fn cells(&self) -> u64 {
        self.cells
    }

    pub fn blocks(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Number of distinct tile types present.
    pub fn distinct(&self) -> usize {
        self.counts.iter().filter(|&&n| n > 0).count()
    }

    /// `(id, count)` for every present type, ascending by id.
    pub fn iter(&self) -> impl Iterator<Item = (u16, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, &n)| n > 0)
            .map(|(id, &n)| (id as u16, n))
    }
}
