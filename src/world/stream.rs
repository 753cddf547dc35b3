//! Run-length tile stream decoder.
//!
//! The tile section stores `width * height` cells column by column (all rows
//! of column 0, then column 1, ...). Each record starts with a [`CellFlags`]
//! byte, optionally followed by chained extension bytes, the block, wall and
//! liquid fields, and finally a run length saying how many consecutive cells
//! down the column share the record.

use std::iter::FusedIterator;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::trace;

use crate::codec::ByteCursor;
use crate::error::{Error, Result};
use super::frames::FrameImportanceTable;
use super::profile::{FormatProfile, IdWidth};
use super::tile::{
    Block, BlockShape, Cell, CellFlags, Coating, ExtA, ExtB, ExtC, Frame, Liquid, LiquidKind,
    TilePos, TileRecord, Wall, Wiring,
};

/// A decoded record and the number of cells it covers, starting at (x, y)
/// and running down the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunLengthEntry {
    pub x: u32,
    pub y: u32,
    pub count: u32,
    pub record: TileRecord,
}

impl RunLengthEntry {
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (self.y..self.y + self.count).map(move |y| Cell {
            pos: TilePos::new(self.x, y),
            record: self.record,
        })
    }
}

/// Lazy, single-pass decoder over the tile section.
///
/// Iterating yields one [`Cell`] per grid cell in column-major order.
/// [`runs`](Self::runs) yields the compressed [`RunLengthEntry`] units
/// instead. The first error ends the stream.
pub struct TileStream<'a> {
    cursor: ByteCursor<'a>,
    frames: &'a FrameImportanceTable,
    profile: FormatProfile,
    width: u32,
    height: u32,
    x: u32,
    y: u32,
    pending: Option<RunLengthEntry>,
    emitted: u32,
    done: bool,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> TileStream<'a> {
    /// `cursor` must already be positioned at the start of the tile section.
    pub fn new(
        cursor: ByteCursor<'a>,
        width: u32,
        height: u32,
        profile: FormatProfile,
        frames: &'a FrameImportanceTable,
    ) -> Self {
        Self {
            cursor,
            frames,
            profile,
            width,
            height,
            x: 0,
            y: 0,
            pending: None,
            emitted: 0,
            done: width == 0 || height == 0,
            cancel: None,
        }
    }

    /// Check `flag` at the start of every column and stop with
    /// [`Error::Cancelled`] once it is set.
    pub fn with_cancel(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn profile(&self) -> &FormatProfile {
        &self.profile
    }

    /// Byte offset of the next unread record.
    pub fn offset(&self) -> usize {
        self.cursor.position()
    }

    /// Column and row of the next undecoded cell.
    pub fn position(&self) -> TilePos {
        match &self.pending {
            Some(run) if self.emitted < run.count => TilePos::new(run.x, run.y + self.emitted),
            _ => TilePos::new(self.x, self.y),
        }
    }

    /// True until the first cell or run has been taken.
    pub fn is_fresh(&self) -> bool {
        self.x == 0 && self.y == 0 && self.pending.is_none()
    }

    pub fn runs(self) -> Runs<'a> {
        Runs { stream: self }
    }

    fn next_run(&mut self) -> Option<Result<RunLengthEntry>> {
        if self.done {
            return None;
        }
        let result = self.decode_run();
        match &result {
            Ok(_) => {
                if self.x >= self.width {
                    self.done = true;
                }
            }
            Err(_) => self.done = true,
        }
        Some(result)
    }

    fn decode_run(&mut self) -> Result<RunLengthEntry> {
        if self.y == 0 {
            if let Some(flag) = self.cancel {
                if flag.load(Ordering::Relaxed) {
                    return Err(Error::Cancelled { column: self.x });
                }
            }
        }

        let (record, selector) = self.decode_record()?;
        let count = match selector {
            0 => 1,
            1 => self.cursor.read_u8()? as u32,
            // 3 is unassigned and reads like 2
            _ => self.cursor.read_u16()? as u32,
        };

        let remaining = self.height - self.y;
        if count == 0 || count > remaining {
            return Err(Error::MalformedRunLength {
                x: self.x,
                y: self.y,
                count,
                remaining,
            });
        }

        let entry = RunLengthEntry { x: self.x, y: self.y, count, record };
        trace!(x = entry.x, y = entry.y, count, "tile run");

        self.y += count;
        if self.y == self.height {
            self.y = 0;
            self.x += 1;
        }
        Ok(entry)
    }

    fn decode_record(&mut self) -> Result<(TileRecord, u8)> {
        let flags = CellFlags::from_bits_retain(self.cursor.read_u8()?);
        let (a, b, c) = self.read_extensions(flags)?;

        let block = if flags.contains(CellFlags::ACTIVE) {
            let id = self.read_id(self.profile.tile_id_width)?;
            let frame = if self.frames.is_frame_important(id) {
                Some(Frame {
                    u: self.cursor.read_u16()?,
                    v: self.cursor.read_u16()?,
                })
            } else {
                None
            };
            let paint = if b.contains(ExtB::BLOCK_PAINT) {
                Some(self.cursor.read_u8()?)
            } else {
                None
            };
            Some(Block {
                id,
                frame,
                paint,
                shape: BlockShape::from_bits(a.shape_bits()),
                actuated: b.contains(ExtB::ACTUATED),
                coating: coating(
                    c.contains(ExtC::INVISIBLE_BLOCK),
                    c.contains(ExtC::FULLBRIGHT_BLOCK),
                ),
            })
        } else {
            None
        };

        let wall = if flags.contains(CellFlags::WALL) {
            let id = self.read_id(self.profile.wall_id_width)?;
            let paint = if b.contains(ExtB::WALL_PAINT) {
                Some(self.cursor.read_u8()?)
            } else {
                None
            };
            Some(Wall {
                id,
                paint,
                coating: coating(
                    c.contains(ExtC::INVISIBLE_WALL),
                    c.contains(ExtC::FULLBRIGHT_WALL),
                ),
            })
        } else {
            None
        };

        let liquid = match LiquidKind::from_bits(flags.liquid_bits()) {
            Some(kind) => {
                let amount = self.cursor.read_u8()?;
                let kind = if c.contains(ExtC::SHIMMER) { LiquidKind::Shimmer } else { kind };
                Some(Liquid { kind, amount })
            }
            None => None,
        };

        let mut wiring = Wiring::empty();
        wiring.set(Wiring::RED, a.contains(ExtA::WIRE_RED));
        wiring.set(Wiring::BLUE, a.contains(ExtA::WIRE_BLUE));
        wiring.set(Wiring::GREEN, a.contains(ExtA::WIRE_GREEN));
        wiring.set(Wiring::YELLOW, b.contains(ExtB::WIRE_YELLOW));
        wiring.set(Wiring::ACTUATOR, b.contains(ExtB::ACTUATOR));

        let record = TileRecord { block, wall, liquid, wiring };
        Ok((record, flags.run_selector()))
    }

    /// Read the chained extension bytes. A continuation bit on the last byte
    /// the profile allows is ignored.
    fn read_extensions(&mut self, flags: CellFlags) -> Result<(ExtA, ExtB, ExtC)> {
        let max = self.profile.max_extension_bytes;
        let mut a = ExtA::empty();
        let mut b = ExtB::empty();
        let mut c = ExtC::empty();

        if flags.contains(CellFlags::EXTENDED) && max >= 1 {
            a = ExtA::from_bits_retain(self.cursor.read_u8()?);
            if a.contains(ExtA::MORE) && max >= 2 {
                b = ExtB::from_bits_retain(self.cursor.read_u8()?);
                if b.contains(ExtB::MORE) && max >= 3 {
                    c = ExtC::from_bits_retain(self.cursor.read_u8()?);
                }
            }
        }
        Ok((a, b, c))
    }

    fn read_id(&mut self, width: IdWidth) -> Result<u16> {
        match width {
            IdWidth::One => Ok(self.cursor.read_u8()? as u16),
            IdWidth::Two => self.cursor.read_u16(),
        }
    }
}

fn coating(invisible: bool, fullbright: bool) -> Coating {
    let mut coating = Coating::empty();
    coating.set(Coating::INVISIBLE, invisible);
    coating.set(Coating::FULLBRIGHT, fullbright);
    coating
}

impl Iterator for TileStream<'_> {
    type Item = Result<Cell>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(run) = &self.pending {
                if self.emitted < run.count {
                    let cell = Cell {
                        pos: TilePos::new(run.x, run.y + self.emitted),
                        record: run.record,
                    };
                    self.emitted += 1;
                    return Some(Ok(cell));
                }
                self.pending = None;
            }

            match self.next_run()? {
                Ok(run) => {
                    self.pending = Some(run);
                    self.emitted = 0;
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl FusedIterator for TileStream<'_> {}

/// Run-level view of a [`TileStream`].
pub struct Runs<'a> {
    stream: TileStream<'a>,
}

impl Iterator for Runs<'_> {
    type Item = Result<RunLengthEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        self.stream.next_run()
    }
}

impl FusedIterator for Runs<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ByteWriter;

    const WIDE: i32 = 279;
    const NARROW: i32 = 194;

    fn frames() -> FrameImportanceTable {
        FrameImportanceTable::from_ids(200, [10])
    }

    fn decode_all(
        data: &[u8],
        width: u32,
        height: u32,
        profile: FormatProfile,
        frames: &FrameImportanceTable,
    ) -> Result<Vec<Cell>> {
        TileStream::new(ByteCursor::new(data), width, height, profile, frames).collect()
    }

    #[test]
    fn test_single_air_column() {
        let frames = frames();
        let profile = FormatProfile::new(WIDE, frames.len());
        // air, run selector 1, count 3
        let data = [0x40, 3];
        let cells = decode_all(&data, 1, 3, profile, &frames).unwrap();

        assert_eq!(cells.len(), 3);
        for (i, cell) in cells.iter().enumerate() {
            assert_eq!(cell.pos, TilePos::new(0, i as u32));
            assert!(cell.record.is_air());
        }
    }

    #[test]
    fn test_block_with_frame_and_paint() {
        let frames = frames();
        let profile = FormatProfile::new(WIDE, frames.len());
        let mut w = ByteWriter::new();
        // active + extended; A: more + red wire + half brick; B: paint + actuated
        w.write_u8(0x11);
        w.write_u8(0x01 | 0x02 | (1 << 4));
        w.write_u8(0x08 | 0x04);
        w.write_u8(10);
        w.write_u16(18);
        w.write_u16(36);
        w.write_u8(24);
        let data = w.into_vec();

        let cells = decode_all(&data, 1, 1, profile, &frames).unwrap();
        let block = cells[0].record.block.unwrap();
        assert_eq!(block.id, 10);
        assert_eq!(block.frame, Some(Frame { u: 18, v: 36 }));
        assert_eq!(block.paint, Some(24));
        assert_eq!(block.shape, BlockShape::HalfBrick);
        assert!(block.actuated);
        assert_eq!(cells[0].record.wiring, Wiring::RED);
    }

    #[test]
    fn test_wall_and_liquid() {
        let frames = frames();
        let profile = FormatProfile::new(WIDE, frames.len());
        let mut w = ByteWriter::new();
        // wall + lava + extended; A: more; B: wall paint
        w.write_u8(0x02 | (2 << 2) | 0x10);
        w.write_u8(0x01);
        w.write_u8(0x10);
        w.write_u16(300);
        w.write_u8(7);
        w.write_u8(255);
        let data = w.into_vec();

        let cells = decode_all(&data, 1, 1, profile, &frames).unwrap();
        let record = cells[0].record;
        assert_eq!(record.block, None);
        assert_eq!(record.wall, Some(Wall { id: 300, paint: Some(7), coating: Coating::empty() }));
        assert_eq!(record.liquid, Some(Liquid { kind: LiquidKind::Lava, amount: 255 }));
    }

    #[test]
    fn test_narrow_wall_ids() {
        let frames = frames();
        let profile = FormatProfile::new(NARROW, frames.len());
        // wall, id 200 as a single byte, run of 2
        let data = [0x02 | 0x40, 200, 2];
        let cells = decode_all(&data, 1, 2, profile, &frames).unwrap();
        assert_eq!(cells[1].record.wall.unwrap().id, 200);
    }

    #[test]
    fn test_wide_tile_ids() {
        let frames = FrameImportanceTable::from_ids(693, []);
        let profile = FormatProfile::new(WIDE, frames.len());
        let data = [0x01, 0x97, 0x02];
        let cells = decode_all(&data, 1, 1, profile, &frames).unwrap();
        assert_eq!(cells[0].record.block_id(), Some(0x0297));
    }

    #[test]
    fn test_third_extension_gated_by_profile() {
        let frames = frames();
        // A: more; B: more; C: invisible block + shimmer
        let mut w = ByteWriter::new();
        w.write_u8(0x01 | (1 << 2) | 0x10);
        w.write_u8(0x01);
        w.write_u8(0x01);
        w.write_u8(0x02 | 0x80);
        w.write_u8(5);
        w.write_u8(128);
        let data = w.into_vec();

        let profile = FormatProfile::new(WIDE, frames.len());
        let cells = decode_all(&data, 1, 1, profile, &frames).unwrap();
        let record = cells[0].record;
        assert_eq!(record.block.unwrap().coating, Coating::INVISIBLE);
        assert_eq!(record.liquid.unwrap().kind, LiquidKind::Shimmer);

        // An older world never has the C byte; B's continuation bit is
        // reserved there and must not pull in another byte.
        let profile = FormatProfile::new(NARROW, frames.len());
        let mut data = data;
        data.remove(3);
        let cells = decode_all(&data, 1, 1, profile, &frames).unwrap();
        let record = cells[0].record;
        assert_eq!(record.block_id(), Some(5));
        assert_eq!(record.liquid.unwrap().kind, LiquidKind::Water);
    }

    #[test]
    fn test_reserved_bits_ignored() {
        let frames = frames();
        let profile = FormatProfile::new(WIDE, frames.len());
        // reserved bit 5, A reserved bit 7, B reserved bits 6-7, shape 7
        let data = [0x01 | 0x10 | 0x20, 0x80 | 0x70 | 0x01, 0xC0, 4];
        let cells = decode_all(&data, 1, 1, profile, &frames).unwrap();
        let block = cells[0].record.block.unwrap();
        assert_eq!(block.id, 4);
        assert_eq!(block.shape, BlockShape::Full);
        assert_eq!(cells[0].record.wiring, Wiring::empty());
    }

    #[test]
    fn test_reserved_run_selector_reads_two_bytes() {
        let frames = frames();
        let profile = FormatProfile::new(WIDE, frames.len());
        let data = [0xC0, 0x05, 0x00];
        let cells = decode_all(&data, 1, 5, profile, &frames).unwrap();
        assert_eq!(cells.len(), 5);
    }

    #[test]
    fn test_run_overruns_column() {
        let frames = frames();
        let profile = FormatProfile::new(WIDE, frames.len());
        // column height 4: run of 3, then run of 2
        let data = [0x40, 3, 0x40, 2];
        let err = decode_all(&data, 2, 4, profile, &frames).unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedRunLength { x: 0, y: 3, count: 2, remaining: 1 }
        ));
    }

    #[test]
    fn test_zero_run_rejected() {
        let frames = frames();
        let profile = FormatProfile::new(WIDE, frames.len());
        let data = [0x40, 0];
        let err = decode_all(&data, 1, 4, profile, &frames).unwrap_err();
        assert!(matches!(err, Error::MalformedRunLength { count: 0, .. }));
    }

    #[test]
    fn test_runs_do_not_cross_columns() {
        let frames = frames();
        let profile = FormatProfile::new(WIDE, frames.len());
        // 3 columns of height 2, each a single run
        let data = [0x40, 2, 0x01 | 0x40, 7, 2, 0x40, 2];
        let runs: Vec<RunLengthEntry> =
            TileStream::new(ByteCursor::new(&data), 3, 2, profile, &frames)
                .runs()
                .collect::<Result<_>>()
                .unwrap();

        assert_eq!(runs.len(), 3);
        assert_eq!((runs[1].x, runs[1].y, runs[1].count), (1, 0, 2));
        assert_eq!(runs[1].record.block_id(), Some(7));
        let cells: Vec<Cell> = runs[1].cells().collect();
        assert_eq!(cells[1].pos, TilePos::new(1, 1));
    }

    #[test]
    fn test_stream_fuses_after_error() {
        let frames = frames();
        let profile = FormatProfile::new(WIDE, frames.len());
        let data = [0x00];
        let mut stream = TileStream::new(ByteCursor::new(&data), 1, 3, profile, &frames);

        assert!(stream.next().unwrap().is_ok());
        assert!(matches!(
            stream.next(),
            Some(Err(Error::UnexpectedEndOfData { .. }))
        ));
        assert!(stream.next().is_none());
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_cancel_between_columns() {
        let frames = frames();
        let profile = FormatProfile::new(WIDE, frames.len());
        let data = [0x40, 2, 0x40, 2];
        let flag = AtomicBool::new(false);
        let mut stream =
            TileStream::new(ByteCursor::new(&data), 2, 2, profile, &frames).with_cancel(&flag);

        assert!(stream.next().unwrap().is_ok());
        assert!(stream.next().unwrap().is_ok());
        flag.store(true, Ordering::Relaxed);
        assert!(matches!(
            stream.next(),
            Some(Err(Error::Cancelled { column: 1 }))
        ));
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_stops_after_last_cell() {
        let frames = frames();
        let profile = FormatProfile::new(WIDE, frames.len());
        // trailing bytes after the grid are not touched
        let data = [0x40, 2, 0xFF, 0xFF];
        let mut stream = TileStream::new(ByteCursor::new(&data), 1, 2, profile, &frames);
        assert_eq!(stream.by_ref().count(), 2);
        assert_eq!(stream.offset(), 2);
    }
}
