//! Writes synthetic world files in the layout [`TileStream`](super::TileStream)
//! reads. Used by the tests and by `wld-scan synth`.

use crate::codec::ByteWriter;
use crate::error::{Error, Result};
use super::frames::FrameImportanceTable;
use super::grid::WorldGrid;
use super::header::{magic_for, metadata_len, MAX_SUPPORTED_VERSION, WORLD_FILE_TYPE};
use super::profile::{FormatProfile, IdWidth};
use super::tile::{CellFlags, Coating, ExtA, ExtB, ExtC, LiquidKind, TileRecord, Wiring};

/// Tile types known to 1.4.4.
pub const DEFAULT_TILE_TYPE_COUNT: usize = 693;

/// A few types that store sprite frames: plants, torches, trees, doors,
/// furniture, chests.
pub const DEFAULT_FRAME_IMPORTANT: &[u16] =
    &[3, 4, 5, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21];

#[derive(Debug, Clone)]
pub struct WorldSpec {
    pub version: i32,
    pub name: String,
    pub seed: String,
    pub generator_version: u64,
    pub guid: [u8; 16],
    pub world_id: i32,
    pub width: u32,
    pub height: u32,
    pub tile_type_count: usize,
    pub frame_important: Vec<u16>,
    /// Sections written after the tile section, like chests and signs.
    pub extra_sections: usize,
}

impl WorldSpec {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            version: MAX_SUPPORTED_VERSION,
            name: "Synthetic World".into(),
            seed: "0".into(),
            generator_version: 0,
            guid: [0; 16],
            world_id: 1,
            width,
            height,
            tile_type_count: DEFAULT_TILE_TYPE_COUNT,
            frame_important: DEFAULT_FRAME_IMPORTANT.to_vec(),
            extra_sections: 0,
        }
    }
}

pub struct WorldEncoder {
    spec: WorldSpec,
    frames: FrameImportanceTable,
    profile: FormatProfile,
    grid: WorldGrid,
}

impl WorldEncoder {
    /// Start from an all-air grid sized by `spec`.
    pub fn new(spec: WorldSpec) -> Self {
        let grid = WorldGrid::empty(spec.width, spec.height);
        Self::with_grid(spec, grid)
    }

    pub fn with_grid(spec: WorldSpec, grid: WorldGrid) -> Self {
        let frames =
            FrameImportanceTable::from_ids(spec.tile_type_count, spec.frame_important.iter().copied());
        let profile = FormatProfile::new(spec.version, frames.len());
        Self { spec, frames, profile, grid }
    }

    pub fn profile(&self) -> &FormatProfile {
        &self.profile
    }

    pub fn frames(&self) -> &FrameImportanceTable {
        &self.frames
    }

    pub fn grid(&self) -> &WorldGrid {
        &self.grid
    }

    /// Place a record. Out-of-range coordinates are ignored.
    pub fn set(&mut self, x: u32, y: u32, record: TileRecord) -> &mut Self {
        self.grid.set(x, y, record);
        self
    }

    /// Encode the grid, merging equal neighbours in a column into runs.
    pub fn finish(self) -> Result<Vec<u8>> {
        let mut tiles = ByteWriter::new();
        for x in 0..self.grid.width() {
            let Some(column) = self.grid.column(x) else { break };
            let mut y = 0;
            while y < column.len() {
                let record = column[y];
                let mut count = 1;
                while y + count < column.len()
                    && count < u16::MAX as usize
                    && column[y + count] == record
                {
                    count += 1;
                }
                self.write_record(&mut tiles, &record, count as u32)?;
                y += count;
            }
        }
        Ok(self.assemble(tiles.as_slice()))
    }

    /// Encode the given runs verbatim, without checking they fit the grid.
    pub fn finish_runs(self, runs: &[(TileRecord, u32)]) -> Result<Vec<u8>> {
        let mut tiles = ByteWriter::new();
        for (record, count) in runs {
            self.write_record(&mut tiles, record, *count)?;
        }
        Ok(self.assemble(tiles.as_slice()))
    }

    fn write_record(&self, w: &mut ByteWriter, record: &TileRecord, count: u32) -> Result<()> {
        let mut flags = CellFlags::empty();
        let mut a = ExtA::empty();
        let mut b = ExtB::empty();
        let mut c = ExtC::empty();

        if let Some(block) = &record.block {
            flags |= CellFlags::ACTIVE;
            check_id(block.id, self.profile.tile_id_width, "block id too wide for this world")?;
            match (self.frames.is_frame_important(block.id), block.frame.is_some()) {
                (true, false) => return Err(Error::Unencodable("frame-important block without frame")),
                (false, true) => return Err(Error::Unencodable("frame on a block type without frames")),
                _ => {}
            }
            a |= ExtA::from_bits_retain(block.shape.bits() << 4);
            b.set(ExtB::BLOCK_PAINT, block.paint.is_some());
            b.set(ExtB::ACTUATED, block.actuated);
            c.set(ExtC::INVISIBLE_BLOCK, block.coating.contains(Coating::INVISIBLE));
            c.set(ExtC::FULLBRIGHT_BLOCK, block.coating.contains(Coating::FULLBRIGHT));
        }

        if let Some(wall) = &record.wall {
            flags |= CellFlags::WALL;
            check_id(wall.id, self.profile.wall_id_width, "wall id too wide for this world")?;
            b.set(ExtB::WALL_PAINT, wall.paint.is_some());
            c.set(ExtC::INVISIBLE_WALL, wall.coating.contains(Coating::INVISIBLE));
            c.set(ExtC::FULLBRIGHT_WALL, wall.coating.contains(Coating::FULLBRIGHT));
        }

        if let Some(liquid) = &record.liquid {
            flags |= CellFlags::from_bits_retain(liquid.kind.bits() << 2);
            c.set(ExtC::SHIMMER, liquid.kind == LiquidKind::Shimmer);
        }

        a.set(ExtA::WIRE_RED, record.wiring.contains(Wiring::RED));
        a.set(ExtA::WIRE_BLUE, record.wiring.contains(Wiring::BLUE));
        a.set(ExtA::WIRE_GREEN, record.wiring.contains(Wiring::GREEN));
        b.set(ExtB::WIRE_YELLOW, record.wiring.contains(Wiring::YELLOW));
        b.set(ExtB::ACTUATOR, record.wiring.contains(Wiring::ACTUATOR));

        if !c.is_empty() {
            if self.profile.max_extension_bytes < 3 {
                return Err(Error::Unencodable("coatings and shimmer need a newer world version"));
            }
            b |= ExtB::MORE;
        }
        if !b.is_empty() {
            a |= ExtA::MORE;
        }
        if !a.is_empty() {
            flags |= CellFlags::EXTENDED;
        }

        let selector = match count {
            0 => return Err(Error::Unencodable("empty run")),
            1 => 0u8,
            2..=0xFF => 1,
            0x100..=0xFFFF => 2,
            _ => return Err(Error::Unencodable("run longer than 65535 cells")),
        };

        w.write_u8(flags.bits() | (selector << 6));
        if flags.contains(CellFlags::EXTENDED) {
            w.write_u8(a.bits());
            if a.contains(ExtA::MORE) {
                w.write_u8(b.bits());
                if b.contains(ExtB::MORE) {
                    w.write_u8(c.bits());
                }
            }
        }

        if let Some(block) = &record.block {
            write_id(w, block.id, self.profile.tile_id_width);
            if let Some(frame) = block.frame {
                w.write_u16(frame.u);
                w.write_u16(frame.v);
            }
            if let Some(paint) = block.paint {
                w.write_u8(paint);
            }
        }
        if let Some(wall) = &record.wall {
            write_id(w, wall.id, self.profile.wall_id_width);
            if let Some(paint) = wall.paint {
                w.write_u8(paint);
            }
        }
        if let Some(liquid) = &record.liquid {
            w.write_u8(liquid.amount);
        }

        match selector {
            0 => {}
            1 => w.write_u8(count as u8),
            _ => w.write_u16(count as u16),
        }
        Ok(())
    }

    fn assemble(&self, tiles: &[u8]) -> Vec<u8> {
        let spec = &self.spec;
        let mut w = ByteWriter::with_capacity(tiles.len() + 256);

        w.write_u64(magic_for(WORLD_FILE_TYPE));
        w.write_i32(spec.version);
        if metadata_len(spec.version) > 0 {
            w.write_u32(1);
            w.write_u64(0);
        }

        let section_count = 2 + spec.extra_sections;
        w.write_u16(section_count as u16);
        let table_at = w.len();
        for _ in 0..section_count {
            w.write_u32(0);
        }
        self.frames.encode(&mut w);

        let mut offsets = Vec::with_capacity(section_count);
        offsets.push(w.len() as u32);
        self.write_properties(&mut w);

        offsets.push(w.len() as u32);
        w.write_bytes(tiles);

        for i in 0..spec.extra_sections {
            offsets.push(w.len() as u32);
            w.write_u32(i as u32);
        }

        for (i, offset) in offsets.into_iter().enumerate() {
            w.patch_u32(table_at + i * 4, offset);
        }
        w.into_vec()
    }

    fn write_properties(&self, w: &mut ByteWriter) {
        let spec = &self.spec;
        w.write_string(&spec.name);
        if spec.version >= 179 {
            if spec.version == 179 {
                w.write_i32(spec.seed.parse().unwrap_or(0));
            } else {
                w.write_string(&spec.seed);
            }
            w.write_u64(spec.generator_version);
        }
        if spec.version >= 181 {
            w.write_bytes(&spec.guid);
        }
        w.write_i32(spec.world_id);
        // bounds in pixels, 16 per tile
        w.write_i32(0);
        w.write_i32(spec.width as i32 * 16);
        w.write_i32(0);
        w.write_i32(spec.height as i32 * 16);
        w.write_i32(spec.height as i32);
        w.write_i32(spec.width as i32);
    }
}

fn check_id(id: u16, width: IdWidth, reason: &'static str) -> Result<()> {
    if id > width.max_id() {
        return Err(Error::Unencodable(reason));
    }
    Ok(())
}

fn write_id(w: &mut ByteWriter, id: u16, width: IdWidth) {
    match width {
        IdWidth::One => w.write_u8(id as u8),
        IdWidth::Two => w.write_u16(id),
    }
}
