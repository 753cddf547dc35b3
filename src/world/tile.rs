//! Decoded cell contents and the per-cell header bytes that describe them.

use bitflags::bitflags;
use serde::Serialize;

bitflags! {
    /// Primary header byte of a tile-stream record.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CellFlags: u8 {
        const ACTIVE = 0x01;
        const WALL = 0x02;
        const LIQUID_MASK = 0x0C;
        /// Extension byte A follows.
        const EXTENDED = 0x10;
        const RESERVED = 0x20;
        const RUN_MASK = 0xC0;
    }
}

bitflags! {
    /// Extension byte A: wires and block shape.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ExtA: u8 {
        const MORE = 0x01;
        const WIRE_RED = 0x02;
        const WIRE_BLUE = 0x04;
        const WIRE_GREEN = 0x08;
        const SHAPE_MASK = 0x70;
        const RESERVED = 0x80;
    }
}

bitflags! {
    /// Extension byte B: actuation, paint, yellow wire.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ExtB: u8 {
        const MORE = 0x01;
        const ACTUATOR = 0x02;
        const ACTUATED = 0x04;
        const BLOCK_PAINT = 0x08;
        const WALL_PAINT = 0x10;
        const WIRE_YELLOW = 0x20;
        const RESERVED = 0xC0;
    }
}

bitflags! {
    /// Extension byte C: coatings and shimmer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ExtC: u8 {
        const MORE = 0x01;
        const INVISIBLE_BLOCK = 0x02;
        const INVISIBLE_WALL = 0x04;
        const FULLBRIGHT_BLOCK = 0x08;
        const FULLBRIGHT_WALL = 0x10;
        const RESERVED = 0x60;
        const SHIMMER = 0x80;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct Wiring: u8 {
        const RED = 0x01;
        const BLUE = 0x02;
        const GREEN = 0x04;
        const YELLOW = 0x08;
        const ACTUATOR = 0x10;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct Coating: u8 {
        const INVISIBLE = 0x01;
        const FULLBRIGHT = 0x02;
    }
}

impl CellFlags {
    pub fn liquid_bits(self) -> u8 {
        (self.bits() & Self::LIQUID_MASK.bits()) >> 2
    }

    pub fn run_selector(self) -> u8 {
        self.bits() >> 6
    }
}

impl ExtA {
    pub fn shape_bits(self) -> u8 {
        (self.bits() & Self::SHAPE_MASK.bits()) >> 4
    }
}

/// Sprite frame of a frame-important block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Frame {
    pub u: u16,
    pub v: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum BlockShape {
    #[default]
    Full,
    HalfBrick,
    SlopeTopRight,
    SlopeTopLeft,
    SlopeBottomRight,
    SlopeBottomLeft,
}

impl BlockShape {
    /// Unknown shape codes read as a full block.
    pub fn from_bits(bits: u8) -> Self {
        match bits {
            1 => Self::HalfBrick,
            2 => Self::SlopeTopRight,
            3 => Self::SlopeTopLeft,
            4 => Self::SlopeBottomRight,
            5 => Self::SlopeBottomLeft,
            _ => Self::Full,
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            Self::Full => 0,
            Self::HalfBrick => 1,
            Self::SlopeTopRight => 2,
            Self::SlopeTopLeft => 3,
            Self::SlopeBottomRight => 4,
            Self::SlopeBottomLeft => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LiquidKind {
    Water,
    Lava,
    Honey,
    Shimmer,
}

impl LiquidKind {
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits & 0x03 {
            0 => None,
            1 => Some(Self::Water),
            2 => Some(Self::Lava),
            _ => Some(Self::Honey),
        }
    }

    /// Header bits for this kind. Shimmer is stored as water plus a flag.
    pub fn bits(self) -> u8 {
        match self {
            Self::Water | Self::Shimmer => 1,
            Self::Lava => 2,
            Self::Honey => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Block {
    pub id: u16,
    /// Present exactly when the block's type is frame-important.
    pub frame: Option<Frame>,
    pub paint: Option<u8>,
    pub shape: BlockShape,
    pub actuated: bool,
    pub coating: Coating,
}

impl Block {
    pub fn new(id: u16) -> Self {
        Self {
            id,
            frame: None,
            paint: None,
            shape: BlockShape::Full,
            actuated: false,
            coating: Coating::empty(),
        }
    }

    pub fn with_frame(mut self, u: u16, v: u16) -> Self {
        self.frame = Some(Frame { u, v });
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Wall {
    pub id: u16,
    pub paint: Option<u8>,
    pub coating: Coating,
}

impl Wall {
    pub fn new(id: u16) -> Self {
        Self { id, paint: None, coating: Coating::empty() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Liquid {
    pub kind: LiquidKind,
    pub amount: u8,
}

/// Contents of one grid cell. Air is `TileRecord::default()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct TileRecord {
    pub block: Option<Block>,
    pub wall: Option<Wall>,
    pub liquid: Option<Liquid>,
    pub wiring: Wiring,
}

impl TileRecord {
    pub fn air() -> Self {
        Self::default()
    }

    pub fn with_block(block: Block) -> Self {
        Self { block: Some(block), ..Self::default() }
    }

    pub fn is_air(&self) -> bool {
        *self == Self::default()
    }

    pub fn block_id(&self) -> Option<u16> {
        self.block.map(|b| b.id)
    }

    pub fn has_block(&self, id: u16) -> bool {
        self.block_id() == Some(id)
    }
}

/// Grid coordinate, x to the right and y downwards from the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TilePos {
    pub x: u32,
    pub y: u32,
}

impl TilePos {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// One decoded grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub pos: TilePos,
    pub record: TileRecord,
}
