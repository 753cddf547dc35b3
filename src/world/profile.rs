use serde::Serialize;

use super::frames::FrameImportanceTable;
use super::header::WorldHeader;

/// Walls above 255 exist from this version on.
pub const WIDE_WALL_VERSION: i32 = 222;
/// The third header-extension byte (coatings, shimmer) appeared here.
pub const THIRD_EXTENSION_VERSION: i32 = 269;

/// Tile-type ids fit one byte while the writer knows at most this many types.
const ONE_BYTE_ID_LIMIT: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IdWidth {
    One,
    Two,
}

impl IdWidth {
    pub fn bytes(self) -> usize {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }

    /// Largest id representable at this width.
    pub fn max_id(self) -> u16 {
        match self {
            Self::One => u8::MAX as u16,
            Self::Two => u16::MAX,
        }
    }
}

/// Field widths and limits the tile decoder needs, derived once per file
/// from values stored in that file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormatProfile {
    pub version: i32,
    pub tile_id_width: IdWidth,
    pub wall_id_width: IdWidth,
    /// How many chained header-extension bytes a cell may carry.
    pub max_extension_bytes: u8,
}

impl FormatProfile {
    pub fn new(version: i32, tile_type_count: usize) -> Self {
        Self {
            version,
            tile_id_width: if tile_type_count <= ONE_BYTE_ID_LIMIT {
                IdWidth::One
            } else {
                IdWidth::Two
            },
            wall_id_width: if version >= WIDE_WALL_VERSION {
                IdWidth::Two
            } else {
                IdWidth::One
            },
            max_extension_bytes: if version >= THIRD_EXTENSION_VERSION { 3 } else { 2 },
        }
    }

    pub fn from_header(header: &WorldHeader, frames: &FrameImportanceTable) -> Self {
        Self::new(header.version, frames.len())
    }
}
