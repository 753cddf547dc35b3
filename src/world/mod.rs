//! World-save decoding: header, frame table, tile stream and grid.

pub mod encoder;
pub mod file;
pub mod frames;
pub mod grid;
pub mod header;
pub mod profile;
pub mod stream;
pub mod tile;

pub use encoder::{WorldEncoder, WorldSpec};
pub use file::{WorldFile, WorldReader};
pub use frames::FrameImportanceTable;
pub use grid::WorldGrid;
pub use header::{
    FileMetadata, HeaderDecoder, WorldBounds, WorldHeader, WorldProperties,
    MAX_SUPPORTED_VERSION, MIN_SUPPORTED_VERSION,
};
pub use profile::{FormatProfile, IdWidth};
pub use stream::{RunLengthEntry, Runs, TileStream};
pub use tile::{
    Block, BlockShape, Cell, Coating, Frame, Liquid, LiquidKind, TilePos, TileRecord, Wall,
    Wiring,
};
