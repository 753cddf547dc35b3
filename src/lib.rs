//! World-save scanner
//!
//! Decodes the versioned binary `.wld` world format (header, pointer table,
//! frame-importance table and the run-length encoded tile section) and
//! searches the decoded tiles for a given tile type.

pub mod codec;
pub mod error;
pub mod scan;
pub mod world;

pub use error::{Error, Result};
pub use scan::{DetectionReport, DetectionResult, TileCensus, TileScanner};
pub use world::{
    TilePos, TileRecord, TileStream, WorldFile, WorldGrid, WorldHeader, WorldReader,
};
