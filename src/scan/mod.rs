//! Searching decoded worlds for a tile type and reporting the result.

pub mod batch;
pub mod names;
pub mod report;
pub mod scanner;

pub use batch::{scan_file, scan_file_with_cancel, scan_paths};
pub use names::{display_name, resolve_tile, tile_name, DEFAULT_TARGET};
pub use report::{DetectionReport, TargetInfo};
pub use scanner::{DetectionResult, TileCensus, TileScanner};
