use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use tracing::debug;

use super::scanner::{DetectionResult, TileScanner};
use crate::error::Result;
use crate::world::WorldFile;

/// Map `path` and scan its tile section without building a grid.
pub fn scan_file(path: &Path, scanner: &TileScanner) -> Result<DetectionResult> {
    let file = WorldFile::open(path)?;
    let reader = file.reader()?;
    debug!(path = %path.display(), world = reader.header().name(), "scanning");
    let tiles = reader.tiles()?;
    scanner.scan_stream(tiles)
}

/// Like [`scan_file`], giving up with `Cancelled` once `cancel` is set.
pub fn scan_file_with_cancel(
    path: &Path,
    scanner: &TileScanner,
    cancel: &AtomicBool,
) -> Result<DetectionResult> {
    let file = WorldFile::open(path)?;
    let reader = file.reader()?;
    let tiles = reader.tiles_with_cancel(cancel)?;
    scanner.scan_stream(tiles)
}

/// Scan several files in parallel on the rayon pool. Results come back
/// in input order.
pub fn scan_paths(
    paths: &[PathBuf],
    scanner: &TileScanner,
) -> Vec<(PathBuf, Result<DetectionResult>)> {
    use rayon::prelude::*;

    paths
        .par_iter()
        .map(|path| (path.clone(), scan_file(path, scanner)))
        .collect()
}
