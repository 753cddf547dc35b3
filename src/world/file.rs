use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use memmap2::Mmap;

use crate::codec::ByteCursor;
use crate::error::Result;
use super::frames::FrameImportanceTable;
use super::grid::WorldGrid;
use super::header::{HeaderDecoder, WorldHeader};
use super::profile::FormatProfile;
use super::stream::TileStream;

enum Backing {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

/// A world file's bytes, either memory-mapped or owned.
pub struct WorldFile {
    path: Option<PathBuf>,
    backing: Backing,
}

impl WorldFile {
    /// Map a file read-only.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        // SAFETY: the map is read-only and dropped with `self`. The file is
        // expected to stay unchanged while it is being decoded; a writer
        // truncating it underneath us is outside this crate's control.
        let map = unsafe { Mmap::map(&file)? };
        Ok(Self {
            path: Some(path.to_path_buf()),
            backing: Backing::Mapped(map),
        })
    }

    /// Read the whole file into memory instead of mapping it.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        Ok(Self {
            path: Some(path.to_path_buf()),
            backing: Backing::Owned(data),
        })
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { path: None, backing: Backing::Owned(data) }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn as_bytes(&self) -> &[u8] {
        match &self.backing {
            Backing::Mapped(map) => map,
            Backing::Owned(data) => data,
        }
    }

    pub fn reader(&self) -> Result<WorldReader<'_>> {
        WorldReader::new(self.as_bytes())
    }
}

/// Decoded header and frame table over a borrowed buffer, ready to hand
/// out tile streams.
pub struct WorldReader<'a> {
    data: &'a [u8],
    header: WorldHeader,
    frames: FrameImportanceTable,
    profile: FormatProfile,
}

impl<'a> WorldReader<'a> {
    pub fn new(data: &'a [u8]) -> Result<Self> {
        let mut cursor = ByteCursor::new(data);
        let header = HeaderDecoder::decode(&mut cursor)?;

        cursor.seek(header.frame_table_offset)?;
        let frames = FrameImportanceTable::decode(&mut cursor)?;
        let profile = FormatProfile::from_header(&header, &frames);
        tracing::debug!(?profile, frame_types = frames.len(), "format profile");

        Ok(Self { data, header, frames, profile })
    }

    pub fn header(&self) -> &WorldHeader {
        &self.header
    }

    pub fn frames(&self) -> &FrameImportanceTable {
        &self.frames
    }

    pub fn profile(&self) -> &FormatProfile {
        &self.profile
    }

    /// Lazy stream over the tile section.
    pub fn tiles(&self) -> Result<TileStream<'_>> {
        let mut cursor = ByteCursor::new(self.data);
        cursor.seek(self.header.tiles_offset())?;
        Ok(TileStream::new(
            cursor,
            self.header.width(),
            self.header.height(),
            self.profile,
            &self.frames,
        ))
    }

    /// Like [`tiles`](Self::tiles), stopping with `Cancelled` once `flag`
    /// is set.
    pub fn tiles_with_cancel<'s>(&'s self, flag: &'s AtomicBool) -> Result<TileStream<'s>> {
        Ok(self.tiles()?.with_cancel(flag))
    }

    pub fn load_grid(&self) -> Result<WorldGrid> {
        WorldGrid::from_stream(self.tiles()?)
    }
}
