//! World-save prelude, pointer table and world-properties section.
//!
//! Layout at offset 0:
//! - u64 signature: ASCII `relogic` in the low 56 bits, file type in the top byte
//! - i32 version
//! - version-dependent metadata (u32 revision + u64 favorite flags)
//! - u16 section count followed by that many u32 section offsets
//! - the frame-importance table (see [`super::frames`])
//!
//! Section 0 holds the world properties (name, seed, bounds, dimensions).

use serde::Serialize;
use tracing::debug;

use crate::codec::ByteCursor;
use crate::error::{Error, Result};

/// `relogic` as a little-endian integer.
pub const MAGIC_SIGNATURE: u64 = 0x0063_6967_6F6C_6572;
const MAGIC_MASK: u64 = 0x00FF_FFFF_FFFF_FFFF;
/// File type byte for worlds (players and maps use other values).
pub const WORLD_FILE_TYPE: u8 = 2;

/// The pointer table appeared in this version.
pub const MIN_SUPPORTED_VERSION: i32 = 88;
/// 1.4.4.9
pub const MAX_SUPPORTED_VERSION: i32 = 279;

const METADATA_VERSION: i32 = 135;
const SEED_VERSION: i32 = 179;
const GUID_VERSION: i32 = 181;

pub const SECTION_PROPERTIES: usize = 0;
pub const SECTION_TILES: usize = 1;
const REQUIRED_SECTIONS: usize = 2;

/// Largest width or height accepted from a header.
pub const MAX_WORLD_DIMENSION: i32 = 65_535;

/// Bytes between the version field and the pointer table.
pub fn metadata_len(version: i32) -> usize {
    if version >= METADATA_VERSION { 12 } else { 0 }
}

/// Combine the signature and a file type into the on-disk magic value.
pub fn magic_for(file_type: u8) -> u64 {
    MAGIC_SIGNATURE | ((file_type as u64) << 56)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FileMetadata {
    pub revision: u32,
    pub favorite: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct WorldBounds {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorldProperties {
    pub name: String,
    pub seed: Option<String>,
    pub generator_version: Option<u64>,
    pub guid: Option<[u8; 16]>,
    pub world_id: i32,
    pub bounds: WorldBounds,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorldHeader {
    pub version: i32,
    pub metadata: Option<FileMetadata>,
    /// Section offsets, strictly increasing and within the file.
    pub sections: Vec<u32>,
    pub frame_table_offset: usize,
    pub properties: WorldProperties,
}

impl WorldHeader {
    pub fn width(&self) -> u32 {
        self.properties.width
    }

    pub fn height(&self) -> u32 {
        self.properties.height
    }

    pub fn name(&self) -> &str {
        &self.properties.name
    }

    pub fn section(&self, index: usize) -> Option<usize> {
        self.sections.get(index).map(|&o| o as usize)
    }

    pub fn tiles_offset(&self) -> usize {
        self.sections[SECTION_TILES] as usize
    }

    pub fn cell_count(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }
}

/// Decodes the prelude, pointer table and world-properties section.
pub struct HeaderDecoder;

impl HeaderDecoder {
    /// Decode a header from a cursor at offset 0.
    ///
    /// On success the cursor is left at the end of the properties fields.
    pub fn decode(cursor: &mut ByteCursor) -> Result<WorldHeader> {
        let magic = cursor.read_u64()?;
        if magic & MAGIC_MASK != MAGIC_SIGNATURE || (magic >> 56) as u8 != WORLD_FILE_TYPE {
            return Err(Error::NotAWorldFile { magic });
        }

        // The version decides every layout below, so it is gated first.
        let version = cursor.read_i32()?;
        if !(MIN_SUPPORTED_VERSION..=MAX_SUPPORTED_VERSION).contains(&version) {
            return Err(Error::UnsupportedVersion {
                version,
                min: MIN_SUPPORTED_VERSION,
                max: MAX_SUPPORTED_VERSION,
            });
        }

        let metadata = if metadata_len(version) > 0 {
            Some(FileMetadata {
                revision: cursor.read_u32()?,
                favorite: cursor.read_u64()?,
            })
        } else {
            None
        };

        let sections = read_pointer_table(cursor)?;
        let frame_table_offset = cursor.position();

        cursor.seek(sections[SECTION_PROPERTIES] as usize)?;
        let properties = read_properties(cursor, version)?;

        debug!(
            version,
            sections = sections.len(),
            width = properties.width,
            height = properties.height,
            name = %properties.name,
            "decoded world header"
        );

        Ok(WorldHeader {
            version,
            metadata,
            sections,
            frame_table_offset,
            properties,
        })
    }
}

fn read_pointer_table(cursor: &mut ByteCursor) -> Result<Vec<u32>> {
    let count = cursor.read_u16()? as usize;
    if count < REQUIRED_SECTIONS {
        return Err(Error::MissingSection { count, required: REQUIRED_SECTIONS });
    }

    let mut sections = Vec::with_capacity(count);
    for index in 0..count {
        let offset = cursor.read_u32()?;
        if offset as usize > cursor.len() {
            return Err(Error::OffsetOutOfRange { offset: offset as usize, len: cursor.len() });
        }
        if let Some(&previous) = sections.last() {
            if offset <= previous {
                return Err(Error::SectionOrder { index, offset, previous });
            }
        }
        sections.push(offset);
    }
    Ok(sections)
}

fn read_properties(cursor: &mut ByteCursor, version: i32) -> Result<WorldProperties> {
    let name = cursor.read_string()?;

    let (seed, generator_version) = if version >= SEED_VERSION {
        let seed = if version == SEED_VERSION {
            cursor.read_i32()?.to_string()
        } else {
            cursor.read_string()?
        };
        (Some(seed), Some(cursor.read_u64()?))
    } else {
        (None, None)
    };

    let guid = if version >= GUID_VERSION {
        let mut guid = [0u8; 16];
        guid.copy_from_slice(cursor.read_bytes(16)?);
        Some(guid)
    } else {
        None
    };

    let world_id = cursor.read_i32()?;
    let bounds = WorldBounds {
        left: cursor.read_i32()?,
        right: cursor.read_i32()?,
        top: cursor.read_i32()?,
        bottom: cursor.read_i32()?,
    };
    let height = cursor.read_i32()?;
    let width = cursor.read_i32()?;

    let valid = 1..=MAX_WORLD_DIMENSION;
    if !valid.contains(&width) || !valid.contains(&height) {
        return Err(Error::InvalidDimensions { width, height });
    }

    Ok(WorldProperties {
        name,
        seed,
        generator_version,
        guid,
        world_id,
        bounds,
        width: width as u32,
        height: height as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ByteWriter;
    use crate::world::encoder::{WorldEncoder, WorldSpec};

    fn encode(spec: WorldSpec) -> Vec<u8> {
        WorldEncoder::new(spec).finish().unwrap()
    }

    #[test]
    fn test_decode_header_fields() {
        let mut spec = WorldSpec::new(7, 5);
        spec.name = "Dune Sea".into();
        spec.seed = "12345".into();
        let data = encode(spec);

        let mut cursor = ByteCursor::new(&data);
        let header = HeaderDecoder::decode(&mut cursor).unwrap();

        assert_eq!(header.version, MAX_SUPPORTED_VERSION);
        assert_eq!(header.name(), "Dune Sea");
        assert_eq!(header.properties.seed.as_deref(), Some("12345"));
        assert_eq!(header.width(), 7);
        assert_eq!(header.height(), 5);
        assert_eq!(header.cell_count(), 35);
        assert!(header.metadata.is_some());
        assert!(header.properties.guid.is_some());
        assert_eq!(header.sections.len(), 2);
        assert!(header.frame_table_offset < header.sections[0] as usize);
    }

    #[test]
    fn test_old_version_has_no_metadata_or_seed() {
        let mut spec = WorldSpec::new(3, 3);
        spec.version = 120;
        let data = encode(spec);

        let mut cursor = ByteCursor::new(&data);
        let header = HeaderDecoder::decode(&mut cursor).unwrap();
        assert_eq!(header.version, 120);
        assert_eq!(header.metadata, None);
        assert_eq!(header.properties.seed, None);
        assert_eq!(header.properties.guid, None);
    }

    #[test]
    fn test_version_179_reads_numeric_seed() {
        let mut spec = WorldSpec::new(2, 2);
        spec.version = 179;
        spec.seed = "987".into();
        let data = encode(spec);

        let mut cursor = ByteCursor::new(&data);
        let header = HeaderDecoder::decode(&mut cursor).unwrap();
        assert_eq!(header.properties.seed.as_deref(), Some("987"));
        assert_eq!(header.properties.guid, None);
    }

    #[test]
    fn test_bad_magic() {
        let mut data = encode(WorldSpec::new(2, 2));
        data[0] = b'x';
        let mut cursor = ByteCursor::new(&data);
        assert!(matches!(
            HeaderDecoder::decode(&mut cursor),
            Err(Error::NotAWorldFile { .. })
        ));
    }

    #[test]
    fn test_wrong_file_type() {
        let mut data = encode(WorldSpec::new(2, 2));
        data[7] = 3;
        let mut cursor = ByteCursor::new(&data);
        assert!(matches!(
            HeaderDecoder::decode(&mut cursor),
            Err(Error::NotAWorldFile { .. })
        ));
    }

    #[test]
    fn test_version_above_supported() {
        // Nothing past the version field is needed to reject the file.
        let mut writer = ByteWriter::new();
        writer.write_u64(magic_for(WORLD_FILE_TYPE));
        writer.write_i32(MAX_SUPPORTED_VERSION + 1);
        let data = writer.into_vec();

        let mut cursor = ByteCursor::new(&data);
        match HeaderDecoder::decode(&mut cursor) {
            Err(Error::UnsupportedVersion { version, .. }) => {
                assert_eq!(version, MAX_SUPPORTED_VERSION + 1)
            }
            other => panic!("expected UnsupportedVersion, got {other:?}"),
        }
        assert_eq!(cursor.position(), 12);
    }

    #[test]
    fn test_version_below_supported() {
        let mut writer = ByteWriter::new();
        writer.write_u64(magic_for(WORLD_FILE_TYPE));
        writer.write_i32(MIN_SUPPORTED_VERSION - 1);
        let data = writer.into_vec();

        let mut cursor = ByteCursor::new(&data);
        assert!(matches!(
            HeaderDecoder::decode(&mut cursor),
            Err(Error::UnsupportedVersion { version: 87, .. })
        ));
    }

    fn prelude_with_sections(sections: &[u32]) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        writer.write_u64(magic_for(WORLD_FILE_TYPE));
        writer.write_i32(MAX_SUPPORTED_VERSION);
        writer.write_u32(1);
        writer.write_u64(0);
        writer.write_u16(sections.len() as u16);
        for &s in sections {
            writer.write_u32(s);
        }
        writer.write_bytes(&[0u8; 64]);
        writer.into_vec()
    }

    #[test]
    fn test_too_few_sections() {
        let data = prelude_with_sections(&[30]);
        let mut cursor = ByteCursor::new(&data);
        assert!(matches!(
            HeaderDecoder::decode(&mut cursor),
            Err(Error::MissingSection { count: 1, required: 2 })
        ));
    }

    #[test]
    fn test_section_past_end() {
        let data = prelude_with_sections(&[40, 10_000]);
        let mut cursor = ByteCursor::new(&data);
        assert!(matches!(
            HeaderDecoder::decode(&mut cursor),
            Err(Error::OffsetOutOfRange { offset: 10_000, .. })
        ));
    }

    #[test]
    fn test_sections_not_increasing() {
        let data = prelude_with_sections(&[40, 40]);
        let mut cursor = ByteCursor::new(&data);
        assert!(matches!(
            HeaderDecoder::decode(&mut cursor),
            Err(Error::SectionOrder { index: 1, offset: 40, previous: 40 })
        ));
    }

    #[test]
    fn test_zero_width_rejected() {
        let data = encode(WorldSpec::new(0, 1));
        let mut cursor = ByteCursor::new(&data);
        assert!(matches!(
            HeaderDecoder::decode(&mut cursor),
            Err(Error::InvalidDimensions { width: 0, height: 1 })
        ));
    }
}
