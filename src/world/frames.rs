use crate::codec::{ByteCursor, ByteWriter};
use crate::error::Result;

/// One bit per tile type: set when instances of that type store their
/// sprite frame (u, v) in the tile stream.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrameImportanceTable {
    bits: Vec<u8>,
    count: usize,
}

impl FrameImportanceTable {
    /// Decode the table: u16 bit count, then the bits packed LSB first.
    pub fn decode(cursor: &mut ByteCursor) -> Result<Self> {
        let count = cursor.read_u16()? as usize;
        let bits = cursor.read_bytes(count.div_ceil(8))?.to_vec();
        Ok(Self { bits, count })
    }

    /// Build a table of `count` tile types with the given ids flagged.
    /// Ids at or past `count` are ignored.
    pub fn from_ids(count: usize, ids: impl IntoIterator<Item = u16>) -> Self {
        let mut bits = vec![0u8; count.div_ceil(8)];
        for id in ids {
            let id = id as usize;
            if id < count {
                bits[id / 8] |= 1 << (id % 8);
            }
        }
        Self { bits, count }
    }

    pub fn encode(&self, writer: &mut ByteWriter) {
        writer.write_u16(self.count as u16);
        writer.write_bytes(&self.bits);
    }

    /// Number of tile types the table covers.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_frame_important(&self, id: u16) -> bool {
        let id = id as usize;
        id < self.count && self.bits[id / 8] & (1 << (id % 8)) != 0
    }

    pub fn important_ids(&self) -> impl Iterator<Item = u16> + '_ {
        (0..self.count as u32)
            .map(|id| id as u16)
            .filter(|&id| self.is_frame_important(id))
    }
}
