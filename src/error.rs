#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("not a world file: signature {magic:#018x}")]
    NotAWorldFile { magic: u64 },

    #[error("unsupported world version {version} (supported {min}..={max})")]
    UnsupportedVersion { version: i32, min: i32, max: i32 },

    #[error("unexpected end of data at offset {offset}: need {needed} bytes, have {available}")]
    UnexpectedEndOfData { offset: usize, needed: usize, available: usize },

    #[error("offset {offset} out of range (buffer is {len} bytes)")]
    OffsetOutOfRange { offset: usize, len: usize },

    #[error("section {index} starts at {offset}, not after previous section at {previous}")]
    SectionOrder { index: usize, offset: u32, previous: u32 },

    #[error("pointer table has {count} sections, need at least {required}")]
    MissingSection { count: usize, required: usize },

    #[error("invalid world dimensions {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },

    #[error("malformed run length at ({x}, {y}): run of {count} with {remaining} rows left")]
    MalformedRunLength { x: u32, y: u32, count: u32, remaining: u32 },

    #[error("tile stream already advanced to ({x}, {y}), a grid needs a fresh stream")]
    StreamInProgress { x: u32, y: u32 },

    #[error("tile stream ended after {decoded} of {expected} cells")]
    IncompleteGrid { expected: u64, decoded: u64 },

    #[error("cannot allocate a grid of {cells} cells")]
    GridTooLarge { cells: u64 },

    #[error("decode cancelled at column {column}")]
    Cancelled { column: u32 },

    #[error("cannot encode tile record: {0}")]
    Unencodable(&'static str),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
