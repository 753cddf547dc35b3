pub mod cursor;
pub mod writer;

pub use cursor::ByteCursor;
pub use writer::ByteWriter;
