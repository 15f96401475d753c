//! PWS3 file encoding.
//!
//! The reader and writer work on whole in-memory buffers; `Document` adds
//! the stream and path handling on top.

pub mod format;
pub mod reader;
pub mod writer;

pub use reader::{read_document, Credentials, ParsedDocument};
pub use writer::write_document;
