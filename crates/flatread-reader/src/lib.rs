#![warn(clippy::pedantic)]

pub mod config;
pub mod reader;
pub mod typed_array;
pub mod utf8;

pub use config::{ReaderOptions, StringEncoding, StringValue, Utf8Mode};
pub use flatread_wire::vtable::slot_offset;
pub use flatread_wire::{FileIdentifier, FlatError, Scalar};
pub use reader::Reader;
pub use typed_array::TypedArray;
