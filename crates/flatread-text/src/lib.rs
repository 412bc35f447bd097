#![warn(clippy::pedantic)]

pub mod text_reader;

pub use flatread_wire::FlatError;
pub use text_reader::TextReader;
