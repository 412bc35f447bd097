#![warn(clippy::pedantic)]

pub mod error;
pub mod identifier;
pub mod scalar;
pub mod vtable;

pub use error::FlatError;
pub use identifier::FileIdentifier;
pub use scalar::Scalar;
pub use vtable::VTable;
