/// The one error kind raised by every flatread reader.
///
/// Both the binary `Reader` and the `TextReader` surface failures through
/// this enum, so schema decode callbacks can propagate with `?` no matter
/// which backend they were handed.
///
/// ```text
///   FlatError
///   ├── OutOfRange               ← read would run past the end of the buffer
///   ├── OffsetOverflow           ← relative offset points before byte 0
///   ├── InvalidIdentifierLength  ← caller passed a non 4-byte identifier
///   ├── NotImplemented           ← union/struct arrays
///   ├── InvalidArray             ← text input is not an array
///   ├── InvalidUtf8              ← strict UTF-8 mode only
///   ├── InvalidText              ← text blob failed to parse
///   └── InvalidValue             ← text value has the wrong shape
/// ```
///
/// Absent fields and short vtables are not errors; they resolve to the
/// caller's default.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlatError {
    /// A read of `size` bytes at `offset` would pass the end of the buffer.
    #[error("read of {size} bytes at offset {offset} is out of range for a {len}-byte buffer")]
    OutOfRange {
        offset: usize,
        size: usize,
        len: usize,
    },

    /// Adding a stored relative offset to its base produced an address
    /// below zero or beyond `usize`.
    #[error("relative offset {delta:+} from {base} leaves the buffer")]
    OffsetOverflow { base: usize, delta: i64 },

    /// The file identifier argument was not exactly 4 bytes long.
    #[error("file identifier must be 4 characters in length, got {len}")]
    InvalidIdentifierLength { len: usize },

    /// The operation has no decoding strategy.
    #[error("{operation} is not implemented")]
    NotImplemented { operation: &'static str },

    /// A text-tree value handed to an array accessor was not an array.
    #[error("invalid {kind} array")]
    InvalidArray { kind: &'static str },

    /// String bytes failed UTF-8 validation (strict mode).
    #[error("invalid UTF-8 in string at offset {offset}")]
    InvalidUtf8 { offset: usize },

    /// The text blob could not be parsed into a value tree.
    #[error("invalid text: {0}")]
    InvalidText(String),

    /// A present text value could not be converted to the requested type.
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

impl FlatError {
    /// True for both bounds violations: reads past the end and offsets that
    /// point before the start.
    #[must_use]
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, Self::OutOfRange { .. } | Self::OffsetOverflow { .. })
    }
}
