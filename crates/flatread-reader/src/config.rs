/// Configuration for a [`Reader`](crate::Reader).
///
/// Controls how string payloads are surfaced. Everything else the reader
/// does is fixed by the wire format.
///
/// ```text
/// ┌──────────┬────────────┬──────────────────────────────────────────────┐
/// │ Field    │ Default    │ Purpose                                      │
/// ├──────────┼────────────┼──────────────────────────────────────────────┤
/// │ utf8     │ Permissive │ Whether string bytes are validated           │
/// │ encoding │ Text       │ Decoded text or raw bytes for string fields  │
/// └──────────┴────────────┴──────────────────────────────────────────────┘
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReaderOptions {
    /// UTF-8 handling for decoded strings.
    pub utf8: Utf8Mode,

    /// Encoding used by [`Reader::string_value_field`](crate::Reader::string_value_field)
    /// when no explicit encoding is passed.
    pub encoding: StringEncoding,
}

/// How string bytes are turned into text.
///
/// ```text
/// ┌────────────┬──────────────────────────────────────────────────────┐
/// │ Mode       │ Behavior                                             │
/// ├────────────┼──────────────────────────────────────────────────────┤
/// │ Permissive │ Continuation bytes are trusted; code points that a   │
/// │            │ `char` cannot hold become U+FFFD. Never fails.       │
/// │ Strict     │ Bytes must be valid UTF-8 or the read fails with     │
/// │            │ `FlatError::InvalidUtf8`.                            │
/// └────────────┴──────────────────────────────────────────────────────┘
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Utf8Mode {
    #[default]
    Permissive,
    Strict,
}

/// Whether a string is decoded or handed back as the raw byte span.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StringEncoding {
    /// Decode to an owned `String`.
    #[default]
    Text,
    /// Borrow the UTF-8 bytes straight from the buffer.
    Raw,
}

/// A string read under a caller-chosen [`StringEncoding`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StringValue<'a> {
    Text(String),
    Raw(&'a [u8]),
}

impl StringValue<'_> {
    /// The string as text, decoding raw bytes lossily if needed.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Raw(bytes) => crate::utf8::decode_lossy(bytes),
        }
    }

    /// The string's UTF-8 bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Raw(bytes) => bytes,
        }
    }
}
