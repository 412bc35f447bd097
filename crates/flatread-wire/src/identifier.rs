use crate::error::FlatError;

/// Length of a file identifier in bytes.
pub const FILE_IDENTIFIER_LEN: usize = 4;

/// Distance from the buffer position to the identifier: it sits right after
/// the 4-byte root offset.
pub const FILE_IDENTIFIER_OFFSET: usize = 4;

/// A 4-byte ASCII file identifier, e.g. `TFL3`.
///
/// Stored as raw bytes so comparison never depends on byte order.
///
/// ```text
/// ┌────────┬─────────┬───────────────────────────────┐
/// │ Offset │ Size    │ Description                   │
/// ├────────┼─────────┼───────────────────────────────┤
/// │ +0     │ 4 bytes │ Root table offset (i32)       │
/// │ +4     │ 4 bytes │ File identifier (optional)    │
/// └────────┴─────────┴───────────────────────────────┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FileIdentifier([u8; FILE_IDENTIFIER_LEN]);

impl FileIdentifier {
    /// Wrap raw identifier bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; FILE_IDENTIFIER_LEN]) -> Self {
        Self(bytes)
    }

    /// The raw identifier bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; FILE_IDENTIFIER_LEN] {
        &self.0
    }
}

impl TryFrom<&str> for FileIdentifier {
    type Error = FlatError;

    fn try_from(text: &str) -> Result<Self, Self::Error> {
        let bytes: [u8; FILE_IDENTIFIER_LEN] = text
            .as_bytes()
            .try_into()
            .map_err(|_| FlatError::InvalidIdentifierLength { len: text.len() })?;
        Ok(Self(bytes))
    }
}

impl std::fmt::Display for FileIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

/// Read the identifier of the buffer rooted at `position`, if the buffer is
/// long enough to hold one.
#[must_use]
pub fn read_identifier(buf: &[u8], position: usize) -> Option<FileIdentifier> {
    let start = position.checked_add(FILE_IDENTIFIER_OFFSET)?;
    let end = start.checked_add(FILE_IDENTIFIER_LEN)?;
    let bytes: [u8; FILE_IDENTIFIER_LEN] = buf.get(start..end)?.try_into().ok()?;
    Some(FileIdentifier::from_bytes(bytes))
}

/// Check whether the buffer rooted at `position` carries `ident`.
///
/// A buffer too short to hold an identifier simply does not match.
///
/// # Errors
///
/// Returns [`FlatError::InvalidIdentifierLength`] if `ident` is not exactly
/// 4 bytes. That is a caller mistake and is reported whatever the buffer
/// holds.
pub fn has_identifier(buf: &[u8], position: usize, ident: &str) -> Result<bool, FlatError> {
    let expected = FileIdentifier::try_from(ident)?;
    Ok(read_identifier(buf, position) == Some(expected))
}
