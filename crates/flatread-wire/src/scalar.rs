use crate::error::FlatError;

/// A fixed-width little-endian value that can be read straight out of a
/// buffer.
///
/// | Type  | Size | Notes                                 |
/// |-------|------|---------------------------------------|
/// | bool  | 1    | any non-zero byte is `true`           |
/// | i8    | 1    | sign-extended from the raw byte       |
/// | u8    | 1    |                                       |
/// | i16   | 2    |                                       |
/// | u16   | 2    | vtable entries                        |
/// | i32   | 4    | every stored reference                |
/// | u32   | 4    | vector lengths                        |
/// | i64   | 8    |                                       |
/// | u64   | 8    |                                       |
/// | f32   | 4    | IEEE 754 bits                         |
/// | f64   | 8    | IEEE 754 bits                         |
pub trait Scalar: Copy + Sized {
    /// Encoded width in bytes.
    const SIZE: usize;

    /// Decode from exactly [`Self::SIZE`] little-endian bytes.
    ///
    /// # Panics
    ///
    /// Panics if `bytes.len() != Self::SIZE`. Callers get the slice from
    /// [`span`], which already guarantees the length.
    fn from_le_slice(bytes: &[u8]) -> Self;
}

macro_rules! impl_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                fn from_le_slice(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_le_bytes(raw)
                }
            }
        )*
    };
}

impl_scalar!(i8, u8, i16, u16, i32, u32, i64, u64, f32, f64);

impl Scalar for bool {
    const SIZE: usize = 1;

    fn from_le_slice(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

/// Borrow `len` bytes starting at `offset`, or fail if that runs past the
/// end of `buf`.
///
/// # Errors
///
/// Returns [`FlatError::OutOfRange`] if `offset + len` overflows or exceeds
/// `buf.len()`.
pub fn span(buf: &[u8], offset: usize, len: usize) -> Result<&[u8], FlatError> {
    let out_of_range = FlatError::OutOfRange {
        offset,
        size: len,
        len: buf.len(),
    };
    let end = offset.checked_add(len).ok_or(out_of_range.clone())?;
    buf.get(offset..end).ok_or(out_of_range)
}

/// Read one little-endian scalar at an absolute offset.
///
/// # Errors
///
/// Returns [`FlatError::OutOfRange`] if the value does not fit inside `buf`.
pub fn read_scalar<T: Scalar>(buf: &[u8], offset: usize) -> Result<T, FlatError> {
    span(buf, offset, T::SIZE).map(T::from_le_slice)
}

/// Add a stored signed offset to the address it was read from.
///
/// Every reference in the format is relative to its own storage address,
/// so this is the single place where an `i32` turns into a position.
///
/// # Errors
///
/// Returns [`FlatError::OffsetOverflow`] if the result is negative or does
/// not fit in `usize`.
pub fn relative(base: usize, delta: i64) -> Result<usize, FlatError> {
    let overflow = FlatError::OffsetOverflow { base, delta };
    let base = i64::try_from(base).map_err(|_| overflow.clone())?;
    let target = base.checked_add(delta).ok_or(overflow.clone())?;
    usize::try_from(target).map_err(|_| overflow)
}

/// Read the `i32` at `offset` and resolve it relative to `offset`.
///
/// This is the indirection step shared by tables, vectors, strings and
/// union payloads: `offset + int32(offset)`.
///
/// # Errors
///
/// Propagates [`read_scalar`] and [`relative`] failures.
pub fn follow(buf: &[u8], offset: usize) -> Result<usize, FlatError> {
    let delta: i32 = read_scalar(buf, offset)?;
    relative(offset, i64::from(delta))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_integers() {
        let buf = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        assert_eq!(read_scalar::<u16>(&buf, 0).unwrap(), 0x0201);
        assert_eq!(read_scalar::<u32>(&buf, 0).unwrap(), 0x0403_0201);
        assert_eq!(read_scalar::<u64>(&buf, 0).unwrap(), 0x0807_0605_0403_0201);
        assert_eq!(read_scalar::<u32>(&buf, 4).unwrap(), 0x0807_0605);
    }

    #[test]
    fn int8_is_sign_extended() {
        let buf = [0xFF, 0x80, 0x7F];
        assert_eq!(read_scalar::<i8>(&buf, 0).unwrap(), -1);
        assert_eq!(read_scalar::<i8>(&buf, 1).unwrap(), -128);
        assert_eq!(read_scalar::<i8>(&buf, 2).unwrap(), 127);
        assert_eq!(read_scalar::<u8>(&buf, 0).unwrap(), 0xFF);
    }

    #[test]
    fn reads_floats() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&1.5f32.to_le_bytes());
        buf.extend_from_slice(&(-2.25f64).to_le_bytes());
        assert_eq!(read_scalar::<f32>(&buf, 0).unwrap(), 1.5);
        assert_eq!(read_scalar::<f64>(&buf, 4).unwrap(), -2.25);
    }

    #[test]
    fn bool_is_any_nonzero_byte() {
        let buf = [0x00, 0x01, 0x02];
        assert!(!read_scalar::<bool>(&buf, 0).unwrap());
        assert!(read_scalar::<bool>(&buf, 1).unwrap());
        assert!(read_scalar::<bool>(&buf, 2).unwrap());
    }

    #[test]
    fn read_past_end_is_out_of_range() {
        let buf = [0u8; 6];
        let result = read_scalar::<u32>(&buf, 4);
        assert_eq!(
            result,
            Err(FlatError::OutOfRange {
                offset: 4,
                size: 4,
                len: 6
            })
        );
    }

    #[test]
    fn span_guards_against_overflow() {
        let buf = [0u8; 4];
        assert!(matches!(
            span(&buf, usize::MAX, 2),
            Err(FlatError::OutOfRange { .. })
        ));
        assert_eq!(span(&buf, 4, 0).unwrap(), &[] as &[u8]);
    }

    #[test]
    fn relative_handles_both_directions() {
        assert_eq!(relative(8, 4).unwrap(), 12);
        assert_eq!(relative(8, -8).unwrap(), 0);
        assert_eq!(
            relative(8, -9),
            Err(FlatError::OffsetOverflow { base: 8, delta: -9 })
        );
    }

    #[test]
    fn follow_adds_offset_to_its_own_address() {
        // At offset 4 the stored i32 is 8, so the target is 4 + 8 = 12.
        let mut buf = vec![0u8; 16];
        buf[4..8].copy_from_slice(&8i32.to_le_bytes());
        assert_eq!(follow(&buf, 4).unwrap(), 12);

        buf[4..8].copy_from_slice(&(-4i32).to_le_bytes());
        assert_eq!(follow(&buf, 4).unwrap(), 0);
    }
}
