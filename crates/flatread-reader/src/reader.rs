use flatread_wire::identifier::has_identifier;
use flatread_wire::scalar::{follow, read_scalar, span};
use flatread_wire::{FlatError, Scalar, VTable};

use crate::config::{ReaderOptions, StringEncoding, StringValue, Utf8Mode};
use crate::typed_array::TypedArray;
use crate::utf8;

/// Width of a stored reference and of a vector's length prefix.
const UOFFSET_SIZE: usize = 4;

/// Read-only cursor over a flat, offset-addressed buffer.
///
/// A `Reader` borrows the buffer for its whole lifetime and never copies
/// it. Positions are plain byte indices into that buffer; the same bytes
/// are reinterpreted as whatever type the accessing field says they are.
/// Every absolute read is bounds-checked, so a truncated or corrupt buffer
/// produces [`FlatError::OutOfRange`] instead of a panic.
///
/// Schema-specific code drives decoding. It calls [`root`](Self::root),
/// then pulls fields out of each table with the `*_field` accessors, using
/// the slot offsets its schema assigns and the defaults its schema
/// declares. Nested tables, structs and unions are handed back to the
/// caller through decode callbacks:
///
/// ```
/// use flatread_reader::{FlatError, Reader, slot_offset};
///
/// struct Tensor {
///     rank: u32,
/// }
///
/// impl Tensor {
///     const RANK: u16 = slot_offset(0);
///
///     fn decode(reader: &Reader<'_>, position: usize) -> Result<Self, FlatError> {
///         Ok(Self {
///             rank: reader.uint32_field(position, Self::RANK, 1)?,
///         })
///     }
/// }
///
/// // root offset, vtable [6, 8, 4], table [soffset, rank=3]
/// let buf = [
///     12, 0, 0, 0, 6, 0, 8, 0, 4, 0, 0, 0, //
///     8, 0, 0, 0, 3, 0, 0, 0,
/// ];
/// let reader = Reader::new(&buf);
/// let tensor = Tensor::decode(&reader, reader.root()?)?;
/// assert_eq!(tensor.rank, 3);
/// # Ok::<(), FlatError>(())
/// ```
///
/// Nothing is cached between calls: reading a field twice decodes it
/// twice.
#[derive(Clone, Copy, Debug)]
pub struct Reader<'a> {
    buf: &'a [u8],
    position: usize,
    options: ReaderOptions,
}

/// Generates the absolute-offset read and the vtable-field read for one
/// scalar type.
macro_rules! scalar_accessors {
    ($($ty:ty => $read:ident, $field:ident;)*) => {
        $(
            #[doc = concat!("Read a `", stringify!($ty), "` at an absolute offset.")]
            ///
            /// # Errors
            ///
            /// Returns [`FlatError::OutOfRange`] if the value does not fit in the buffer.
            pub fn $read(&self, offset: usize) -> Result<$ty, FlatError> {
                self.scalar(offset)
            }

            #[doc = concat!("Read a `", stringify!($ty), "` field of the table at `position`,")]
            /// falling back to `default` when the field is absent.
            ///
            /// # Errors
            ///
            /// Propagates vtable and bounds failures.
            pub fn $field(
                &self,
                position: usize,
                slot: u16,
                default: $ty,
            ) -> Result<$ty, FlatError> {
                self.scalar_field(position, slot, default)
            }
        )*
    };
}

impl<'a> Reader<'a> {
    /// Bind a reader to `buf` with default options.
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Self::with_options(buf, ReaderOptions::default())
    }

    /// Bind a reader to `buf` with explicit options.
    #[must_use]
    pub fn with_options(buf: &'a [u8], options: ReaderOptions) -> Self {
        tracing::trace!(len = buf.len(), ?options, "binary reader bound");
        Self {
            buf,
            position: 0,
            options,
        }
    }

    /// Bind to a buffer embedded at `position` inside `buf`.
    ///
    /// [`root`](Self::root) and [`identifier`](Self::identifier) are read
    /// relative to `position`; every other accessor takes absolute offsets.
    #[must_use]
    pub fn at(buf: &'a [u8], position: usize) -> Self {
        Self::at_with_options(buf, position, ReaderOptions::default())
    }

    /// [`at`](Self::at) with explicit options.
    #[must_use]
    pub fn at_with_options(buf: &'a [u8], position: usize, options: ReaderOptions) -> Self {
        Self {
            position,
            ..Self::with_options(buf, options)
        }
    }

    /// Bind to a size-prefixed buffer: a `u32` byte count followed by that
    /// many bytes of ordinary buffer.
    ///
    /// The reader only sees the declared bytes, so references that point
    /// past the declared size fail as out of range.
    ///
    /// # Errors
    ///
    /// Returns [`FlatError::OutOfRange`] if the prefix is missing or claims
    /// more bytes than `buf` holds.
    pub fn size_prefixed(buf: &'a [u8]) -> Result<Self, FlatError> {
        Self::size_prefixed_with_options(buf, ReaderOptions::default())
    }

    /// [`size_prefixed`](Self::size_prefixed) with explicit options.
    ///
    /// # Errors
    ///
    /// Same as [`size_prefixed`](Self::size_prefixed).
    pub fn size_prefixed_with_options(
        buf: &'a [u8],
        options: ReaderOptions,
    ) -> Result<Self, FlatError> {
        let size: u32 = read_scalar(buf, 0)?;
        let size = usize::try_from(size).map_err(|_| FlatError::OutOfRange {
            offset: UOFFSET_SIZE,
            size: usize::MAX,
            len: buf.len(),
        })?;
        Ok(Self::with_options(span(buf, UOFFSET_SIZE, size)?, options))
    }

    /// The borrowed buffer.
    #[must_use]
    pub fn buffer(&self) -> &'a [u8] {
        self.buf
    }

    /// Start position of the buffer this reader was bound to.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Options this reader was bound with.
    #[must_use]
    pub fn options(&self) -> ReaderOptions {
        self.options
    }

    /// Absolute position of the root table: `position + int32(position)`.
    ///
    /// # Errors
    ///
    /// Fails if the root offset is missing or points outside the buffer's
    /// address space.
    pub fn root(&self) -> Result<usize, FlatError> {
        let root = follow(self.buf, self.position)?;
        tracing::trace!(root, "root table resolved");
        Ok(root)
    }

    /// Check the 4-byte file identifier stored right after the root offset.
    ///
    /// Returns `Ok(false)` when the buffer is too short to hold one.
    ///
    /// # Errors
    ///
    /// Returns [`FlatError::InvalidIdentifierLength`] if `ident` is not 4
    /// bytes long.
    pub fn identifier(&self, ident: &str) -> Result<bool, FlatError> {
        has_identifier(self.buf, self.position, ident)
    }

    // ── Scalars ───────────────────────────────────────────────────────────

    /// Read any [`Scalar`] at an absolute offset.
    ///
    /// # Errors
    ///
    /// Returns [`FlatError::OutOfRange`] if the value does not fit in the buffer.
    pub fn scalar<T: Scalar>(&self, offset: usize) -> Result<T, FlatError> {
        read_scalar(self.buf, offset)
    }

    /// Read a scalar field of the table at `position`.
    ///
    /// `default` comes back untouched when the vtable slot is 0 or lies
    /// beyond the vtable's declared length.
    ///
    /// # Errors
    ///
    /// Propagates vtable and bounds failures.
    pub fn scalar_field<T: Scalar>(
        &self,
        position: usize,
        slot: u16,
        default: T,
    ) -> Result<T, FlatError> {
        match self.field_offset(position, slot)? {
            0 => Ok(default),
            local => self.scalar(position + local),
        }
    }

    scalar_accessors! {
        bool => bool, bool_field;
        i8 => int8, int8_field;
        u8 => uint8, uint8_field;
        i16 => int16, int16_field;
        u16 => uint16, uint16_field;
        i32 => int32, int32_field;
        u32 => uint32, uint32_field;
        i64 => int64, int64_field;
        u64 => uint64, uint64_field;
        f32 => float32, float32_field;
        f64 => float64, float64_field;
    }

    // ── Offset resolution ─────────────────────────────────────────────────

    /// The vtable of the table at `position`.
    ///
    /// # Errors
    ///
    /// Propagates bounds failures from the soffset and vtable header.
    pub fn vtable(&self, position: usize) -> Result<VTable<'a>, FlatError> {
        VTable::for_table(self.buf, position)
    }

    /// Local offset of the field at `slot` inside the table at `position`,
    /// or 0 when the field is absent.
    ///
    /// The vtable is re-read on every call. Tables that share a vtable are
    /// legal, and older writers produce shorter vtables, so no layout is
    /// ever assumed.
    ///
    /// # Errors
    ///
    /// Propagates bounds failures from the vtable.
    pub fn field_offset(&self, position: usize, slot: u16) -> Result<usize, FlatError> {
        Ok(usize::from(self.vtable(position)?.slot(slot)?))
    }

    /// Follow the reference stored at `offset` to the table it points at.
    ///
    /// # Errors
    ///
    /// Propagates bounds and offset-overflow failures.
    pub fn indirect(&self, offset: usize) -> Result<usize, FlatError> {
        follow(self.buf, offset)
    }

    /// Position of the first element of the vector referenced at `offset`,
    /// past its 4-byte length prefix.
    ///
    /// # Errors
    ///
    /// Propagates bounds and offset-overflow failures.
    pub fn vector_start(&self, offset: usize) -> Result<usize, FlatError> {
        let header = self.indirect(offset)?;
        header
            .checked_add(UOFFSET_SIZE)
            .ok_or(FlatError::OffsetOverflow {
                base: header,
                delta: 4,
            })
    }

    /// Element count of the vector referenced at `offset`.
    ///
    /// # Errors
    ///
    /// Propagates bounds and offset-overflow failures.
    pub fn vector_len(&self, offset: usize) -> Result<usize, FlatError> {
        let header = self.indirect(offset)?;
        let len: u32 = self.scalar(header)?;
        usize::try_from(len).map_err(|_| FlatError::OutOfRange {
            offset: header,
            size: usize::MAX,
            len: self.buf.len(),
        })
    }

    /// Position of a union's payload, given the position of its reference.
    ///
    /// # Errors
    ///
    /// Propagates bounds and offset-overflow failures.
    pub fn union_payload(&self, offset: usize) -> Result<usize, FlatError> {
        self.indirect(offset)
    }

    /// Resolve the vector referenced at `offset` and check that `len`
    /// elements of `stride` bytes fit in the buffer. Returns
    /// `(first_element, len)`.
    ///
    /// The check happens before anything is allocated from `len`.
    fn vector_span(&self, offset: usize, stride: usize) -> Result<(usize, usize), FlatError> {
        let len = self.vector_len(offset)?;
        let start = self.vector_start(offset)?;
        let bytes = len.checked_mul(stride).ok_or(FlatError::OutOfRange {
            offset: start,
            size: usize::MAX,
            len: self.buf.len(),
        })?;
        span(self.buf, start, bytes)?;
        Ok((start, len))
    }

    /// [`vector_span`](Self::vector_span) for a table field, `None` when
    /// the field is absent.
    fn field_vector(
        &self,
        position: usize,
        slot: u16,
        stride: usize,
    ) -> Result<Option<(usize, usize)>, FlatError> {
        match self.field_offset(position, slot)? {
            0 => Ok(None),
            local => self.vector_span(position + local, stride).map(Some),
        }
    }

    // ── Strings ───────────────────────────────────────────────────────────

    /// Resolve the string referenced at `offset` to `(data_start, bytes)`.
    fn string_span(&self, offset: usize) -> Result<(usize, &'a [u8]), FlatError> {
        let len = self.vector_len(offset)?;
        let start = self.vector_start(offset)?;
        Ok((start, span(self.buf, start, len)?))
    }

    /// Decode the string referenced at `offset` to text, honoring the
    /// reader's [`Utf8Mode`].
    ///
    /// # Errors
    ///
    /// - [`FlatError::OutOfRange`] if the string runs past the buffer.
    /// - [`FlatError::InvalidUtf8`] in strict mode only.
    pub fn string(&self, offset: usize) -> Result<String, FlatError> {
        let (start, bytes) = self.string_span(offset)?;
        match self.options.utf8 {
            Utf8Mode::Permissive => Ok(utf8::decode_lossy(bytes)),
            Utf8Mode::Strict => utf8::decode_strict(bytes, start).inspect_err(|e| {
                tracing::debug!(error = %e, "strict UTF-8 decode rejected string");
            }),
        }
    }

    /// Borrow the raw UTF-8 bytes of the string referenced at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`FlatError::OutOfRange`] if the string runs past the buffer.
    pub fn string_bytes(&self, offset: usize) -> Result<&'a [u8], FlatError> {
        self.string_span(offset).map(|(_, bytes)| bytes)
    }

    /// Decode the string referenced at `offset` to UTF-16 code units, for
    /// hosts whose text type is 16-bit.
    ///
    /// # Errors
    ///
    /// Returns [`FlatError::OutOfRange`] if the string runs past the buffer.
    pub fn string_utf16(&self, offset: usize) -> Result<Vec<u16>, FlatError> {
        self.string_bytes(offset).map(utf8::decode_utf16)
    }

    /// Read the string referenced at `offset` under an explicit encoding.
    ///
    /// # Errors
    ///
    /// Same as [`string`](Self::string) and [`string_bytes`](Self::string_bytes).
    pub fn string_as(
        &self,
        offset: usize,
        encoding: StringEncoding,
    ) -> Result<StringValue<'a>, FlatError> {
        match encoding {
            StringEncoding::Text => self.string(offset).map(StringValue::Text),
            StringEncoding::Raw => self.string_bytes(offset).map(StringValue::Raw),
        }
    }

    /// Read a string field, falling back to `default` when absent.
    ///
    /// # Errors
    ///
    /// Same as [`string`](Self::string).
    pub fn string_field(
        &self,
        position: usize,
        slot: u16,
        default: Option<&str>,
    ) -> Result<Option<String>, FlatError> {
        match self.field_offset(position, slot)? {
            0 => Ok(default.map(str::to_owned)),
            local => self.string(position + local).map(Some),
        }
    }

    /// Read a string field under the reader's configured
    /// [`StringEncoding`]; `None` when absent.
    ///
    /// # Errors
    ///
    /// Same as [`string_as`](Self::string_as).
    pub fn string_value_field(
        &self,
        position: usize,
        slot: u16,
    ) -> Result<Option<StringValue<'a>>, FlatError> {
        match self.field_offset(position, slot)? {
            0 => Ok(None),
            local => self
                .string_as(position + local, self.options.encoding)
                .map(Some),
        }
    }

    // ── Vectors of primitives ─────────────────────────────────────────────

    /// Copy a vector-of-scalars field into an owned `Vec`. Absent fields
    /// give an empty `Vec`.
    ///
    /// # Errors
    ///
    /// Returns [`FlatError::OutOfRange`] if the vector runs past the buffer.
    pub fn scalars_field<T: Scalar>(
        &self,
        position: usize,
        slot: u16,
    ) -> Result<Vec<T>, FlatError> {
        self.typed_array(position, slot).map(|view| view.to_vec())
    }

    /// A `[bool]` field, one byte per element.
    ///
    /// # Errors
    ///
    /// See [`scalars_field`](Self::scalars_field).
    pub fn bools_field(&self, position: usize, slot: u16) -> Result<Vec<bool>, FlatError> {
        self.scalars_field(position, slot)
    }

    /// A `[long]` field.
    ///
    /// # Errors
    ///
    /// See [`scalars_field`](Self::scalars_field).
    pub fn int64s_field(&self, position: usize, slot: u16) -> Result<Vec<i64>, FlatError> {
        self.scalars_field(position, slot)
    }

    /// A `[ulong]` field.
    ///
    /// # Errors
    ///
    /// See [`scalars_field`](Self::scalars_field).
    pub fn uint64s_field(&self, position: usize, slot: u16) -> Result<Vec<u64>, FlatError> {
        self.scalars_field(position, slot)
    }

    /// A `[string]` field. Each element is itself a reference to a string.
    ///
    /// # Errors
    ///
    /// Same as [`string`](Self::string), for any element.
    pub fn strings_field(&self, position: usize, slot: u16) -> Result<Vec<String>, FlatError> {
        let Some((start, len)) = self.field_vector(position, slot, UOFFSET_SIZE)? else {
            return Ok(Vec::new());
        };
        (0..len)
            .map(|i| self.string(start + i * UOFFSET_SIZE))
            .collect()
    }

    /// Zero-copy view over a vector-of-scalars field. Absent fields give
    /// an empty view.
    ///
    /// # Errors
    ///
    /// Returns [`FlatError::OutOfRange`] if the vector runs past the buffer.
    pub fn typed_array<T: Scalar>(
        &self,
        position: usize,
        slot: u16,
    ) -> Result<TypedArray<'a, T>, FlatError> {
        let Some((start, len)) = self.field_vector(position, slot, T::SIZE)? else {
            return Ok(TypedArray::empty());
        };
        span(self.buf, start, len * T::SIZE).map(TypedArray::new)
    }

    // ── Nested references ─────────────────────────────────────────────────

    /// Decode an inline struct field. Structs have no indirection, so
    /// `decode` receives the field's own position.
    ///
    /// # Errors
    ///
    /// Propagates vtable failures and whatever `decode` returns.
    pub fn struct_field<T, F>(
        &self,
        position: usize,
        slot: u16,
        decode: F,
    ) -> Result<Option<T>, FlatError>
    where
        F: FnOnce(&Self, usize) -> Result<T, FlatError>,
    {
        match self.field_offset(position, slot)? {
            0 => Ok(None),
            local => decode(self, position + local).map(Some),
        }
    }

    /// Decode a sub-table field. `decode` receives the referenced table's
    /// absolute position.
    ///
    /// # Errors
    ///
    /// Propagates vtable, indirection and `decode` failures.
    pub fn table<T, F>(
        &self,
        position: usize,
        slot: u16,
        decode: F,
    ) -> Result<Option<T>, FlatError>
    where
        F: FnOnce(&Self, usize) -> Result<T, FlatError>,
    {
        match self.field_offset(position, slot)? {
            0 => Ok(None),
            local => decode(self, self.indirect(position + local)?).map(Some),
        }
    }

    /// Decode a union field.
    ///
    /// The 1-byte type tag lives at `slot` and the payload reference at
    /// `slot + 2`. `decode` receives the payload position and the tag.
    /// Returns `None` when either half is absent.
    ///
    /// # Errors
    ///
    /// Propagates vtable, indirection and `decode` failures.
    pub fn union<T, F>(
        &self,
        position: usize,
        slot: u16,
        decode: F,
    ) -> Result<Option<T>, FlatError>
    where
        F: FnOnce(&Self, usize, u8) -> Result<T, FlatError>,
    {
        let tag = match self.field_offset(position, slot)? {
            0 => return Ok(None),
            local => self.uint8(position + local)?,
        };
        let Some(value_slot) = slot.checked_add(2) else {
            return Ok(None);
        };
        match self.field_offset(position, value_slot)? {
            0 => Ok(None),
            local => decode(self, self.union_payload(position + local)?, tag).map(Some),
        }
    }

    /// Decode a vector-of-tables field, one `decode` call per element.
    /// Absent fields give an empty `Vec`.
    ///
    /// # Errors
    ///
    /// Propagates vtable, indirection and `decode` failures.
    pub fn table_array<T, F>(
        &self,
        position: usize,
        slot: u16,
        mut decode: F,
    ) -> Result<Vec<T>, FlatError>
    where
        F: FnMut(&Self, usize) -> Result<T, FlatError>,
    {
        let Some((start, len)) = self.field_vector(position, slot, UOFFSET_SIZE)? else {
            return Ok(Vec::new());
        };
        let mut tables = Vec::with_capacity(len);
        for i in 0..len {
            let table = self.indirect(start + i * UOFFSET_SIZE)?;
            tables.push(decode(self, table)?);
        }
        Ok(tables)
    }

    /// Vectors of unions have no decoding strategy.
    ///
    /// # Errors
    ///
    /// Always returns [`FlatError::NotImplemented`].
    pub fn union_array<T, F>(
        &self,
        _position: usize,
        _slot: u16,
        _decode: F,
    ) -> Result<Vec<T>, FlatError>
    where
        F: FnMut(&Self, usize, u8) -> Result<T, FlatError>,
    {
        tracing::debug!(operation = "union_array", "unsupported vector decode requested");
        Err(FlatError::NotImplemented {
            operation: "union_array",
        })
    }

    /// Vectors of structs have no decoding strategy.
    ///
    /// # Errors
    ///
    /// Always returns [`FlatError::NotImplemented`].
    pub fn struct_array<T, F>(
        &self,
        _position: usize,
        _slot: u16,
        _size: usize,
        _decode: F,
    ) -> Result<Vec<T>, FlatError>
    where
        F: FnMut(&Self, usize) -> Result<T, FlatError>,
    {
        tracing::debug!(operation = "struct_array", "unsupported vector decode requested");
        Err(FlatError::NotImplemented {
            operation: "struct_array",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A single-table buffer assembled by hand.
    ///
    /// ```text
    ///  0  root offset = 20
    ///  4  "TEST"
    ///  8  vtable: len=10, table_len=12, slots [4, 0, 8]
    /// 18  padding
    /// 20  table: soffset=12
    /// 24    slot 4: u32 0xFFFF_FFFE
    /// 28    slot 8: string ref -> 32
    /// 32  string: len=5 "hello\0" + padding
    /// ```
    fn fixture() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&20i32.to_le_bytes());
        buf.extend_from_slice(b"TEST");
        for v in [10u16, 12, 4, 0, 8] {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf.extend_from_slice(&[0, 0]);
        buf.extend_from_slice(&12i32.to_le_bytes());
        buf.extend_from_slice(&0xFFFF_FFFEu32.to_le_bytes());
        buf.extend_from_slice(&4i32.to_le_bytes());
        buf.extend_from_slice(&5u32.to_le_bytes());
        buf.extend_from_slice(b"hello\0\0\0");
        buf
    }

    const TABLE: usize = 20;

    #[test]
    fn root_and_identifier() {
        let buf = fixture();
        let reader = Reader::new(&buf);
        assert_eq!(reader.root().unwrap(), TABLE);
        assert!(reader.identifier("TEST").unwrap());
        assert!(!reader.identifier("TFL3").unwrap());
        assert!(matches!(
            reader.identifier("TES"),
            Err(FlatError::InvalidIdentifierLength { len: 3 })
        ));
    }

    #[test]
    fn uint32_field_keeps_high_bit() {
        let buf = fixture();
        let reader = Reader::new(&buf);
        assert_eq!(reader.uint32_field(TABLE, 4, 7).unwrap(), 0xFFFF_FFFE);
        assert_eq!(reader.int32_field(TABLE, 4, 7).unwrap(), -2);
    }

    #[test]
    fn absent_and_out_of_vtable_fields_use_default() {
        let buf = fixture();
        let reader = Reader::new(&buf);
        assert_eq!(reader.uint32_field(TABLE, 6, 7).unwrap(), 7);
        assert_eq!(reader.float64_field(TABLE, 10, 0.25).unwrap(), 0.25);
        assert!(reader.bool_field(TABLE, 40, true).unwrap());
        assert_eq!(reader.field_offset(TABLE, 10).unwrap(), 0);
    }

    #[test]
    fn string_field_and_raw_bytes() {
        let buf = fixture();
        let reader = Reader::new(&buf);
        assert_eq!(
            reader.string_field(TABLE, 8, None).unwrap().as_deref(),
            Some("hello")
        );
        assert_eq!(reader.string_bytes(28).unwrap(), b"hello");
        assert_eq!(
            reader.string_as(28, StringEncoding::Raw).unwrap(),
            StringValue::Raw(b"hello")
        );
        assert_eq!(
            reader.string_field(TABLE, 6, Some("none")).unwrap().as_deref(),
            Some("none")
        );
        assert_eq!(reader.string_field(TABLE, 6, None).unwrap(), None);
    }

    #[test]
    fn raw_encoding_from_options() {
        let buf = fixture();
        let options = ReaderOptions {
            encoding: StringEncoding::Raw,
            ..ReaderOptions::default()
        };
        let reader = Reader::with_options(&buf, options);
        assert_eq!(
            reader.string_value_field(TABLE, 8).unwrap(),
            Some(StringValue::Raw(b"hello"))
        );
        assert_eq!(reader.string_value_field(TABLE, 6).unwrap(), None);
    }

    #[test]
    fn absent_vectors_are_empty() {
        let buf = fixture();
        let reader = Reader::new(&buf);
        assert!(reader.strings_field(TABLE, 6).unwrap().is_empty());
        assert!(reader.uint64s_field(TABLE, 6).unwrap().is_empty());
        assert!(reader.typed_array::<f32>(TABLE, 6).unwrap().is_empty());
        let tables = reader.table_array(TABLE, 6, |_, p| Ok(p)).unwrap();
        assert!(tables.is_empty());
    }

    #[test]
    fn absent_nested_references_are_none() {
        let buf = fixture();
        let reader = Reader::new(&buf);
        assert_eq!(reader.table(TABLE, 6, |_, p| Ok(p)).unwrap(), None);
        assert_eq!(reader.struct_field(TABLE, 6, |_, p| Ok(p)).unwrap(), None);
        // Tag slot 6 is absent.
        assert_eq!(reader.union(TABLE, 6, |_, p, t| Ok((p, t))).unwrap(), None);
    }

    #[test]
    fn struct_field_gets_inline_position() {
        let buf = fixture();
        let reader = Reader::new(&buf);
        let value = reader
            .struct_field(TABLE, 4, |r, p| r.uint16(p))
            .unwrap();
        assert_eq!(value, Some(0xFFFE));
    }

    #[test]
    fn union_and_struct_arrays_are_not_implemented() {
        let buf = fixture();
        let reader = Reader::new(&buf);
        let unions = reader.union_array(TABLE, 4, |_, p, _| Ok(p));
        assert_eq!(
            unions,
            Err(FlatError::NotImplemented {
                operation: "union_array"
            })
        );
        let structs = reader.struct_array(TABLE, 4, 8, |_, p| Ok(p));
        assert_eq!(
            structs,
            Err(FlatError::NotImplemented {
                operation: "struct_array"
            })
        );
    }

    #[test]
    fn truncated_string_is_out_of_range() {
        let buf = fixture();
        let reader = Reader::new(&buf[..34]);
        let result = reader.string(28);
        assert!(matches!(result, Err(FlatError::OutOfRange { .. })));
    }

    #[test]
    fn strict_utf8_rejects_bad_bytes() {
        let mut buf = fixture();
        buf[37] = 0x80; // stray continuation byte in place of 'e'
        let reader = Reader::new(&buf);
        assert_eq!(reader.string(28).unwrap(), "h\u{80}llo");

        let strict = Reader::with_options(
            &buf,
            ReaderOptions {
                utf8: Utf8Mode::Strict,
                ..ReaderOptions::default()
            },
        );
        assert_eq!(
            strict.string(28),
            Err(FlatError::InvalidUtf8 { offset: 37 })
        );
    }

    #[test]
    fn size_prefixed_buffer() {
        let inner = fixture();
        let mut buf = Vec::new();
        buf.extend_from_slice(&u32::try_from(inner.len()).unwrap().to_le_bytes());
        buf.extend_from_slice(&inner);

        let reader = Reader::size_prefixed(&buf).unwrap();
        assert_eq!(reader.buffer().len(), inner.len());
        assert!(reader.identifier("TEST").unwrap());
        assert_eq!(
            reader.string_field(reader.root().unwrap(), 8, None).unwrap().as_deref(),
            Some("hello")
        );

        buf[0..4].copy_from_slice(&1000u32.to_le_bytes());
        assert!(matches!(
            Reader::size_prefixed(&buf),
            Err(FlatError::OutOfRange { .. })
        ));
    }

    #[test]
    fn nested_buffer_position() {
        let mut buf = vec![0xEE; 8];
        buf.extend_from_slice(&fixture());
        let reader = Reader::at(&buf, 8);
        assert_eq!(reader.root().unwrap(), TABLE + 8);
        assert!(reader.identifier("TEST").unwrap());
        assert_eq!(reader.uint32_field(TABLE + 8, 4, 0).unwrap(), 0xFFFF_FFFE);
    }

    #[test]
    fn reader_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Reader<'static>>();
    }
}
