use std::marker::PhantomData;

use flatread_wire::Scalar;

/// Zero-copy view over a vector of fixed-width scalars.
///
/// The view borrows the element bytes straight from the buffer; nothing is
/// decoded until an element is accessed. The bytes carry no alignment
/// guarantee, so elements are assembled with `from_le_bytes` rather than
/// reinterpreted in place.
///
/// ```text
///   buffer: ... │ len u32 │ e0 │ e1 │ e2 │ ...
///                         └──── bytes ───┘
///                            stride = T::SIZE
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TypedArray<'a, T: Scalar> {
    bytes: &'a [u8],
    _element: PhantomData<T>,
}

impl<'a, T: Scalar> TypedArray<'a, T> {
    /// Wrap a byte span whose length is a multiple of `T::SIZE`.
    ///
    /// Trailing bytes that do not form a whole element are ignored.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        let whole = bytes.len() - bytes.len() % T::SIZE;
        Self {
            bytes: &bytes[..whole],
            _element: PhantomData,
        }
    }

    /// An empty view, returned for absent fields.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(&[])
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len() / T::SIZE
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Element at `index`, or `None` past the end.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        let start = index.checked_mul(T::SIZE)?;
        let raw = self.bytes.get(start..start.checked_add(T::SIZE)?)?;
        Some(T::from_le_slice(raw))
    }

    /// Iterate the elements in order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = T> + use<'a, T> {
        self.bytes.chunks_exact(T::SIZE).map(T::from_le_slice)
    }

    /// The underlying little-endian bytes, borrowed from the buffer.
    #[must_use]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Copy the elements out into an owned vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }
}

impl<T: Scalar> Default for TypedArray<'_, T> {
    fn default() -> Self {
        Self::empty()
    }
}
