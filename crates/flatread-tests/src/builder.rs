//! Hand assembly of test buffers.
//!
//! This is not an encoder. It lays out exactly what the tests ask for,
//! front to back, so a test can describe a buffer field by field and then
//! point the reader at it. Children are written before their parents and
//! parents refer back to them with negative relative offsets, which the
//! reader resolves like any other signed offset. The root offset at byte 0
//! is patched in by [`Builder::finish`].
//!
//! ```text
//!   0  root offset (patched)      ← points forward at the root table
//!   4  identifier (optional)
//!   …  strings, vectors, child tables
//!   …  vtable │ root table        ← fields point back at their children
//! ```

use flatread_wire::vtable::VTABLE_HEADER_SIZE;

/// One field of a table under construction.
#[derive(Clone, Debug, PartialEq)]
pub enum Field {
    /// Inline bytes: a scalar or a struct, already little-endian.
    Inline(Vec<u8>),
    /// A reference to something written earlier, by absolute position.
    Ref(usize),
}

impl Field {
    pub fn bool(v: bool) -> Self {
        Self::Inline(vec![u8::from(v)])
    }

    pub fn i8(v: i8) -> Self {
        Self::Inline(v.to_le_bytes().to_vec())
    }

    pub fn u8(v: u8) -> Self {
        Self::Inline(vec![v])
    }

    pub fn i16(v: i16) -> Self {
        Self::Inline(v.to_le_bytes().to_vec())
    }

    pub fn u16(v: u16) -> Self {
        Self::Inline(v.to_le_bytes().to_vec())
    }

    pub fn i32(v: i32) -> Self {
        Self::Inline(v.to_le_bytes().to_vec())
    }

    pub fn u32(v: u32) -> Self {
        Self::Inline(v.to_le_bytes().to_vec())
    }

    pub fn i64(v: i64) -> Self {
        Self::Inline(v.to_le_bytes().to_vec())
    }

    pub fn u64(v: u64) -> Self {
        Self::Inline(v.to_le_bytes().to_vec())
    }

    pub fn f32(v: f32) -> Self {
        Self::Inline(v.to_le_bytes().to_vec())
    }

    pub fn f64(v: f64) -> Self {
        Self::Inline(v.to_le_bytes().to_vec())
    }

    fn size(&self) -> usize {
        match self {
            Self::Inline(bytes) => bytes.len(),
            Self::Ref(_) => 4,
        }
    }

    fn alignment(&self) -> usize {
        match self.size() {
            0 | 1 => 1,
            2 => 2,
            n if n % 8 == 0 => 8,
            _ => 4,
        }
    }
}

/// Where each field landed inside a table.
struct Layout {
    /// `(slot, local_offset)` per field, in input order.
    locals: Vec<(u16, usize)>,
    table_len: usize,
    vtable_len: usize,
}

fn layout(fields: &[(u16, Field)]) -> Layout {
    let mut local: usize = 4; // after the soffset
    let mut locals = Vec::with_capacity(fields.len());
    for (slot, field) in fields {
        local = local.next_multiple_of(field.alignment());
        locals.push((*slot, local));
        local += field.size();
    }
    let vtable_len = fields
        .iter()
        .map(|(slot, _)| usize::from(*slot) + 2)
        .max()
        .unwrap_or(usize::from(VTABLE_HEADER_SIZE));
    Layout {
        locals,
        table_len: local.next_multiple_of(4),
        vtable_len,
    }
}

fn to_i32(value: i64) -> i32 {
    i32::try_from(value).expect("fixture offsets fit in i32")
}

fn to_u16(value: usize) -> u16 {
    u16::try_from(value).expect("fixture vtable entries fit in u16")
}

/// Front-to-back assembler for test buffers.
#[derive(Clone, Debug)]
pub struct Builder {
    buf: Vec<u8>,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    /// Start a buffer with a placeholder root offset.
    pub fn new() -> Self {
        Self { buf: vec![0; 4] }
    }

    /// Start a buffer whose root offset is followed by a file identifier.
    pub fn with_identifier(ident: &[u8; 4]) -> Self {
        let mut builder = Self::new();
        builder.buf.extend_from_slice(ident);
        builder
    }

    /// Current write position.
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    fn pad_to(&mut self, alignment: usize) {
        let target = self.buf.len().next_multiple_of(alignment);
        self.buf.resize(target, 0);
    }

    /// Pad so that the data after a 4-byte length prefix is aligned to
    /// `alignment`.
    fn pad_for_vector(&mut self, alignment: usize) {
        let alignment = alignment.max(4);
        while (self.buf.len() + 4) % alignment != 0 {
            self.buf.push(0);
        }
    }

    fn push_ref(&mut self, target: usize) {
        let at = self.buf.len();
        let delta = to_i32(target as i64 - at as i64);
        self.buf.extend_from_slice(&delta.to_le_bytes());
    }

    fn push_len(&mut self, len: usize) {
        let len = u32::try_from(len).expect("fixture vectors fit in u32");
        self.buf.extend_from_slice(&len.to_le_bytes());
    }

    /// Write a NUL-terminated string; returns the position of its length
    /// prefix, which is what references point at.
    pub fn string(&mut self, text: &str) -> usize {
        self.raw_string(text.as_bytes())
    }

    /// Like [`string`](Self::string) but with arbitrary, possibly invalid,
    /// UTF-8 bytes.
    pub fn raw_string(&mut self, bytes: &[u8]) -> usize {
        self.pad_to(4);
        let position = self.position();
        self.push_len(bytes.len());
        self.buf.extend_from_slice(bytes);
        self.buf.push(0);
        position
    }

    /// Write a vector of `count` fixed-size elements given as raw
    /// little-endian bytes.
    pub fn vector(&mut self, element_size: usize, elements: &[u8]) -> usize {
        assert_eq!(elements.len() % element_size, 0, "partial element");
        self.pad_for_vector(element_size);
        let position = self.position();
        self.push_len(elements.len() / element_size);
        self.buf.extend_from_slice(elements);
        position
    }

    pub fn bools(&mut self, values: &[bool]) -> usize {
        let bytes: Vec<u8> = values.iter().map(|v| u8::from(*v)).collect();
        self.vector(1, &bytes)
    }

    pub fn u8s(&mut self, values: &[u8]) -> usize {
        self.vector(1, values)
    }

    pub fn i32s(&mut self, values: &[i32]) -> usize {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.vector(4, &bytes)
    }

    pub fn f32s(&mut self, values: &[f32]) -> usize {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.vector(4, &bytes)
    }

    pub fn i64s(&mut self, values: &[i64]) -> usize {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.vector(8, &bytes)
    }

    pub fn u64s(&mut self, values: &[u64]) -> usize {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.vector(8, &bytes)
    }

    /// Write a vector of references (tables or strings written earlier).
    pub fn refs(&mut self, targets: &[usize]) -> usize {
        self.pad_for_vector(4);
        let position = self.position();
        self.push_len(targets.len());
        for &target in targets {
            self.push_ref(target);
        }
        position
    }

    /// Write a strings vector, strings first.
    pub fn strings(&mut self, values: &[&str]) -> usize {
        let targets: Vec<usize> = values.iter().map(|s| self.string(s)).collect();
        self.refs(&targets)
    }

    /// Write a vtable followed by its table. Slots not mentioned in
    /// `fields` are absent; the vtable is only as long as the highest slot
    /// needs. Returns the table position.
    pub fn table(&mut self, fields: &[(u16, Field)]) -> usize {
        let layout = layout(fields);

        // Keep the table itself 4-aligned.
        while (self.buf.len() + layout.vtable_len) % 4 != 0 {
            self.buf.push(0);
        }
        let vtable = self.position();
        let mut slots = vec![0u16; (layout.vtable_len - 4) / 2];
        for &(slot, local) in &layout.locals {
            slots[usize::from(slot - VTABLE_HEADER_SIZE) / 2] = to_u16(local);
        }
        self.buf.extend_from_slice(&to_u16(layout.vtable_len).to_le_bytes());
        self.buf.extend_from_slice(&to_u16(layout.table_len).to_le_bytes());
        for slot in slots {
            self.buf.extend_from_slice(&slot.to_le_bytes());
        }

        self.write_table(vtable, fields, &layout)
    }

    /// Write a table that reuses the vtable of `like`, an earlier table
    /// with the same field layout.
    pub fn shared_table(&mut self, like: usize, fields: &[(u16, Field)]) -> usize {
        let soffset = i32::from_le_bytes(self.buf[like..like + 4].try_into().expect("4 bytes"));
        let vtable = (like as i64 - i64::from(soffset)) as usize;
        self.pad_to(4);
        self.write_table(vtable, fields, &layout(fields))
    }

    fn write_table(&mut self, vtable: usize, fields: &[(u16, Field)], layout: &Layout) -> usize {
        let table = self.position();
        self.buf
            .extend_from_slice(&to_i32(table as i64 - vtable as i64).to_le_bytes());
        for ((_, field), &(_, local)) in fields.iter().zip(&layout.locals) {
            self.buf.resize(table + local, 0);
            match field {
                Field::Inline(bytes) => self.buf.extend_from_slice(bytes),
                Field::Ref(target) => self.push_ref(*target),
            }
        }
        self.buf.resize(table + layout.table_len, 0);
        table
    }

    /// Patch the root offset and hand back the bytes.
    pub fn finish(mut self, root: usize) -> Vec<u8> {
        let delta = to_i32(root as i64);
        self.buf[0..4].copy_from_slice(&delta.to_le_bytes());
        self.buf
    }

    /// [`finish`](Self::finish), then prepend a `u32` size prefix.
    pub fn finish_size_prefixed(self, root: usize) -> Vec<u8> {
        let body = self.finish(root);
        let mut buf = u32::try_from(body.len())
            .expect("fixture fits in u32")
            .to_le_bytes()
            .to_vec();
        buf.extend_from_slice(&body);
        buf
    }
}
