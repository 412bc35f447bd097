use crate::error::FlatError;
use crate::scalar::{read_scalar, relative};

/// Size of the fixed vtable header: `vtable_len` plus `table_len`.
pub const VTABLE_HEADER_SIZE: u16 = 4;

/// Slot offset of the field with the given zero-based schema index.
///
/// Field 0 lives at slot offset 4, field 1 at 6, and so on. Schema code
/// declares its slot constants with this so the numbers line up with the
/// vtable layout:
///
/// ```
/// use flatread_wire::vtable::slot_offset;
///
/// const VERSION: u16 = slot_offset(0);
/// const NAME: u16 = slot_offset(1);
/// assert_eq!((VERSION, NAME), (4, 6));
/// ```
#[must_use]
pub const fn slot_offset(index: u16) -> u16 {
    VTABLE_HEADER_SIZE + 2 * index
}

/// A table's field directory, read in place from the buffer.
///
/// ```text
/// vtable:  ┌────────────────┬────────────────┬──────────┬──────────┬─────┐
///          │ vtable_len u16 │ table_len u16  │ slot 4   │ slot 6   │ ... │
///          └────────────────┴────────────────┴──────────┴──────────┴─────┘
///                 ▲
///                 │  table_position - int32(table_position)
/// table:   ┌──────┴─────────┬──────────────────────────────────────────────┐
///          │ soffset i32    │ field data, at the offsets the slots give    │
///          └────────────────┴──────────────────────────────────────────────┘
/// ```
///
/// A slot holding 0 means the field is absent. Slots past `vtable_len`
/// belong to fields the writer did not know about and are also absent.
/// Structurally identical tables may share one vtable, so a `VTable` is
/// always resolved from the table in hand and never cached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VTable<'a> {
    buf: &'a [u8],
    position: usize,
    vtable_len: u16,
    table_len: u16,
}

impl<'a> VTable<'a> {
    /// Resolve the vtable of the table starting at `table_position`.
    ///
    /// # Errors
    ///
    /// - [`FlatError::OutOfRange`] if the soffset or the vtable header lies
    ///   outside the buffer.
    /// - [`FlatError::OffsetOverflow`] if the soffset points before byte 0.
    pub fn for_table(buf: &'a [u8], table_position: usize) -> Result<Self, FlatError> {
        let soffset: i32 = read_scalar(buf, table_position)?;
        // The vtable sits at p - soffset, the opposite sign of a forward reference.
        let position = relative(table_position, -i64::from(soffset))?;
        let vtable_len = read_scalar(buf, position)?;
        let table_len = read_scalar(buf, position + 2)?;
        Ok(Self {
            buf,
            position,
            vtable_len,
            table_len,
        })
    }

    /// Absolute position of the vtable itself.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Declared byte length of the vtable, header included.
    #[must_use]
    pub fn vtable_len(&self) -> u16 {
        self.vtable_len
    }

    /// Declared byte length of the table's inline data.
    #[must_use]
    pub fn table_len(&self) -> u16 {
        self.table_len
    }

    /// Number of field slots the writer declared.
    #[must_use]
    pub fn field_count(&self) -> usize {
        usize::from(self.vtable_len.saturating_sub(VTABLE_HEADER_SIZE)) / 2
    }

    /// Local offset of a field inside its table, or 0 if the field is absent.
    ///
    /// A `slot` at or past the declared `vtable_len` was written by an older
    /// schema and reads as absent without touching the buffer.
    ///
    /// # Errors
    ///
    /// Returns [`FlatError::OutOfRange`] if the vtable claims more slots than
    /// the buffer holds.
    pub fn slot(&self, slot: u16) -> Result<u16, FlatError> {
        if u32::from(slot) + 2 > u32::from(self.vtable_len) {
            return Ok(0);
        }
        read_scalar(self.buf, self.position + usize::from(slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// vtable at 0 with two slots, table at 8 whose soffset is 8.
    fn two_slot_table() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&8u16.to_le_bytes()); // vtable_len
        buf.extend_from_slice(&12u16.to_le_bytes()); // table_len
        buf.extend_from_slice(&4u16.to_le_bytes()); // slot 4 -> local 4
        buf.extend_from_slice(&0u16.to_le_bytes()); // slot 6 absent
        buf.extend_from_slice(&8i32.to_le_bytes()); // table: soffset
        buf.extend_from_slice(&42u32.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf
    }

    #[test]
    fn slot_offsets_start_after_header() {
        assert_eq!(slot_offset(0), 4);
        assert_eq!(slot_offset(1), 6);
        assert_eq!(slot_offset(10), 24);
    }

    #[test]
    fn resolves_header_fields() {
        let buf = two_slot_table();
        let vtable = VTable::for_table(&buf, 8).unwrap();
        assert_eq!(vtable.position(), 0);
        assert_eq!(vtable.vtable_len(), 8);
        assert_eq!(vtable.table_len(), 12);
        assert_eq!(vtable.field_count(), 2);
    }

    #[test]
    fn present_and_absent_slots() {
        let buf = two_slot_table();
        let vtable = VTable::for_table(&buf, 8).unwrap();
        assert_eq!(vtable.slot(4).unwrap(), 4);
        assert_eq!(vtable.slot(6).unwrap(), 0);
    }

    #[test]
    fn slot_past_vtable_len_is_absent() {
        let buf = two_slot_table();
        let vtable = VTable::for_table(&buf, 8).unwrap();
        // Slot 8 would read the table's soffset bytes if the length were ignored.
        assert_eq!(vtable.slot(8).unwrap(), 0);
        assert_eq!(vtable.slot(200).unwrap(), 0);
    }

    #[test]
    fn vtable_len_larger_than_buffer_is_out_of_range() {
        let mut buf = two_slot_table();
        buf[0..2].copy_from_slice(&0x4000u16.to_le_bytes());
        let vtable = VTable::for_table(&buf, 8).unwrap();
        assert!(matches!(
            vtable.slot(0x3000),
            Err(FlatError::OutOfRange { .. })
        ));
    }

    #[test]
    fn soffset_before_buffer_start() {
        let mut buf = two_slot_table();
        buf[8..12].copy_from_slice(&64i32.to_le_bytes());
        assert!(matches!(
            VTable::for_table(&buf, 8),
            Err(FlatError::OffsetOverflow { .. })
        ));
    }

    #[test]
    fn table_position_past_end() {
        let buf = two_slot_table();
        assert!(matches!(
            VTable::for_table(&buf, buf.len()),
            Err(FlatError::OutOfRange { .. })
        ));
    }
}
