#![no_main]

use arbitrary::Arbitrary;
use flatread_reader::Reader;
use libfuzzer_sys::fuzz_target;

/// Which accessor to apply at a slot.
#[derive(Arbitrary, Debug)]
enum Access {
    Scalar,
    String,
    Strings,
    Vector,
    Table,
    Tables,
    Union,
}

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    steps: Vec<(u8, Access)>,
    buf: &'a [u8],
}

// Fuzz target: walk arbitrary bytes as if they were a buffer of nested
// tables, descending through whatever references the bytes claim to hold.
//
// Catches bugs in:
// - Root, vtable and soffset resolution
// - Vector length checks before allocation
// - Union tag/payload pairing
fuzz_target!(|input: Input| {
    let reader = Reader::new(input.buf);
    let Ok(mut position) = reader.root() else {
        return;
    };
    for (slot, access) in input.steps.iter().take(16) {
        let slot = u16::from(*slot) & !1;
        let next = match access {
            Access::Scalar => reader.uint64_field(position, slot, 0).map(|_| None),
            Access::String => reader.string_field(position, slot, None).map(|_| None),
            Access::Strings => reader.strings_field(position, slot).map(|_| None),
            Access::Vector => reader.typed_array::<f64>(position, slot).map(|v| {
                let _ = v.iter().count();
                None
            }),
            Access::Table => reader.table(position, slot, |_, p| Ok(p)),
            Access::Tables => reader
                .table_array(position, slot, |_, p| Ok(p))
                .map(|tables| tables.first().copied()),
            Access::Union => reader.union(position, slot, |_, p, _| Ok(p)),
        };
        match next {
            Ok(Some(child)) => position = child,
            Ok(None) => {}
            Err(_) => return,
        }
    }
});
