#![no_main]

use flatread_wire::VTable;
use libfuzzer_sys::fuzz_target;

// Fuzz target: VTable::for_table at every position of arbitrary bytes.
//
// Catches bugs in:
// - Negative and overflowing soffsets
// - Slots past the declared vtable length
// - Vtables that declare more slots than the buffer holds
fuzz_target!(|data: &[u8]| {
    for position in 0..data.len().min(64) {
        let Ok(vtable) = VTable::for_table(data, position) else {
            continue;
        };
        // Every declared slot, plus two past the end that must read as absent.
        for index in 0..vtable.field_count() + 2 {
            let Ok(slot) = u16::try_from(4 + 2 * index) else {
                break;
            };
            let local = vtable.slot(slot);
            if index >= vtable.field_count() {
                assert_eq!(local, Ok(0));
            }
        }
    }
});
