#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // The decoder must be total over arbitrary bytes: decode or error,
    // never panic, never over-allocate past the buffer.
    let _ = desglose::dump::decode(data);
});
