#![no_main]

use desglose::filter::FilterSpec;
use desglose::predicate::FramePredicate;
use desglose::sort::SortSpec;
use desglose::transform::TraceTransform;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Every operator-facing spec parser should reject bad input with an
    // error rather than panicking
    if let Ok(input) = std::str::from_utf8(data) {
        let _ = FilterSpec::parse("size", input);
        let _ = FilterSpec::parse("allocatedClass", input);
        let _ = FramePredicate::parse(input);
        let _ = TraceTransform::parse(input);
        let _ = SortSpec::parse_list(input);
    }
});
