#![no_main]

use libfuzzer_sys::fuzz_target;
use protofuzz_generator::generators::generate_field_mask;
use protofuzz_generator::validate::check_field_mask;
use protofuzz_generator::{ByteSource, Limits};

fuzz_target!(|data: &[u8]| {
    let mut source = ByteSource::new(data, Limits::default());
    // Long runs of zero bytes can use up the retry bound; that is an error,
    // not a bad path.
    if let Ok(mask) = generate_field_mask(&mut source, 64) {
        assert!(check_field_mask(&mask).is_ok(), "bad mask {:?}", mask.paths);
    }
});
