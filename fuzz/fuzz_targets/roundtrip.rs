#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: (&str, &str)| {
    textsync::fuzz::fuzz(data.0, data.1).unwrap();
});
