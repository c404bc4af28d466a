#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Decoding may fail, but must never panic or recurse without bound
    if let Ok(tree) = remind::formats::nd2::clx::decode(data) {
        // Run the reduction over whatever tree came out
        let _ = remind::formats::nd2::extract_from_tree(&tree, None);
    }
});
