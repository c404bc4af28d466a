#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    let _ = remind::formats::nd2::container::parse_chunk_map(data);

    // The whole container path, including out-of-range offsets
    if let Ok(mut container) = remind::formats::nd2::Nd2Container::new(Cursor::new(data)) {
        let names: Vec<String> = container.chunks().iter().map(|c| c.name.clone()).collect();
        for name in names {
            let _ = container.read_chunk(&name);
        }
    }
});
