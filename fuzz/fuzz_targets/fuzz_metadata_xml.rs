#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(xml) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(tree) = remind::tree::parse_xml(xml) {
        // Both XML vendors reduce arbitrary trees without panicking
        let _ = remind::formats::czi::extract_from_tree(&tree, None);
        for image in remind::formats::lif::find_images(&tree) {
            let _ = remind::formats::lif::extract_image(&tree, &image, None);
        }
    }
});
