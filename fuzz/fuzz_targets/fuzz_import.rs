#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;
use threemf_import::{ErrorCategory, ImportConfig, MemoryScene, import_from_reader};

fuzz_target!(|data: &[u8]| {
    // Full pipeline: ZIP -> XML -> materials -> translation -> scene
    let mut scene = MemoryScene::new();
    let result = import_from_reader(Cursor::new(data), &mut scene, &ImportConfig::default());

    // Read and geometry failures happen before the first scene write
    if let Err(e) = result
        && e.category() != ErrorCategory::Scene
    {
        assert!(scene.is_empty());
    }
});
